//! Purpose: Generate `qtag::Record` implementations from `#[qt(...)]` field attributes.
//! Exports: `#[derive(Record)]`.
//! Role: Compile-time replacement for runtime field reflection; emits a static descriptor table.
//! Invariants: Descriptor order equals field declaration order.
//! Invariants: Tag strings are passed through verbatim; parsing happens at decode time.
//! Invariants: Fields without a `qt` attribute are listed with no tag and never handed out.
//! Invariants: Fields whose tag contains a `-` segment are listed but never handed out.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Expr, ExprLit, Fields, Lit, LitStr, Meta, parse_macro_input};

/// Derives `qtag::Record` for a struct with named fields.
///
/// Each field may carry one tag, written either as `#[qt("limit,default=10")]`
/// or `#[qt = "limit,default=10"]`. Tagged fields must implement
/// `qtag::QueryField`. Untagged fields and fields tagged with a `-` segment
/// are left alone and may have any type.
///
/// ```ignore
/// #[derive(Default, qtag::Record)]
/// struct Paging {
///     #[qt("limit,default=50")]
///     limit: i64,
///     #[qt("page")]
///     page: i32,
///     #[qt("-")]
///     internal: String,
///     cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Record, attributes(qt))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

struct TaggedField<'a> {
    field: &'a syn::Field,
    tag: Option<LitStr>,
}

impl TaggedField<'_> {
    fn is_decodable(&self) -> bool {
        self.tag
            .as_ref()
            .is_some_and(|tag| !is_ignore_tag(&tag.value()))
    }
}

// `-` is sticky at decode time, so the field can never be written.
fn is_ignore_tag(tag: &str) -> bool {
    tag.split(',').any(|segment| segment == "-")
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "`Record` can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "`Record` can only be derived for structs",
            ));
        }
    };

    let tagged = fields
        .iter()
        .map(|field| {
            Ok(TaggedField {
                field,
                tag: field_tag(field)?,
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let descriptors = tagged.iter().map(|entry| {
        let name = entry
            .field
            .ident
            .as_ref()
            .map(|ident| ident.unraw().to_string())
            .unwrap_or_default();
        match &entry.tag {
            Some(tag) => quote! {
                ::qtag::FieldDescriptor::new(#name, ::core::option::Option::Some(#tag))
            },
            None => quote! {
                ::qtag::FieldDescriptor::new(#name, ::core::option::Option::None)
            },
        }
    });

    let arms = tagged.iter().enumerate().filter_map(|(index, entry)| {
        if !entry.is_decodable() {
            return None;
        }
        let ident = entry.field.ident.as_ref()?;
        Some(quote! {
            #index => ::core::option::Option::Some(::qtag::QueryField::slot(&mut self.#ident)),
        })
    });

    let ident = &input.ident;
    let mut generics = input.generics.clone();
    {
        let where_clause = generics.make_where_clause();
        for entry in tagged.iter().filter(|entry| entry.is_decodable()) {
            let ty = &entry.field.ty;
            where_clause
                .predicates
                .push(syn::parse_quote!(#ty: ::qtag::QueryField));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::qtag::Record for #ident #ty_generics #where_clause {
            const FIELDS: &'static [::qtag::FieldDescriptor] = &[#(#descriptors),*];

            fn slot(&mut self, index: usize) -> ::core::option::Option<::qtag::Slot<'_>> {
                match index {
                    #(#arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

fn field_tag(field: &syn::Field) -> syn::Result<Option<LitStr>> {
    let mut tag = None;
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("qt")) {
        if tag.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate `qt` attribute"));
        }
        let lit = match &attr.meta {
            Meta::List(list) => list.parse_args::<LitStr>()?,
            Meta::NameValue(pair) => match &pair.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(lit), ..
                }) => lit.clone(),
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "expected a string literal, e.g. #[qt = \"limit\"]",
                    ));
                }
            },
            Meta::Path(path) => {
                return Err(syn::Error::new_spanned(
                    path,
                    "expected #[qt(\"...\")] or #[qt = \"...\"]",
                ));
            }
        };
        tag = Some(lit);
    }
    Ok(tag)
}
