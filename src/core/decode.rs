//! Purpose: Populate a `Record` from a parameter map using per-field `qt` directives.
//! Exports: `decode`, `decode_opt`, `decode_query`, `decode_url`.
//! Role: The decode engine; walks fields in declaration order, resolves, hooks, coerces.
//! Invariants: Ignored or keyless fields are never looked up or written.
//! Invariants: The first failure aborts the call; fields assigned before it stay assigned.
//! Invariants: No state is kept between calls; directives are rebuilt for every field.

use tracing::{debug, trace};
use url::Url;

use crate::core::error::{Error, ErrorKind};
use crate::core::field::{Record, Slot, ValueKind};
use crate::core::params::{ParamMap, Params};
use crate::core::tag::{TagDirective, parse_optional_tag};

pub fn decode<P, T>(params: &P, target: &mut T) -> Result<(), Error>
where
    P: Params + ?Sized,
    T: Record,
{
    for (index, field) in T::FIELDS.iter().enumerate() {
        let Some(slot) = target.slot(index) else {
            trace!(field = field.name, "field not writable; skipped");
            continue;
        };

        let directive = parse_optional_tag(field.tag);
        if directive.ignore {
            trace!(field = field.name, "field ignored by tag");
            continue;
        }

        let Some(value) = resolve_value(params, &directive) else {
            trace!(field = field.name, key = %directive.key, "no value or default; skipped");
            continue;
        };

        let site = Site {
            field: field.name,
            key: &directive.key,
            value,
        };
        if let Err(err) = assign(slot, &site) {
            debug!(field = field.name, key = %directive.key, error = %err, "decode failed");
            return Err(err);
        }
    }
    Ok(())
}

/// Like [`decode`], but a missing target is reported as `InvalidTarget`.
pub fn decode_opt<P, T>(params: &P, target: Option<&mut T>) -> Result<(), Error>
where
    P: Params + ?Sized,
    T: Record,
{
    let target = target.ok_or_else(|| {
        Error::new(ErrorKind::InvalidTarget).with_message("cannot decode into a missing target")
    })?;
    decode(params, target)
}

pub fn decode_query<T>(query: &str, target: &mut T) -> Result<(), Error>
where
    T: Record,
{
    decode(&ParamMap::parse(query), target)
}

pub fn decode_url<T>(url: &Url, target: &mut T) -> Result<(), Error>
where
    T: Record,
{
    decode(&ParamMap::from_url(url), target)
}

// Explicit non-empty input wins, then the tag default.
fn resolve_value<'a, P>(params: &'a P, directive: &'a TagDirective) -> Option<&'a str>
where
    P: Params + ?Sized,
{
    params
        .first(&directive.key)
        .filter(|value| !value.is_empty())
        .or(directive.default_value.as_deref())
}

struct Site<'a> {
    field: &'static str,
    key: &'a str,
    value: &'a str,
}

impl Site<'_> {
    fn error(&self, kind: ErrorKind) -> Error {
        Error::new(kind)
            .with_field(self.field)
            .with_key(self.key)
            .with_value(self.value)
    }

    fn coercion(&self, expected: ValueKind) -> Error {
        self.error(ErrorKind::Coercion)
            .with_message(format!("cannot parse value into {}", article(expected)))
            .with_expected(expected)
    }

    fn unsupported(&self) -> Error {
        self.error(ErrorKind::UnsupportedType)
            .with_message("field type has no decoding rule")
            .with_expected(ValueKind::Custom)
    }
}

fn assign(slot: Slot<'_>, site: &Site<'_>) -> Result<(), Error> {
    let hook = match slot {
        Slot::Text(hook) => hook,
        builtin => return coerce(builtin, site),
    };
    let hook_err = match hook.unmarshal_text(site.value.as_bytes()) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };
    trace!(field = site.field, error = %hook_err, "text hook rejected value; trying fallback");
    match hook.fallback() {
        Some(Slot::Text(_) | Slot::Opaque) | None => {
            Err(site.unsupported().with_boxed_source(hook_err))
        }
        Some(builtin) => coerce(builtin, site),
    }
}

fn coerce(slot: Slot<'_>, site: &Site<'_>) -> Result<(), Error> {
    let value = site.value;
    match slot {
        Slot::Str(target) => {
            target.clear();
            target.push_str(value);
        }
        Slot::Bool(target) => {
            *target = parse_bool(value).ok_or_else(|| site.coercion(ValueKind::Boolean))?;
        }
        Slot::Int(target) => {
            let parsed = value
                .parse::<i64>()
                .map_err(|err| site.coercion(ValueKind::Integer).with_source(err))?;
            target
                .assign(parsed)
                .map_err(|err| site.coercion(ValueKind::Integer).with_source(err))?;
        }
        Slot::F64(target) => {
            *target = parse_f64(value).ok_or_else(|| site.coercion(ValueKind::Float64))?;
        }
        Slot::F32(target) => {
            *target = parse_f32(value).ok_or_else(|| site.coercion(ValueKind::Float32))?;
        }
        Slot::Text(_) | Slot::Opaque => return Err(site.unsupported()),
    }
    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

// Overflow to infinity is a range error unless the input spelled out infinity.
fn parse_f64(value: &str) -> Option<f64> {
    let parsed = value.parse::<f64>().ok()?;
    if parsed.is_infinite() && !is_infinity_literal(value) {
        return None;
    }
    Some(parsed)
}

fn parse_f32(value: &str) -> Option<f32> {
    let parsed = value.parse::<f32>().ok()?;
    if parsed.is_infinite() && !is_infinity_literal(value) {
        return None;
    }
    Some(parsed)
}

fn is_infinity_literal(value: &str) -> bool {
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

fn article(kind: ValueKind) -> String {
    match kind {
        ValueKind::Integer => format!("an {kind}"),
        _ => format!("a {kind}"),
    }
}
