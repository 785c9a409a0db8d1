//! Purpose: Decode URL query parameters into typed structs driven by `qt` field tags.
//! Exports: `core` (tags, fields, params, engine, errors), `http` (axum glue), derive `Record`.
//! Role: Library crate backing the `qtag` CLI and any service that consumes query strings.
//! Invariants: Decoding is synchronous, stateless, and fails fast on the first bad field.
//! Invariants: Crate-root re-exports are the paths `#[derive(Record)]` expands to.
//!
//! ```ignore
//! use qtag::Record;
//!
//! #[derive(Debug, Default, Record)]
//! struct Paging {
//!     #[qt("limit,default=50")]
//!     limit: i64,
//!     #[qt("page")]
//!     page: i32,
//! }
//!
//! let mut paging = Paging::default();
//! qtag::decode_query("limit=200&page=3", &mut paging)?;
//! ```
pub mod core;
pub mod http;

pub use crate::core::decode::{decode, decode_opt, decode_query, decode_url};
pub use crate::core::error::{Error, ErrorKind, to_exit_code, to_status_code};
pub use crate::core::field::{
    FieldDescriptor, IntSlot, QueryField, Record, Slot, UnmarshalText, ValueKind,
};
pub use crate::core::params::{ParamMap, Params};
pub use crate::core::tag::{TagDirective, parse_tag};
pub use http::{ErrorEnvelope, Qt, QueryRejection, decode_request, decode_uri};
pub use qtag_derive::Record;
