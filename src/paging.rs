//! Purpose: Demo record decoded by the `qtag decode` command and the `/v0/echo` route.
//! Exports: `Paging`.
//! Role: Binary-only example of a derived `Record` covering defaults and every builtin kind.

use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Serialize, qtag::Record)]
pub struct Paging {
    #[qt("limit,default=50")]
    pub limit: i64,
    #[qt("page,default=1")]
    pub page: i32,
    #[qt("q")]
    pub query: String,
    #[qt("desc")]
    pub descending: bool,
    #[qt("min_score")]
    pub min_score: f64,
    #[qt("-")]
    pub trace_id: String,
}
