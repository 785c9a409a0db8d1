//! Purpose: Parse the `qt` tag mini-language into a per-field decode directive.
//! Exports: `TagDirective`, `parse_tag`.
//! Role: Leaf parser consulted by the decode engine once per field per call.
//! Invariants: Parsing never fails; malformed or keyless tags degrade to `ignore`.
//! Invariants: An empty `key` always implies `ignore == true`.
//! Notes: Grammar is a comma-separated list of `-`, `default=<value>`, or a key.

use serde::Serialize;

const IGNORE_MARKER: &str = "-";
const DEFAULT_PREFIX: &str = "default";

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct TagDirective {
    pub key: String,
    #[serde(rename = "default")]
    pub default_value: Option<String>,
    pub ignore: bool,
}

impl TagDirective {
    pub fn ignored() -> Self {
        Self {
            key: String::new(),
            default_value: None,
            ignore: true,
        }
    }
}

pub fn parse_tag(raw: &str) -> TagDirective {
    if raw.is_empty() {
        return TagDirective::ignored();
    }

    let mut directive = TagDirective::default();
    for segment in raw.split(',') {
        if let Some(value) = default_segment(segment) {
            if directive.default_value.is_none() {
                directive.default_value = Some(value.to_string());
            }
        } else if segment == IGNORE_MARKER {
            directive.ignore = true;
        } else if directive.key.is_empty() && !segment.is_empty() {
            directive.key = segment.to_string();
        }
    }

    if directive.key.is_empty() {
        directive.ignore = true;
    }
    directive
}

/// Absent tags (no `qt` attribute at all) parse like an empty tag.
pub fn parse_optional_tag(raw: Option<&str>) -> TagDirective {
    raw.map(parse_tag).unwrap_or_else(TagDirective::ignored)
}

// Exactly one `=` with `default` on the left; anything else is a key candidate.
fn default_segment(segment: &str) -> Option<&str> {
    let (name, value) = segment.split_once('=')?;
    if name != DEFAULT_PREFIX || value.contains('=') {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::{TagDirective, parse_optional_tag, parse_tag};

    #[test]
    fn bare_key() {
        let out = parse_tag("limit");
        assert_eq!(out.key, "limit");
        assert_eq!(out.default_value, None);
        assert!(!out.ignore);
    }

    #[test]
    fn key_with_default() {
        let out = parse_tag("limit,default=10");
        assert_eq!(out.key, "limit");
        assert_eq!(out.default_value.as_deref(), Some("10"));
        assert!(!out.ignore);
    }

    #[test]
    fn default_may_precede_key() {
        let out = parse_tag("default=10,limit");
        assert_eq!(out.key, "limit");
        assert_eq!(out.default_value.as_deref(), Some("10"));
    }

    #[test]
    fn empty_and_dash_are_ignored() {
        assert!(parse_tag("").ignore);
        assert!(parse_tag("-").ignore);
        assert!(parse_optional_tag(None).ignore);
        assert_eq!(parse_tag(""), TagDirective::ignored());
    }

    #[test]
    fn default_without_key_is_ignored() {
        let out = parse_tag("default=10");
        assert!(out.ignore);
        assert!(out.key.is_empty());
        assert_eq!(out.default_value.as_deref(), Some("10"));
    }

    #[test]
    fn dash_is_sticky() {
        let out = parse_tag("-,default=10");
        assert!(out.ignore);

        let out = parse_tag("limit,-");
        assert_eq!(out.key, "limit");
        assert!(out.ignore);
    }

    #[test]
    fn first_key_and_first_default_win() {
        let out = parse_tag("a,b,default=1,default=2");
        assert_eq!(out.key, "a");
        assert_eq!(out.default_value.as_deref(), Some("1"));
    }

    #[test]
    fn empty_segments_are_skipped() {
        let out = parse_tag(",,page");
        assert_eq!(out.key, "page");
        assert!(!out.ignore);

        assert!(parse_tag(",,,").ignore);
    }

    #[test]
    fn equals_in_other_segments_is_opaque() {
        assert_eq!(parse_tag("a=b").key, "a=b");

        let out = parse_tag("default=a=b");
        assert_eq!(out.key, "default=a=b");
        assert_eq!(out.default_value, None);
        assert!(!out.ignore);
    }

    #[test]
    fn empty_default_is_kept() {
        let out = parse_tag("name,default=");
        assert_eq!(out.default_value.as_deref(), Some(""));
    }

    #[test]
    fn plain_keys_follow_first_segment_rule() {
        let cases = ["q", "q,r", "sort_by,extra", "x y", "ünï"];
        for raw in cases {
            let out = parse_tag(raw);
            let first = raw.split(',').find(|segment| !segment.is_empty());
            assert!(!out.ignore, "{raw}");
            assert_eq!(Some(out.key.as_str()), first, "{raw}");
        }
    }

    #[test]
    fn keyless_always_ignored() {
        let cases = ["", "-", ",", "default=1", "-,-", "default=1,-", ",default=x,"];
        for raw in cases {
            let out = parse_tag(raw);
            assert!(out.key.is_empty(), "{raw}");
            assert!(out.ignore, "{raw}");
        }
    }
}
