// Decode error model: one error type, a closed kind set, and builder-style context.
use std::error::Error as StdError;
use std::fmt;

use crate::core::field::ValueKind;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    InvalidTarget,
    Coercion,
    UnsupportedType,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    field: Option<&'static str>,
    key: Option<String>,
    value: Option<String>,
    expected: Option<ValueKind>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            field: None,
            key: None,
            value: None,
            expected: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Rust name of the record field that failed.
    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    /// Parameter key the failing value was looked up under.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Raw input value, or the tag default when the key was absent.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn expected(&self) -> Option<ValueKind> {
        self.expected
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_field(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_expected(mut self, expected: ValueKind) -> Self {
        self.expected = Some(expected);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub(crate) fn with_boxed_source(mut self, source: Box<dyn StdError + Send + Sync>) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(field) = self.field {
            write!(f, " (field: {field})")?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {key})")?;
        }
        if let Some(value) = &self.value {
            write!(f, " (value: {value:?})")?;
        }
        if let Some(expected) = self.expected {
            write!(f, " (expected: {expected})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

/// HTTP status used by the request glue when a decode fails.
pub fn to_status_code(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::Coercion | ErrorKind::UnsupportedType => 400,
        ErrorKind::InvalidTarget => 500,
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::InvalidTarget => 1,
        ErrorKind::Coercion => 2,
        ErrorKind::UnsupportedType => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code, to_status_code};
    use crate::core::field::ValueKind;
    use std::error::Error as _;

    #[test]
    fn status_mapping_is_stable() {
        let cases = [
            (ErrorKind::InvalidTarget, 500),
            (ErrorKind::Coercion, 400),
            (ErrorKind::UnsupportedType, 400),
        ];

        for (kind, code) in cases {
            assert_eq!(to_status_code(kind), code);
        }
    }

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::InvalidTarget, 1),
            (ErrorKind::Coercion, 2),
            (ErrorKind::UnsupportedType, 3),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_context() {
        let parse_err = "x".parse::<i64>().expect_err("not a number");
        let err = Error::new(ErrorKind::Coercion)
            .with_message("cannot parse value")
            .with_field("limit")
            .with_key("limit")
            .with_value("hello")
            .with_expected(ValueKind::Integer)
            .with_source(parse_err);

        let text = err.to_string();
        assert_eq!(
            text,
            "Coercion: cannot parse value (field: limit) (key: limit) (value: \"hello\") (expected: integer)"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn bare_kind_displays_without_context() {
        let err = Error::new(ErrorKind::InvalidTarget);
        assert_eq!(err.to_string(), "InvalidTarget");
        assert!(err.source().is_none());
        assert_eq!(err.field(), None);
    }
}
