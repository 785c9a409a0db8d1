// Core modules implementing tag parsing, field access, and the decode engine.
pub mod decode;
pub mod error;
pub mod field;
pub mod params;
pub mod tag;
