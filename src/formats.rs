//! Tree output formats and the tdoc round-trip reader

pub mod json;
pub mod tdoc;
pub mod xml;
