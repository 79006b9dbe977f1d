//! Client code for starsearch.
//!
//! This crate provides the gemini:// and gopher:// fetch pipeline and the
//! document parsers shared by every front end.

pub mod fetch;
pub mod parse;

pub use fetch::{FetchClient, FetchConfig, GeminiClient, GopherClient, LoadError};
pub use parse::{ParseError, parse, title};
