//! Core types and shared functionality for starsearch.
//!
//! This crate provides:
//! - Response, document and line types
//! - Gemini status classification
//! - TOFU certificate store
//! - In-memory page cache
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod status;
pub mod tofu;
pub mod types;

pub use cache::PageCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use status::StatusCategory;
pub use tofu::{CertificateInfo, PeerCertificate, TofuStore, TrustDecider, TrustPolicy};
pub use types::{Document, Line, LineKind, Response};
