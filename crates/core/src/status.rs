//! Gemini status classification.
//!
//! Classification is total over `i32`: every value in 10-69 belongs to
//! exactly one category and every other value belongs to none.

use serde::{Deserialize, Serialize};

/// Semantic category of a two-digit Gemini status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCategory {
    Input,
    Success,
    Redirect,
    TemporaryFailure,
    PermanentFailure,
    CertificateRequired,
}

impl StatusCategory {
    /// Classify a status code, `None` outside 10-69.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            10..=19 => Some(Self::Input),
            20..=29 => Some(Self::Success),
            30..=39 => Some(Self::Redirect),
            40..=49 => Some(Self::TemporaryFailure),
            50..=59 => Some(Self::PermanentFailure),
            60..=69 => Some(Self::CertificateRequired),
            _ => None,
        }
    }
}

pub fn is_input(code: i32) -> bool {
    StatusCategory::from_code(code) == Some(StatusCategory::Input)
}

/// Status 11: the prompt must be masked while typing.
pub fn is_sensitive_input(code: i32) -> bool {
    code == 11
}

pub fn is_success(code: i32) -> bool {
    StatusCategory::from_code(code) == Some(StatusCategory::Success)
}

pub fn is_redirect(code: i32) -> bool {
    StatusCategory::from_code(code) == Some(StatusCategory::Redirect)
}

pub fn is_permanent_redirect(code: i32) -> bool {
    code == 31
}

pub fn is_temporary_failure(code: i32) -> bool {
    StatusCategory::from_code(code) == Some(StatusCategory::TemporaryFailure)
}

pub fn is_permanent_failure(code: i32) -> bool {
    StatusCategory::from_code(code) == Some(StatusCategory::PermanentFailure)
}

pub fn is_certificate_required(code: i32) -> bool {
    StatusCategory::from_code(code) == Some(StatusCategory::CertificateRequired)
}

/// Human-readable message for a status code.
pub fn status_message(code: i32) -> String {
    let msg = match code {
        10 => "Input required",
        11 => "Sensitive input required",
        20 => "Success",
        30 => "Temporary redirect",
        31 => "Permanent redirect",
        40 => "Temporary failure",
        41 => "Server unavailable",
        42 => "CGI error",
        43 => "Proxy error",
        44 => "Slow down (rate limited)",
        50 => "Permanent failure",
        51 => "Not found",
        52 => "Gone",
        53 => "Proxy request refused",
        59 => "Bad request",
        60 => "Client certificate required",
        61 => "Certificate not authorized",
        62 => "Certificate not valid",
        _ => return format!("Unknown status: {code}"),
    };
    msg.to_string()
}
