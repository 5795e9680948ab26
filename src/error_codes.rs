//! Stable error codes for the CLI. A [`CodedError`] rides inside an `anyhow::Error` chain and
//! decides both the exit status and the `--json` error envelope.

use std::borrow::Cow;
use std::fmt;

use anyhow::Error;
use serde::Serialize;
use serde_json::Value;

/// `frame --progress` outside [0, 1].
pub const PROGRESS_RANGE: &str = "E_PROGRESS_RANGE";
/// `terminal --speed` outside its playback range.
pub const SPEED_RANGE: &str = "E_SPEED_RANGE";
pub const ARTICLE_NOT_FOUND: &str = "E_ARTICLE_NOT_FOUND";
/// Settings file that fails to parse or validate.
pub const CONFIG_INVALID: &str = "E_CONFIG_INVALID";
/// Reported for any error that carries no code.
pub const INTERNAL: &str = "E_INTERNAL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodedErrorKind {
    /// Bad command-line input.
    Usage,
    /// A lookup that found nothing.
    NotFound,
    Config,
}

impl CodedErrorKind {
    /// Exit status; 1 stays reserved for uncoded failures.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Usage => 2,
            Self::NotFound => 3,
            Self::Config => 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CodedError {
    pub code: &'static str,
    pub message: String,
    /// Machine-readable context, echoed verbatim in the envelope.
    pub details: Option<Value>,
    pub kind: CodedErrorKind,
}

impl CodedError {
    fn new(kind: CodedErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            kind,
        }
    }

    pub fn usage(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(CodedErrorKind::Usage, code, message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(CodedErrorKind::NotFound, code, message)
    }

    /// Always coded [`CONFIG_INVALID`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(CodedErrorKind::Config, CONFIG_INVALID, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn envelope(&self) -> ErrorEnvelope<'_> {
        ErrorEnvelope::failed(ErrorReport {
            code: self.code,
            message: Cow::Borrowed(&self.message),
            details: self.details.as_ref(),
        })
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CodedError {}

/// `{ "ok": false, "error": { code, message, details? } }`, printed on stdout under `--json`.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope<'a> {
    pub ok: bool,
    pub error: ErrorReport<'a>,
}

impl<'a> ErrorEnvelope<'a> {
    fn failed(error: ErrorReport<'a>) -> Self {
        Self { ok: false, error }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorReport<'a> {
    pub code: &'a str,
    pub message: Cow<'a, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a Value>,
}

/// The outermost coded error in the chain, looking through any `.context(...)` layers.
pub fn find_coded_error(error: &Error) -> Option<&CodedError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<CodedError>())
}

/// Envelope for any error. Uncoded errors report [`INTERNAL`] with the full cause chain.
pub fn envelope_for(error: &Error) -> ErrorEnvelope<'_> {
    match find_coded_error(error) {
        Some(coded) => coded.envelope(),
        None => ErrorEnvelope::failed(ErrorReport {
            code: INTERNAL,
            message: Cow::Owned(format!("{error:#}")),
            details: None,
        }),
    }
}
