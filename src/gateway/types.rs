//! Request and response types for [`Gateway::analyze`](super::Gateway::analyze).

use crate::analysis::AnalysisResult;
use crate::config::{ConfigError, ResolveOverrides};
use crate::invocation::ProcessingMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Inbound analysis request.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeRequest {
    /// Base64-encoded image
    pub image_base64: Option<String>,
    /// URL or storage blob id
    pub file_id: Option<String>,
    /// Use `file_id` instead of `image_base64`
    pub use_file_id: bool,
    pub mode: ProcessingMode,
    pub options: AnalyzeOptions,
}

impl AnalyzeRequest {
    pub fn inline(image_base64: impl Into<String>) -> Self {
        Self {
            image_base64: Some(image_base64.into()),
            ..Default::default()
        }
    }

    pub fn stored(file_id: impl Into<String>) -> Self {
        Self {
            file_id: Some(file_id.into()),
            use_file_id: true,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.options.request_id = Some(request_id.into());
        self
    }

    pub fn with_overrides(mut self, overrides: RequestOverrides) -> Self {
        self.options.overrides = overrides;
        self
    }
}

impl fmt::Debug for AnalyzeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzeRequest")
            .field(
                "image_base64",
                &self.image_base64.as_ref().map(|s| format!("{} bytes", s.len())),
            )
            .field("file_id", &self.file_id)
            .field("use_file_id", &self.use_file_id)
            .field("mode", &self.mode)
            .field("options", &self.options)
            .finish()
    }
}

/// Per-request options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeOptions {
    /// Correlation id; generated when absent
    pub request_id: Option<String>,
    pub overrides: RequestOverrides,
}

/// Wire form of [`ResolveOverrides`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestOverrides {
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
    pub strict: bool,
    /// Defaults to true
    pub enable_rotation: Option<bool>,
}

impl RequestOverrides {
    pub fn to_resolve(&self) -> ResolveOverrides {
        ResolveOverrides {
            timeout: self.timeout_seconds.map(Duration::from_secs),
            max_retries: self.max_retries,
            strict: self.strict,
            enable_rotation: self.enable_rotation.unwrap_or(true),
        }
    }
}

/// Caller input that cannot be analyzed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("No image payload supplied (set imageBase64, or fileId with useFileId)")]
    NoPayload,

    #[error("Image payload is {size} bytes, limit is {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },
}

impl InputError {
    pub fn code(&self) -> &'static str {
        match self {
            InputError::NoPayload => "NO_PAYLOAD",
            InputError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
        }
    }
}

/// Machine-readable failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl From<&InputError> for ErrorBody {
    fn from(err: &InputError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<&ConfigError> for ErrorBody {
    fn from(err: &ConfigError) -> Self {
        Self {
            code: "INVALID_CONFIG".to_string(),
            message: err.to_string(),
        }
    }
}

/// Successful analysis, live or mock.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeSuccess {
    pub success: bool,
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub request_id: String,
    pub processing_time_ms: u64,
    pub provider: String,
    pub model_version: String,
}

/// Rejected request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeFailure {
    pub success: bool,
    pub request_id: String,
    pub error: ErrorBody,
}

/// Outbound response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalyzeResponse {
    Success(AnalyzeSuccess),
    Failure(AnalyzeFailure),
}

impl AnalyzeResponse {
    pub(crate) fn failure(request_id: String, error: ErrorBody) -> Self {
        AnalyzeResponse::Failure(AnalyzeFailure {
            success: false,
            request_id,
            error,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalyzeResponse::Success(_))
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalyzeResponse::Success(s) => Some(&s.result),
            AnalyzeResponse::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorBody> {
        match self {
            AnalyzeResponse::Success(_) => None,
            AnalyzeResponse::Failure(f) => Some(&f.error),
        }
    }

    pub fn request_id(&self) -> &str {
        match self {
            AnalyzeResponse::Success(s) => &s.request_id,
            AnalyzeResponse::Failure(f) => &f.request_id,
        }
    }
}

/// Gateway construction and operator errors.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Health check unavailable: {0}")]
    ProbeUnavailable(String),
}
