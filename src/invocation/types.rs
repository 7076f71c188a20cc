//! Payload types handed to a [`ModelInvoker`](super::ModelInvoker).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the model is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    /// Full analysis: text, classification, answer and explanation.
    #[default]
    Complete,
    /// Text recognition only.
    TextOnly,
    /// Analysis plus generation of similar practice questions.
    QuestionGeneration,
}

impl ProcessingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::Complete => "complete",
            ProcessingMode::TextOnly => "text_only",
            ProcessingMode::QuestionGeneration => "question_generation",
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "complete" => Ok(ProcessingMode::Complete),
            "text_only" | "text" => Ok(ProcessingMode::TextOnly),
            "question_generation" | "generate" => Ok(ProcessingMode::QuestionGeneration),
            other => Err(format!(
                "unknown mode '{}' (expected complete, text_only or question_generation)",
                other
            )),
        }
    }
}

/// Where the image comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Base64-encoded image bytes.
    Inline(String),
    /// URL or storage blob reference the model fetches itself.
    Stored(String),
}

impl ImageSource {
    /// Value for the `image_url.url` field of a chat message part.
    pub fn image_url(&self) -> String {
        match self {
            ImageSource::Inline(data) if data.starts_with("data:") => data.clone(),
            ImageSource::Inline(data) => format!("data:image/jpeg;base64,{}", data),
            ImageSource::Stored(reference) => reference.clone(),
        }
    }

    /// Stable text used to seed mock results for this source.
    pub fn seed(&self) -> &str {
        match self {
            ImageSource::Inline(data) => data,
            ImageSource::Stored(reference) => reference,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ImageSource::Inline(_) => "inline",
            ImageSource::Stored(_) => "stored",
        }
    }
}

// Inline payloads can be megabytes; never dump them into logs.
impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Inline(data) => write!(f, "Inline({} bytes)", data.len()),
            ImageSource::Stored(reference) => f.debug_tuple("Stored").field(reference).finish(),
        }
    }
}

/// Everything the model needs for one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationPayload {
    pub source: ImageSource,
    pub mode: ProcessingMode,
}

impl InvocationPayload {
    pub fn new(source: ImageSource, mode: ProcessingMode) -> Self {
        Self { source, mode }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("complete".parse(), Ok(ProcessingMode::Complete));
        assert_eq!("TEXT_ONLY".parse(), Ok(ProcessingMode::TextOnly));
        assert_eq!(
            "question-generation".parse(),
            Ok(ProcessingMode::QuestionGeneration)
        );
        assert!("summarize".parse::<ProcessingMode>().is_err());
    }

    #[test]
    fn test_mode_serde_names() {
        let json = serde_json::to_string(&ProcessingMode::QuestionGeneration).unwrap();
        assert_eq!(json, "\"question_generation\"");
        let mode: ProcessingMode = serde_json::from_str("\"text_only\"").unwrap();
        assert_eq!(mode, ProcessingMode::TextOnly);
    }

    #[test]
    fn test_inline_payload_becomes_data_url() {
        let source = ImageSource::Inline("aGVsbG8=".to_string());
        assert_eq!(source.image_url(), "data:image/jpeg;base64,aGVsbG8=");

        let source = ImageSource::Inline("data:image/png;base64,aGVsbG8=".to_string());
        assert_eq!(source.image_url(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_stored_reference_passes_through() {
        let source = ImageSource::Stored("https://cdn.example.com/q/17.jpg".to_string());
        assert_eq!(source.image_url(), "https://cdn.example.com/q/17.jpg");
        assert_eq!(source.kind(), "stored");
    }

    #[test]
    fn test_inline_debug_hides_payload() {
        let source = ImageSource::Inline("aGVsbG8gd29ybGQ=".to_string());
        let debug = format!("{:?}", source);
        assert_eq!(debug, "Inline(16 bytes)");
    }
}
