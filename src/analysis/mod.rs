//! Analysis results: parsing model output and mock degradation.

pub mod fallback;
pub mod parser;
pub mod types;

pub use fallback::{fnv1a, FallbackGenerator};
pub use parser::{ResponseParser, FREE_TEXT_CONFIDENCE};
pub use types::{AnalysisResult, Provenance, QuestionType, Subject};
