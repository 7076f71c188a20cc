//! Structured analysis result and its enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_CONFIDENCE: f64 = 0.8;
pub const DEFAULT_DIFFICULTY: u8 = 3;
pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;

/// Kind of exam question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    FillBlank,
    TrueFalse,
    ShortAnswer,
    Calculation,
    Essay,
    #[default]
    Unknown,
}

impl QuestionType {
    pub const ALL: [QuestionType; 7] = [
        QuestionType::SingleChoice,
        QuestionType::MultipleChoice,
        QuestionType::FillBlank,
        QuestionType::TrueFalse,
        QuestionType::ShortAnswer,
        QuestionType::Calculation,
        QuestionType::Essay,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::FillBlank => "fill_blank",
            QuestionType::TrueFalse => "true_false",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::Calculation => "calculation",
            QuestionType::Essay => "essay",
            QuestionType::Unknown => "unknown",
        }
    }

    /// Case-insensitive match against known names; anything else is `Unknown`.
    pub fn from_lenient(s: &str) -> Self {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "single_choice" | "choice" | "单选题" | "选择题" => QuestionType::SingleChoice,
            "multiple_choice" | "multi_choice" | "多选题" => QuestionType::MultipleChoice,
            "fill_blank" | "fill_in_the_blank" | "填空题" => QuestionType::FillBlank,
            "true_false" | "judgment" | "判断题" => QuestionType::TrueFalse,
            "short_answer" | "简答题" | "解答题" => QuestionType::ShortAnswer,
            "calculation" | "计算题" => QuestionType::Calculation,
            "essay" | "composition" | "作文" => QuestionType::Essay,
            _ => QuestionType::Unknown,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// School subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Math,
    Physics,
    Chemistry,
    Biology,
    Chinese,
    English,
    History,
    Geography,
    Politics,
    #[default]
    Unknown,
}

impl Subject {
    pub fn as_str(self) -> &'static str {
        match self {
            Subject::Math => "math",
            Subject::Physics => "physics",
            Subject::Chemistry => "chemistry",
            Subject::Biology => "biology",
            Subject::Chinese => "chinese",
            Subject::English => "english",
            Subject::History => "history",
            Subject::Geography => "geography",
            Subject::Politics => "politics",
            Subject::Unknown => "unknown",
        }
    }

    /// Chinese display name.
    pub fn local_name(self) -> &'static str {
        match self {
            Subject::Math => "数学",
            Subject::Physics => "物理",
            Subject::Chemistry => "化学",
            Subject::Biology => "生物",
            Subject::Chinese => "语文",
            Subject::English => "英语",
            Subject::History => "历史",
            Subject::Geography => "地理",
            Subject::Politics => "政治",
            Subject::Unknown => "未知",
        }
    }

    /// Accepts English names (any case) and Chinese names; anything else is `Unknown`.
    pub fn from_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "math" | "maths" | "mathematics" | "数学" => Subject::Math,
            "physics" | "物理" => Subject::Physics,
            "chemistry" | "化学" => Subject::Chemistry,
            "biology" | "生物" => Subject::Biology,
            "chinese" | "语文" => Subject::Chinese,
            "english" | "英语" => Subject::English,
            "history" | "历史" => Subject::History,
            "geography" | "地理" => Subject::Geography,
            "politics" | "政治" => Subject::Politics,
            _ => Subject::Unknown,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a result came from the model or the mock catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    #[default]
    Live,
    Mock,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Live => "live",
            Provenance::Mock => "mock",
        }
    }
}

/// Structured description of one photographed question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub recognized_text: String,
    /// In `[0, 1]`
    pub confidence: f64,
    pub question_type: QuestionType,
    pub subject: Subject,
    /// In `1..=5`
    pub difficulty: u8,
    pub key_points: Vec<String>,
    pub concepts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub provenance: Provenance,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            recognized_text: String::new(),
            confidence: DEFAULT_CONFIDENCE,
            question_type: QuestionType::Unknown,
            subject: Subject::Unknown,
            difficulty: DEFAULT_DIFFICULTY,
            key_points: Vec::new(),
            concepts: Vec::new(),
            structured_data: None,
            suggested_answer: None,
            explanation: None,
            provenance: Provenance::Live,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_type_lenient_matching() {
        assert_eq!(
            QuestionType::from_lenient("Single_Choice"),
            QuestionType::SingleChoice
        );
        assert_eq!(
            QuestionType::from_lenient("fill-blank"),
            QuestionType::FillBlank
        );
        assert_eq!(QuestionType::from_lenient("判断题"), QuestionType::TrueFalse);
        assert_eq!(QuestionType::from_lenient("bogus"), QuestionType::Unknown);
        assert_eq!(QuestionType::from_lenient(""), QuestionType::Unknown);
    }

    #[test]
    fn test_subject_accepts_chinese_names() {
        assert_eq!(Subject::from_lenient("数学"), Subject::Math);
        assert_eq!(Subject::from_lenient(" PHYSICS "), Subject::Physics);
        assert_eq!(Subject::from_lenient("化学"), Subject::Chemistry);
        assert_eq!(Subject::from_lenient("astrology"), Subject::Unknown);
        assert_eq!(Subject::Chinese.local_name(), "语文");
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = AnalysisResult {
            recognized_text: "x + 1 = 2".to_string(),
            question_type: QuestionType::FillBlank,
            subject: Subject::Math,
            ..Default::default()
        };
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["recognizedText"], "x + 1 = 2");
        assert_eq!(json["questionType"], "fill_blank");
        assert_eq!(json["subject"], "math");
        assert_eq!(json["difficulty"], 3);
        assert_eq!(json["provenance"], "live");
        assert!(json.get("suggestedAnswer").is_none());
    }
}
