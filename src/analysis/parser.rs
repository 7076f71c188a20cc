//! Tolerant extraction of [`AnalysisResult`]s from free-form model output.
//!
//! Models are asked for a bare JSON object but regularly wrap it in a Markdown
//! fence, prefix it with prose, or ignore the instruction entirely. Parsing
//! never fails: output without a usable object becomes a low-confidence
//! text-only result.

use super::types::{
    AnalysisResult, QuestionType, Subject, DEFAULT_CONFIDENCE, DEFAULT_DIFFICULTY, MAX_DIFFICULTY,
    MIN_DIFFICULTY,
};
use serde_json::{Map, Value};

/// Confidence assigned to output with no recoverable JSON object.
pub const FREE_TEXT_CONFIDENCE: f64 = 0.7;

/// Turns raw model text into a normalized [`AnalysisResult`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, raw: &str) -> AnalysisResult {
        let trimmed = raw.trim();

        match extract_object(trimmed) {
            Some(object) => normalize(&object),
            None => {
                tracing::debug!(
                    content_len = trimmed.len(),
                    "No JSON object in model output, using raw text"
                );
                AnalysisResult {
                    recognized_text: trimmed.to_string(),
                    confidence: FREE_TEXT_CONFIDENCE,
                    ..Default::default()
                }
            }
        }
    }
}

fn extract_object(text: &str) -> Option<Map<String, Value>> {
    if let Some(object) = decode_object(text) {
        return Some(object);
    }
    if let Some(inner) = strip_code_fence(text) {
        if let Some(object) = decode_object(inner) {
            return Some(object);
        }
    }
    balanced_objects(text).into_iter().find_map(decode_object)
}

fn decode_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Body of a ```` ```json ... ``` ```` block spanning the whole text.
fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    // Drop the info string ("json") on the opening line.
    let body_start = rest.find('\n')? + 1;
    let body = &rest[body_start..];
    Some(body.trim_end().strip_suffix("```").unwrap_or(body))
}

/// Balanced `{...}` spans tried after direct decoding fails.
const MAX_CANDIDATES: usize = 64;

/// Balanced `{...}` spans in order of their opening brace, at most
/// [`MAX_CANDIDATES`] of them.
///
/// One pass with a stack of open braces, so unmatched braces cost nothing
/// extra. Braces inside JSON string literals (including escaped quotes) are
/// ignored; quotes in prose outside any brace are not treated as strings.
fn balanced_objects(text: &str) -> Vec<&str> {
    let mut open: Vec<usize> = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (index, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' if !open.is_empty() => in_string = true,
            '{' => open.push(index),
            '}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, index + 1));
                }
            }
            _ => {}
        }
    }

    spans.sort_unstable_by_key(|&(start, _)| start);
    spans
        .into_iter()
        .take(MAX_CANDIDATES)
        .map(|(start, end)| &text[start..end])
        .collect()
}

fn field<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| object.get(*name))
        .filter(|v| !v.is_null())
}

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Strings pass through unchanged. Bare numbers and booleans (`"suggestedAnswer": 42`)
/// are kept as their JSON text; anything else is dropped.
fn optional_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(value @ (Value::Number(_) | Value::Bool(_))) => Some(value.to_string()),
        _ => None,
    }
}

fn normalize(object: &Map<String, Value>) -> AnalysisResult {
    let recognized_text = field(object, &["recognizedText", "recognized_text", "text"])
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let confidence = field(object, &["confidence"])
        .and_then(number)
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let difficulty = field(object, &["difficulty"])
        .and_then(number)
        .map(|d| d.round().clamp(MIN_DIFFICULTY as f64, MAX_DIFFICULTY as f64) as u8)
        .unwrap_or(DEFAULT_DIFFICULTY);

    let question_type = field(object, &["questionType", "question_type"])
        .and_then(Value::as_str)
        .map(QuestionType::from_lenient)
        .unwrap_or_default();

    let subject = field(object, &["subject"])
        .and_then(Value::as_str)
        .map(Subject::from_lenient)
        .unwrap_or_default();

    AnalysisResult {
        recognized_text,
        confidence,
        question_type,
        subject,
        difficulty,
        key_points: string_list(field(object, &["keyPoints", "key_points"])),
        concepts: string_list(field(object, &["concepts"])),
        structured_data: field(object, &["structuredData", "structured_data"]).cloned(),
        suggested_answer: optional_text(field(object, &["suggestedAnswer", "suggested_answer"])),
        explanation: optional_text(field(object, &["explanation"])),
        ..Default::default()
    }
}
