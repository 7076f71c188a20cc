//! Prompt text sent with each image.

use super::ProcessingMode;

const RESULT_SCHEMA: &str = r#"{
  "recognizedText": "full text of the question",
  "confidence": 0.0,
  "questionType": "single_choice | multiple_choice | fill_blank | true_false | short_answer | calculation | essay | unknown",
  "subject": "math | physics | chemistry | biology | chinese | english | history | geography | politics | unknown",
  "difficulty": 1,
  "keyPoints": ["..."],
  "concepts": ["..."],
  "structuredData": {},
  "suggestedAnswer": "...",
  "explanation": "..."
}"#;

/// System prompt for a processing mode.
pub fn system_prompt(mode: ProcessingMode) -> String {
    let task = match mode {
        ProcessingMode::Complete => {
            "Recognize the exam question in the image, classify it, rate its difficulty \
             from 1 to 5, list the key points and concepts it tests, and give a suggested \
             answer with a short explanation."
        }
        ProcessingMode::TextOnly => {
            "Recognize the text of the exam question in the image as accurately as possible. \
             Fill in recognizedText and confidence; leave the other fields at their defaults."
        }
        ProcessingMode::QuestionGeneration => {
            "Recognize and analyze the exam question in the image, then put two or three \
             similar practice questions under structuredData.similarQuestions."
        }
    };

    format!(
        "You are an experienced teacher analyzing photographed exam questions. {}\n\
         Reply with a single JSON object and nothing else, using exactly these fields:\n{}",
        task, RESULT_SCHEMA
    )
}

/// User message text accompanying the image part.
pub fn user_prompt(mode: ProcessingMode) -> &'static str {
    match mode {
        ProcessingMode::Complete => "Analyze this question.",
        ProcessingMode::TextOnly => "Transcribe this question.",
        ProcessingMode::QuestionGeneration => "Analyze this question and generate similar ones.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mode_requests_json() {
        for mode in [
            ProcessingMode::Complete,
            ProcessingMode::TextOnly,
            ProcessingMode::QuestionGeneration,
        ] {
            let prompt = system_prompt(mode);
            assert!(prompt.contains("JSON"));
            assert!(prompt.contains("recognizedText"));
        }
    }

    #[test]
    fn test_generation_mode_mentions_similar_questions() {
        assert!(system_prompt(ProcessingMode::QuestionGeneration).contains("similarQuestions"));
        assert!(!system_prompt(ProcessingMode::TextOnly).contains("similarQuestions"));
    }
}
