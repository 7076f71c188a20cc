//! Deterministic mock results for degraded operation.

use super::types::{AnalysisResult, Provenance, QuestionType, Subject};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a.
pub fn fnv1a(data: &[u8]) -> u64 {
    data.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Picks an exemplar from a fixed catalog when the model cannot be used.
///
/// The same seed always yields the same exemplar. Every result carries
/// [`Provenance::Mock`].
#[derive(Debug, Clone)]
pub struct FallbackGenerator {
    catalog: Vec<AnalysisResult>,
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackGenerator {
    pub fn new() -> Self {
        Self {
            catalog: default_catalog(),
        }
    }

    pub fn catalog(&self) -> &[AnalysisResult] {
        &self.catalog
    }

    pub fn produce(&self, seed: &str) -> AnalysisResult {
        let index = (fnv1a(seed.as_bytes()) % self.catalog.len() as u64) as usize;
        let mut result = self.catalog[index].clone();
        result.provenance = Provenance::Mock;
        result
    }
}

fn exemplar(
    question_type: QuestionType,
    subject: Subject,
    difficulty: u8,
    text: &str,
    key_points: &[&str],
    answer: &str,
    explanation: &str,
) -> AnalysisResult {
    AnalysisResult {
        recognized_text: text.to_string(),
        confidence: 0.5,
        question_type,
        subject,
        difficulty,
        key_points: key_points.iter().map(|s| s.to_string()).collect(),
        concepts: key_points.iter().map(|s| s.to_string()).collect(),
        structured_data: None,
        suggested_answer: Some(answer.to_string()),
        explanation: Some(explanation.to_string()),
        provenance: Provenance::Mock,
    }
}

fn default_catalog() -> Vec<AnalysisResult> {
    vec![
        exemplar(
            QuestionType::SingleChoice,
            Subject::Math,
            2,
            "Which of the following is a root of x^2 - 5x + 6 = 0? A. 1  B. 2  C. 4  D. 6",
            &["quadratic equations", "factoring"],
            "B",
            "x^2 - 5x + 6 = (x - 2)(x - 3), so the roots are 2 and 3.",
        ),
        exemplar(
            QuestionType::MultipleChoice,
            Subject::Physics,
            3,
            "Which quantities are vectors? A. mass  B. velocity  C. force  D. time",
            &["vectors and scalars"],
            "B, C",
            "Velocity and force have both magnitude and direction.",
        ),
        exemplar(
            QuestionType::FillBlank,
            Subject::Chemistry,
            2,
            "The chemical formula of water is ____.",
            &["chemical formulas"],
            "H2O",
            "One water molecule contains two hydrogen atoms and one oxygen atom.",
        ),
        exemplar(
            QuestionType::TrueFalse,
            Subject::Biology,
            1,
            "True or false: mitochondria are the site of photosynthesis.",
            &["cell organelles"],
            "False",
            "Photosynthesis takes place in chloroplasts; mitochondria carry out respiration.",
        ),
        exemplar(
            QuestionType::ShortAnswer,
            Subject::History,
            3,
            "Briefly describe one cause of the Industrial Revolution in Britain.",
            &["industrial revolution", "economic history"],
            "Abundant coal deposits provided cheap energy for steam engines.",
            "Any well-supported cause such as capital, colonies or coal is acceptable.",
        ),
        exemplar(
            QuestionType::Calculation,
            Subject::Math,
            3,
            "A car travels 150 km in 2.5 hours. What is its average speed?",
            &["average speed", "unit rates"],
            "60 km/h",
            "Average speed = distance / time = 150 / 2.5 = 60 km/h.",
        ),
        exemplar(
            QuestionType::Essay,
            Subject::English,
            4,
            "Write a short essay (about 120 words) on the value of reading.",
            &["essay structure", "argumentation"],
            "An introduction stating the thesis, two supporting paragraphs, and a conclusion.",
            "Graded on structure, vocabulary and coherence.",
        ),
        exemplar(
            QuestionType::FillBlank,
            Subject::Chinese,
            2,
            "床前明月光，____。",
            &["classical poetry recitation"],
            "疑是地上霜",
            "出自李白《静夜思》。",
        ),
        exemplar(
            QuestionType::SingleChoice,
            Subject::Geography,
            2,
            "Which is the longest river in China? A. Yellow River  B. Pearl River  C. Yangtze River",
            &["rivers of China"],
            "C",
            "The Yangtze is about 6,300 km long.",
        ),
        exemplar(
            QuestionType::ShortAnswer,
            Subject::Politics,
            3,
            "State two basic rights of citizens.",
            &["civic rights"],
            "The right to vote and the right to education.",
            "Any two rights listed in the constitution are acceptable.",
        ),
    ]
}
