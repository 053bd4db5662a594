use serde::{Deserialize, Serialize};

/// One assessable unit owned by a quiz. Immutable while attempts are open.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: String,
    pub quiz_id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question_text: String,
    pub marks: f64,
    #[serde(default)]
    pub order: i32,
    /// Display options for choice questions; never consulted by scoring.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(flatten)]
    pub grading: GradingSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    Numeric,
    ShortAnswer,
}

/// Correct-answer specification, discriminated by value shape on the wire.
/// Adding a question type extends this enum; every scorer match is
/// exhaustive over it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradingSpec {
    SingleChoice(SingleChoiceSpec),
    MultipleChoice(MultipleChoiceSpec),
    Numeric(NumericSpec),
    // Must stay last: both keyword lists default, so this variant accepts
    // any remaining object.
    ShortAnswer(ShortAnswerSpec),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleChoiceSpec {
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipleChoiceSpec {
    #[serde(rename = "correctAnswer")]
    pub correct_answer: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericSpec {
    #[serde(rename = "correctAnswer")]
    pub correct_answer: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortAnswerSpec {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub required_keywords: Vec<String>,
}
