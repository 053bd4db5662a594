use crate::models::attempt::{Answer, AnswerValue};
use crate::models::question::{
    GradingSpec, MultipleChoiceSpec, NumericSpec, Question, ShortAnswerSpec, SingleChoiceSpec,
};
use std::collections::{HashMap, HashSet};

const DEFAULT_NUMERIC_TOLERANCE: f64 = 0.01;
const KEYWORD_CORRECT_THRESHOLD: f64 = 0.70;

/// Verdict for one (question, answer) pair. Malformed input is reported
/// through a zero-score verdict with diagnostic feedback, never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreVerdict {
    pub marks: f64,
    pub is_correct: bool,
    pub feedback: String,
    /// Signals that the automated score is advisory and a human should
    /// review it.
    pub requires_manual_grading: bool,
}

impl ScoreVerdict {
    fn zero(feedback: impl Into<String>) -> Self {
        Self {
            marks: 0.0,
            is_correct: false,
            feedback: feedback.into(),
            requires_manual_grading: false,
        }
    }

    fn manual(feedback: impl Into<String>) -> Self {
        Self {
            requires_manual_grading: true,
            ..Self::zero(feedback)
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttemptScore {
    pub total_score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub scored_answers: Vec<Answer>,
    pub requires_manual_grading: bool,
}

/// Marks and percentages round to 2 decimal places, half away from zero.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub struct ScoringEngine;

impl ScoringEngine {
    /// Scores a whole attempt. Iteration is over the question set, not the
    /// answer set, so unanswered questions are represented and answers for
    /// unknown question ids are silently ignored. Pure: identical inputs
    /// yield identical results.
    pub fn score_attempt(questions: &[Question], answers: &[Answer]) -> AttemptScore {
        let lookup: HashMap<&str, &Answer> = answers
            .iter()
            .map(|a| (a.question_id.as_str(), a))
            .collect();

        let mut total_score = 0.0;
        let mut max_score = 0.0;
        let mut scored_answers = Vec::with_capacity(questions.len());
        let mut requires_manual_grading = false;

        for question in questions {
            max_score += question.marks;

            match lookup.get(question.question_id.as_str()) {
                Some(saved) => {
                    let verdict = Self::score_question(question, saved.answer.as_ref());
                    total_score += verdict.marks;
                    requires_manual_grading |= verdict.requires_manual_grading;
                    scored_answers.push(Answer {
                        question_id: question.question_id.clone(),
                        answer: saved.answer.clone(),
                        answered_at: saved.answered_at,
                        marks: Some(verdict.marks),
                        is_correct: Some(verdict.is_correct),
                        feedback: Some(verdict.feedback),
                    });
                }
                None => scored_answers.push(Answer {
                    question_id: question.question_id.clone(),
                    answer: None,
                    answered_at: None,
                    marks: Some(0.0),
                    is_correct: Some(false),
                    feedback: Some("Not answered".to_string()),
                }),
            }
        }

        let percentage = if max_score > 0.0 {
            round2(total_score / max_score * 100.0)
        } else {
            0.0
        };

        AttemptScore {
            total_score: round2(total_score),
            max_score,
            percentage,
            scored_answers,
            requires_manual_grading,
        }
    }

    /// Scores one question against its raw answer (or its absence).
    pub fn score_question(question: &Question, answer: Option<&AnswerValue>) -> ScoreVerdict {
        match &question.grading {
            GradingSpec::SingleChoice(spec) => score_single_choice(question, spec, answer),
            GradingSpec::MultipleChoice(spec) => score_multiple_choice(question, spec, answer),
            GradingSpec::Numeric(spec) => score_numeric(question, spec, answer),
            GradingSpec::ShortAnswer(spec) => score_short_answer(question, spec, answer),
        }
    }
}

fn explanation_or(question: &Question, fallback: &str) -> String {
    question
        .explanation
        .clone()
        .unwrap_or_else(|| fallback.to_string())
}

fn score_single_choice(
    question: &Question,
    spec: &SingleChoiceSpec,
    answer: Option<&AnswerValue>,
) -> ScoreVerdict {
    let given = match answer {
        None => return ScoreVerdict::zero("No answer provided"),
        Some(AnswerValue::Text(s)) => s.trim().to_string(),
        Some(AnswerValue::Number(n)) => n.to_string(),
        Some(AnswerValue::Selection(_)) => return ScoreVerdict::zero("Incorrect answer"),
    };
    if given.is_empty() {
        return ScoreVerdict::zero("No answer provided");
    }

    if given == spec.correct_answer.trim() {
        ScoreVerdict {
            marks: question.marks,
            is_correct: true,
            feedback: explanation_or(question, ""),
            requires_manual_grading: false,
        }
    } else {
        ScoreVerdict::zero("Incorrect answer")
    }
}

fn score_multiple_choice(
    question: &Question,
    spec: &MultipleChoiceSpec,
    answer: Option<&AnswerValue>,
) -> ScoreVerdict {
    let chosen: HashSet<String> = match answer {
        Some(AnswerValue::Selection(items)) => {
            items.iter().map(|s| s.trim().to_string()).collect()
        }
        _ => return ScoreVerdict::zero("No valid answer provided"),
    };
    let correct: HashSet<String> = spec
        .correct_answer
        .iter()
        .map(|s| s.trim().to_string())
        .collect();

    let correct_selected = correct.intersection(&chosen).count();
    let incorrect_selected = chosen.difference(&correct).count();
    let total_correct = correct.len();
    if total_correct == 0 {
        return ScoreVerdict::zero("No valid answer provided");
    }

    // Wrong picks cancel right picks; clamped so marks never go negative.
    let ratio =
        ((correct_selected as f64 - incorrect_selected as f64) / total_correct as f64).max(0.0);
    let marks = round2(question.marks * ratio);
    let is_correct = chosen == correct;

    let feedback = if is_correct {
        explanation_or(question, "All correct answers selected")
    } else if marks > 0.0 {
        format!("Partial credit: {}/{} correct", correct_selected, total_correct)
    } else {
        "Incorrect selection".to_string()
    };

    ScoreVerdict {
        marks,
        is_correct,
        feedback,
        requires_manual_grading: false,
    }
}

fn score_numeric(
    question: &Question,
    spec: &NumericSpec,
    answer: Option<&AnswerValue>,
) -> ScoreVerdict {
    let given = match answer {
        None => return ScoreVerdict::zero("No answer provided"),
        Some(AnswerValue::Number(n)) => *n,
        Some(AnswerValue::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return ScoreVerdict::zero("No answer provided");
            }
            match trimmed.parse::<f64>() {
                Ok(n) => n,
                Err(_) => return ScoreVerdict::zero("Invalid numerical answer format"),
            }
        }
        Some(AnswerValue::Selection(_)) => {
            return ScoreVerdict::zero("Invalid numerical answer format")
        }
    };

    let tolerance = spec.tolerance.unwrap_or(DEFAULT_NUMERIC_TOLERANCE);
    if (given - spec.correct_answer).abs() <= tolerance {
        ScoreVerdict {
            marks: question.marks,
            is_correct: true,
            feedback: explanation_or(question, "Correct numerical answer"),
            requires_manual_grading: false,
        }
    } else {
        ScoreVerdict::zero(format!("Incorrect. Expected: {}", spec.correct_answer))
    }
}

fn score_short_answer(
    question: &Question,
    spec: &ShortAnswerSpec,
    answer: Option<&AnswerValue>,
) -> ScoreVerdict {
    let text = match answer {
        None => return ScoreVerdict::manual("No answer provided"),
        Some(AnswerValue::Text(s)) => s.trim().to_lowercase(),
        Some(AnswerValue::Number(n)) => n.to_string(),
        Some(AnswerValue::Selection(_)) => return ScoreVerdict::manual("No answer provided"),
    };
    if text.is_empty() {
        return ScoreVerdict::manual("No answer provided");
    }

    if spec.keywords.is_empty() && spec.required_keywords.is_empty() {
        return ScoreVerdict::manual("Requires manual grading");
    }

    let missing_required: Vec<&str> = spec
        .required_keywords
        .iter()
        .filter(|kw| !text.contains(&kw.to_lowercase()))
        .map(|kw| kw.as_str())
        .collect();

    let keywords_found = spec
        .keywords
        .iter()
        .filter(|kw| text.contains(&kw.to_lowercase()))
        .count();

    let (marks, is_correct, feedback, keyword_ratio) = if !missing_required.is_empty() {
        (
            0.0,
            false,
            format!("Missing required keywords: {}", missing_required.join(", ")),
            0.0,
        )
    } else {
        let ratio = keywords_found as f64 / spec.keywords.len().max(1) as f64;
        let marks = round2(question.marks * ratio);
        let is_correct = ratio >= KEYWORD_CORRECT_THRESHOLD;
        let feedback = if is_correct {
            explanation_or(question, "Good keyword coverage")
        } else {
            format!(
                "Found {}/{} expected keywords",
                keywords_found,
                spec.keywords.len()
            )
        };
        (marks, is_correct, feedback, ratio)
    };

    ScoreVerdict {
        marks,
        is_correct,
        feedback,
        // Anything short of full keyword coverage keeps the verdict
        // advisory.
        requires_manual_grading: keyword_ratio < 1.0 && !spec.keywords.is_empty(),
    }
}
