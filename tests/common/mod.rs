#![allow(dead_code)]

use assessment_backend::models::assignment::QuizAssignment;
use assessment_backend::models::question::{
    GradingSpec, MultipleChoiceSpec, NumericSpec, Question, QuestionType, ShortAnswerSpec,
    SingleChoiceSpec,
};
use assessment_backend::models::quiz::{Quiz, QuizSettings};
use assessment_backend::routes::app;
use assessment_backend::storage::memory::InMemoryStore;
use assessment_backend::utils::time::ManualClock;
use assessment_backend::AppState;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const STUDENT: &str = "student@example.com";
pub const GRADER: &str = "grader@example.com";
pub const ASSIGNMENT: &str = "assign-1";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
    pub started: DateTime<Utc>,
}

/// Quiz fixture: 30 marks across the four question types, pass mark 12
/// (40%), 30-minute duration.
fn quiz(settings: QuizSettings) -> Quiz {
    Quiz {
        quiz_id: "quiz-1".to_string(),
        title: "Programming Fundamentals".to_string(),
        description: None,
        course_id: "course-1".to_string(),
        duration: 30,
        total_marks: 30.0,
        passing_marks: 12.0,
        settings,
        question_ids: vec![
            "q1".to_string(),
            "q2".to_string(),
            "q3".to_string(),
            "q4".to_string(),
        ],
        is_active: true,
    }
}

fn questions() -> Vec<Question> {
    vec![
        Question {
            question_id: "q1".to_string(),
            quiz_id: "quiz-1".to_string(),
            question_type: QuestionType::SingleChoice,
            question_text: "Which option is correct?".to_string(),
            marks: 5.0,
            order: 1,
            options: vec![
                "A".to_string(),
                "B".to_string(),
                "C".to_string(),
                "D".to_string(),
            ],
            explanation: None,
            grading: GradingSpec::SingleChoice(SingleChoiceSpec {
                correct_answer: "B".to_string(),
            }),
        },
        Question {
            question_id: "q2".to_string(),
            quiz_id: "quiz-1".to_string(),
            question_type: QuestionType::MultipleChoice,
            question_text: "Select all that apply.".to_string(),
            marks: 10.0,
            order: 2,
            options: vec![
                "A".to_string(),
                "B".to_string(),
                "C".to_string(),
                "D".to_string(),
            ],
            explanation: None,
            grading: GradingSpec::MultipleChoice(MultipleChoiceSpec {
                correct_answer: vec!["A".to_string(), "C".to_string()],
            }),
        },
        Question {
            question_id: "q3".to_string(),
            quiz_id: "quiz-1".to_string(),
            question_type: QuestionType::Numeric,
            question_text: "What is the measured value?".to_string(),
            marks: 5.0,
            order: 3,
            options: Vec::new(),
            explanation: None,
            grading: GradingSpec::Numeric(NumericSpec {
                correct_answer: 42.5,
                tolerance: Some(0.1),
            }),
        },
        Question {
            question_id: "q4".to_string(),
            quiz_id: "quiz-1".to_string(),
            question_type: QuestionType::ShortAnswer,
            question_text: "How does Python execute code?".to_string(),
            marks: 10.0,
            order: 4,
            options: Vec::new(),
            explanation: None,
            grading: GradingSpec::ShortAnswer(ShortAnswerSpec {
                keywords: vec!["python".to_string(), "interpreter".to_string()],
                required_keywords: Vec::new(),
            }),
        },
    ]
}

pub async fn spawn_app(settings: QuizSettings) -> TestApp {
    let started = Utc::now();
    let store = Arc::new(InMemoryStore::new());
    store.seed_quiz(quiz(settings), questions()).await;
    store
        .seed_assignment(QuizAssignment {
            assignment_id: ASSIGNMENT.to_string(),
            quiz_id: "quiz-1".to_string(),
            assigned_by: "admin@example.com".to_string(),
            due_date: started + Duration::hours(24),
            max_attempts: 2,
            is_active: true,
        })
        .await;

    let clock = Arc::new(ManualClock::new(started));
    let offset = FixedOffset::east_opt(5 * 3600).unwrap();
    let state = AppState::new(store.clone(), clock.clone(), offset);

    TestApp {
        router: app(state),
        store,
        clock,
        started,
    }
}

pub async fn spawn_default_app() -> TestApp {
    spawn_app(QuizSettings::default()).await
}

fn request(method: &str, uri: &str, identity: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((name, value)) = identity {
        builder = builder.header(name, value);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn student_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    request(method, uri, Some(("x-student-email", STUDENT)), body)
}

pub fn grader_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    request(method, uri, Some(("x-grader-email", GRADER)), body)
}

pub fn anonymous_request(method: &str, uri: &str) -> Request<Body> {
    request(method, uri, None, None)
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Starts an attempt and returns its id.
pub async fn start_attempt(app: &TestApp) -> String {
    let (status, body) = send(
        &app.router,
        student_request(
            "POST",
            &format!("/api/student/quiz/{}/start", ASSIGNMENT),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["attemptId"].as_str().unwrap().to_string()
}

pub async fn save_answer(app: &TestApp, attempt_id: &str, question_id: &str, answer: Value) {
    let (status, body) = send(
        &app.router,
        student_request(
            "POST",
            &format!("/api/student/attempt/{}/answer", attempt_id),
            Some(json!({ "questionId": question_id, "answer": answer })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "save_answer failed: {}", body);
    assert_eq!(body["saved"], json!(true));
}

/// Saves answers worth 20 of the 30 marks: q1, q2 and q3 correct, q4 left
/// unanswered.
pub async fn save_partial_answers(app: &TestApp, attempt_id: &str) {
    save_answer(app, attempt_id, "q1", json!("B")).await;
    save_answer(app, attempt_id, "q2", json!(["A", "C"])).await;
    save_answer(app, attempt_id, "q3", json!(42.45)).await;
}

/// Saves a full-marks answer set.
pub async fn save_all_answers(app: &TestApp, attempt_id: &str) {
    save_partial_answers(app, attempt_id).await;
    save_answer(app, attempt_id, "q4", json!("Python runs code through an interpreter")).await;
}

pub async fn submit(app: &TestApp, attempt_id: &str) -> (StatusCode, Value) {
    send(
        &app.router,
        student_request(
            "POST",
            &format!("/api/student/attempt/{}/submit", attempt_id),
            None,
        ),
    )
    .await
}
