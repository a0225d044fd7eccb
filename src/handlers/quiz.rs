use axum::{response::IntoResponse, Json};
use http::StatusCode;
use serde_json::json;

use crate::models::quiz::{PublicQuestion, QuizQuestion, QuizScore, QuizSubmission};

const QUESTIONS: &[QuizQuestion] = &[
    QuizQuestion {
        id: 1,
        prompt: "Which East African event is a round of the World Rally Championship?",
        options: &["Safari Rally Kenya", "Rwanda Mountain Gorilla Rally", "Pearl of Africa Rally"],
        answer_index: 0,
    },
    QuizQuestion {
        id: 2,
        prompt: "How many points does a Grand Prix winner score?",
        options: &["18", "25", "30"],
        answer_index: 1,
    },
    QuizQuestion {
        id: 3,
        prompt: "Which circuit hosts the Italian Grand Prix?",
        options: &["Imola", "Mugello", "Monza"],
        answer_index: 2,
    },
    QuizQuestion {
        id: 4,
        prompt: "What does DRS stand for?",
        options: &["Drag Reduction System", "Downforce Regulation Setting", "Dynamic Race Strategy"],
        answer_index: 0,
    },
    QuizQuestion {
        id: 5,
        prompt: "Which flag signals the end of a race?",
        options: &["Yellow flag", "Chequered flag", "Blue flag"],
        answer_index: 1,
    },
];

pub async fn get_quiz() -> impl IntoResponse {
    let questions: Vec<PublicQuestion> = QUESTIONS.iter().map(PublicQuestion::from).collect();
    (StatusCode::OK, Json(json!({ "questions": questions }))).into_response()
}

pub async fn score_quiz(Json(payload): Json<QuizSubmission>) -> impl IntoResponse {
    (StatusCode::OK, Json(score(QUESTIONS, &payload.answers))).into_response()
}

/// Answers are matched to questions by position; missing answers are wrong
/// and extra ones are ignored.
pub fn score(questions: &[QuizQuestion], answers: &[Option<usize>]) -> QuizScore {
    let correct = questions
        .iter()
        .zip(answers.iter())
        .filter(|(question, answer)| **answer == Some(question.answer_index))
        .count();
    QuizScore {
        score: correct,
        total: questions.len(),
    }
}
