use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct QuizQuestion {
    pub id: u32,
    pub prompt: &'static str,
    pub options: &'static [&'static str],
    pub answer_index: usize,
}

/// Question as shown to visitors, without the answer.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: u32,
    pub prompt: &'static str,
    pub options: &'static [&'static str],
}

impl From<&QuizQuestion> for PublicQuestion {
    fn from(question: &QuizQuestion) -> Self {
        Self {
            id: question.id,
            prompt: question.prompt,
            options: question.options,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizSubmission {
    #[serde(default)]
    pub answers: Vec<Option<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub score: usize,
    pub total: usize,
}
