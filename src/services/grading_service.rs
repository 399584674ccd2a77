use crate::error::{Error, Result};
use crate::models::exercise::Answer;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradedQuiz {
    pub score: usize,
    pub total: usize,
    pub correct: Vec<bool>,
}

pub struct GradingService;

impl GradingService {
    /// Number of positions where the student's answer equals the key.
    /// Sequences of different length are rejected rather than truncated.
    pub fn score(student_answers: &[Answer], key: &[Answer]) -> Result<usize> {
        Ok(Self::grade(student_answers, key)?.score)
    }

    pub fn grade(student_answers: &[Answer], key: &[Answer]) -> Result<GradedQuiz> {
        if student_answers.len() != key.len() {
            return Err(Error::LengthMismatch {
                student: student_answers.len(),
                key: key.len(),
            });
        }

        let correct: Vec<bool> = student_answers
            .iter()
            .zip(key)
            .map(|(given, expected)| given.equals(expected))
            .collect();

        Ok(GradedQuiz {
            score: correct.iter().filter(|&&c| c).count(),
            total: key.len(),
            correct,
        })
    }
}
