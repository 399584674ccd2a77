use crate::error::{Error, Result};
use crate::models::exercise::{Answer, Exercise};
use serde::{Deserialize, Serialize};

/// Standalone (assignment-style) quiz stored at `courses/{course}/assignments/{quiz}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub name: String,
    pub exercises: Vec<Exercise>,
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub ended: bool,
    #[serde(default)]
    pub show_result_to_students: bool,
}

impl Quiz {
    /// Exercises and key must line up one to one, variant for variant.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::BadRequest("quiz name is empty".to_string()));
        }
        if self.exercises.is_empty() {
            return Err(Error::BadRequest("a quiz needs at least one exercise".to_string()));
        }
        if self.exercises.len() != self.answers.len() {
            return Err(Error::LengthMismatch {
                student: self.exercises.len(),
                key: self.answers.len(),
            });
        }
        for (idx, (exercise, key)) in self.exercises.iter().zip(&self.answers).enumerate() {
            exercise.validate()?;
            exercise.validate_key(key).map_err(|e| match e {
                Error::BadRequest(msg) => Error::BadRequest(format!("key {}: {}", idx, msg)),
                other => other,
            })?;
        }
        Ok(())
    }

    /// Validates a full submission against the exercise sequence.
    pub fn validate_submission(&self, answers: &[Answer]) -> Result<()> {
        if answers.len() != self.exercises.len() {
            return Err(Error::LengthMismatch {
                student: answers.len(),
                key: self.exercises.len(),
            });
        }
        self.exercises
            .iter()
            .zip(answers)
            .try_for_each(|(exercise, answer)| exercise.validate_answer(answer))
    }
}
