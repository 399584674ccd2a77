use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const MIN_PROPOSITIONS: usize = 2;
pub const MAX_PROPOSITIONS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposition {
    pub id: i32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McqExercise {
    pub question: String,
    pub propositions: Vec<Proposition>,
    pub answers_indices: BTreeSet<i32>,
    pub number_of_answers: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfExercise {
    pub question: String,
    pub answer: bool,
}

/// A published exercise. Immutable once it is part of a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Exercise {
    #[serde(rename = "MCQ")]
    Mcq(McqExercise),
    #[serde(rename = "TF")]
    Tf(TfExercise),
}

/// A student's selection (or a key) for one exercise.
///
/// `PartialEq` is structural; scoring goes through [`Answer::equals`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Answer {
    #[serde(rename = "MCQAnswersIndices")]
    McqIndices { value: BTreeSet<i32> },
    #[serde(rename = "TFAnswer")]
    Tf {
        #[serde(default)]
        value: Option<bool>,
    },
}

impl Answer {
    pub fn mcq<I: IntoIterator<Item = i32>>(indices: I) -> Self {
        Answer::McqIndices {
            value: indices.into_iter().collect(),
        }
    }

    pub fn tf(value: Option<bool>) -> Self {
        Answer::Tf { value }
    }

    /// Scoring equality. MCQ selections compare as sets; a TF answer with no
    /// selection never matches anything, not even another empty one.
    pub fn equals(&self, other: &Answer) -> bool {
        match (self, other) {
            (Answer::McqIndices { value: a }, Answer::McqIndices { value: b }) => a == b,
            (Answer::Tf { value: Some(a) }, Answer::Tf { value: Some(b) }) => a == b,
            _ => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Answer::McqIndices { .. } => "MCQAnswersIndices",
            Answer::Tf { .. } => "TFAnswer",
        }
    }
}

impl Exercise {
    pub fn question(&self) -> &str {
        match self {
            Exercise::Mcq(mcq) => &mcq.question,
            Exercise::Tf(tf) => &tf.question,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Exercise::Mcq(_) => "MCQ",
            Exercise::Tf(_) => "TF",
        }
    }

    /// The answer a perfect student would give.
    pub fn answer_key(&self) -> Answer {
        match self {
            Exercise::Mcq(mcq) => Answer::McqIndices {
                value: mcq.answers_indices.clone(),
            },
            Exercise::Tf(tf) => Answer::tf(Some(tf.answer)),
        }
    }

    /// The "nothing selected yet" answer for this exercise.
    pub fn blank_answer(&self) -> Answer {
        match self {
            Exercise::Mcq(_) => Answer::McqIndices {
                value: BTreeSet::new(),
            },
            Exercise::Tf(_) => Answer::tf(None),
        }
    }

    /// Whether `answer` is the variant this exercise expects.
    pub fn accepts(&self, answer: &Answer) -> bool {
        matches!(
            (self, answer),
            (Exercise::Mcq(_), Answer::McqIndices { .. }) | (Exercise::Tf(_), Answer::Tf { .. })
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.question().trim().is_empty() {
            return Err(Error::BadRequest("exercise question is empty".to_string()));
        }

        let Exercise::Mcq(mcq) = self else {
            return Ok(());
        };

        let count = mcq.propositions.len();
        if !(MIN_PROPOSITIONS..=MAX_PROPOSITIONS).contains(&count) {
            return Err(Error::BadRequest(format!(
                "an MCQ needs between {} and {} propositions, got {}",
                MIN_PROPOSITIONS, MAX_PROPOSITIONS, count
            )));
        }

        let ids: BTreeSet<i32> = mcq.propositions.iter().map(|p| p.id).collect();
        if ids.len() != count {
            return Err(Error::BadRequest("proposition ids must be unique".to_string()));
        }

        check_indices(&mcq.answers_indices, count)?;

        if mcq.number_of_answers < 1 {
            return Err(Error::BadRequest(
                "numberOfAnswers must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Checks that `key` can grade this exercise: same variant, and every MCQ
    /// index names one of the propositions.
    pub fn validate_key(&self, key: &Answer) -> Result<()> {
        if !self.accepts(key) {
            return Err(Error::BadRequest(format!(
                "a {} key cannot grade a {} exercise",
                key.kind(),
                self.kind()
            )));
        }
        if let (Exercise::Mcq(mcq), Answer::McqIndices { value }) = (self, key) {
            check_indices(value, mcq.propositions.len())?;
        }
        Ok(())
    }

    /// Checks that `answer` is a well-formed student answer for this exercise.
    pub fn validate_answer(&self, answer: &Answer) -> Result<()> {
        if !self.accepts(answer) {
            return Err(Error::BadRequest(format!(
                "{} answer given for a {} exercise",
                answer.kind(),
                self.kind()
            )));
        }

        if let (Exercise::Mcq(mcq), Answer::McqIndices { value }) = (self, answer) {
            if value.len() > mcq.number_of_answers as usize {
                return Err(Error::BadRequest(format!(
                    "at most {} selections are allowed, got {}",
                    mcq.number_of_answers,
                    value.len()
                )));
            }
        }

        Ok(())
    }
}

fn check_indices(indices: &BTreeSet<i32>, count: usize) -> Result<()> {
    match indices.iter().find(|&&i| i < 0 || i as usize >= count) {
        Some(bad) => Err(Error::BadRequest(format!(
            "answer index {} is outside the {} propositions",
            bad, count
        ))),
        None => Ok(()),
    }
}
