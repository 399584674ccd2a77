use crate::database::{self, paths, Precondition, SharedStore};
use crate::error::{Error, Result};
use crate::models::exercise::Answer;
use crate::models::lecture::{Lecture, LectureEvent};
use crate::models::quiz::Quiz;
use crate::models::quiz_attempt::QuizAttempt;
use serde::Serialize;

/// A stored attempt together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub attempt: QuizAttempt,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptReceipt {
    pub id: String,
    pub attempts: u32,
}

fn next_attempt(previous: Option<&AttemptRecord>, answers: Vec<Answer>) -> (QuizAttempt, Precondition) {
    match previous {
        None => (QuizAttempt { attempts: 1, answers }, Precondition::Absent),
        Some(record) => (
            QuizAttempt {
                attempts: record.attempt.attempts + 1,
                answers,
            },
            Precondition::Version(record.version),
        ),
    }
}

/// One attempt document per (user, quiz), overwritten in place on every
/// submission with an incremented counter.
#[derive(Clone)]
pub struct AttemptService {
    store: SharedStore,
}

impl AttemptService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn load(&self, path: &str) -> Result<Option<AttemptRecord>> {
        let Some(snapshot) = self.store.get(path).await? else {
            return Ok(None);
        };
        Ok(Some(AttemptRecord {
            attempt: snapshot.decode()?,
            version: snapshot.version,
        }))
    }

    /// Writes the attempt following `previous`. The write only lands if the
    /// stored document is still the one `previous` was read from; otherwise
    /// `Error::Conflict` is returned and nothing is retried here.
    pub async fn submit(
        &self,
        previous: Option<&AttemptRecord>,
        answers: Vec<Answer>,
        path: &str,
    ) -> Result<AttemptReceipt> {
        let (attempt, precondition) = next_attempt(previous, answers);
        let attempts = attempt.attempts;
        self.store
            .put(path, serde_json::to_value(&attempt)?, precondition)
            .await?;

        Ok(AttemptReceipt {
            id: paths::document_id(path).to_string(),
            attempts,
        })
    }

    /// Read-increment-write in one transaction; concurrent submissions for the
    /// same path each get a distinct count.
    pub async fn record(&self, path: &str, answers: Vec<Answer>) -> Result<AttemptReceipt> {
        let (attempts, _) = database::transaction(self.store.as_ref(), path, |current| {
            let previous = current
                .map(|snapshot| {
                    Ok::<_, Error>(AttemptRecord {
                        attempt: snapshot.decode()?,
                        version: snapshot.version,
                    })
                })
                .transpose()?;
            let (attempt, _) = next_attempt(previous.as_ref(), answers.clone());
            let attempts = attempt.attempts;
            Ok((serde_json::to_value(&attempt)?, attempts))
        })
        .await?;

        tracing::info!(path, attempts, "Quiz attempt recorded");
        Ok(AttemptReceipt {
            id: paths::document_id(path).to_string(),
            attempts,
        })
    }

    /// Submission for an assignment-style quiz. `explicit_path`, when given,
    /// must name the caller's own attempt document of `quiz_id`.
    pub async fn create_quiz_attempt(
        &self,
        course_id: &str,
        quiz_id: &str,
        explicit_path: Option<&str>,
        answers: Vec<Answer>,
        user_id: &str,
    ) -> Result<AttemptReceipt> {
        paths::check_ids(&[course_id, quiz_id, user_id])?;
        let quiz: Quiz = database::get_as(self.store.as_ref(), &paths::assignment(course_id, quiz_id)).await?;
        if quiz.ended {
            return Err(Error::QuizEnded(quiz_id.to_string()));
        }
        quiz.validate_submission(&answers)?;

        if let Some(path) = explicit_path {
            paths::check_attempt_path(path, course_id, quiz_id, user_id)?;
        }
        let path = paths::assignment_attempt(course_id, quiz_id, user_id);
        self.record(&path, answers).await
    }

    /// Submission for the quiz currently broadcast in a lecture.
    pub async fn create_lecture_quiz_attempt(
        &self,
        course_id: &str,
        lecture_id: &str,
        event_id: &str,
        answer: Answer,
        user_id: &str,
    ) -> Result<AttemptReceipt> {
        paths::check_ids(&[course_id, lecture_id, event_id, user_id])?;
        let event: LectureEvent = database::get_as(
            self.store.as_ref(),
            &paths::lecture_event(course_id, lecture_id, event_id),
        )
        .await?;
        let quiz = event.quiz()?;
        if event.done || quiz.ended {
            return Err(Error::QuizEnded(event_id.to_string()));
        }

        let lecture: Lecture =
            database::get_as(self.store.as_ref(), &paths::lecture(course_id, lecture_id)).await?;
        if !lecture.is_active(event_id) {
            return Err(Error::InvalidTransition(format!(
                "quiz {} is not being broadcast",
                event_id
            )));
        }
        quiz.exercise.validate_answer(&answer)?;

        let path = paths::lecture_event_attempt(course_id, lecture_id, event_id, user_id);
        self.record(&path, vec![answer]).await
    }
}
