use crate::error::{Error, Result};
use crate::models::exercise::{Answer, Exercise};
use serde::{Deserialize, Serialize};

/// A single-exercise quiz embedded in a lecture event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureQuiz {
    pub exercise: Exercise,
    pub answer: Answer,
    #[serde(default)]
    pub ended: bool,
    #[serde(default)]
    pub show_result_to_students: bool,
}

impl LectureQuiz {
    pub fn new(exercise: Exercise, answer: Answer) -> Result<Self> {
        exercise.validate()?;
        exercise.validate_key(&answer)?;
        Ok(Self {
            exercise,
            answer,
            ended: false,
            show_result_to_students: false,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Quiz,
    Other(String),
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "quiz" => EventKind::Quiz,
            _ => EventKind::Other(value),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Quiz => "quiz".to_string(),
            EventKind::Other(other) => other,
        }
    }
}

/// Timeline item of a lecture at `courses/{c}/lectures/{l}/lectureEvents/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub page_number: i32,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_model: Option<LectureQuiz>,
}

impl LectureEvent {
    pub fn quiz(&self) -> Result<&LectureQuiz> {
        match (&self.kind, &self.quiz_model) {
            (EventKind::Quiz, Some(quiz)) => Ok(quiz),
            _ => Err(Error::NotFound(format!("lecture event {} is not a quiz", self.id))),
        }
    }

    /// A client showing this event must leave once it is done.
    pub fn should_exit(&self) -> bool {
        self.done
    }

    pub fn pointer(&self) -> EventPointer {
        EventPointer {
            id: self.id.clone(),
            kind: self.kind.clone(),
            page_number: self.page_number,
        }
    }
}

/// The lecture's single active-event slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPointer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub page_number: i32,
}

/// Only the fields this service reads; other lecture fields are left untouched on write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lecture {
    #[serde(default)]
    pub event: Option<EventPointer>,
}

impl Lecture {
    pub fn is_active(&self, event_id: &str) -> bool {
        self.event.as_ref().is_some_and(|p| p.id == event_id)
    }
}
