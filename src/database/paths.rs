//! Document paths shared by every client of the store.

use crate::error::{Error, Result};

pub fn course(course_id: &str) -> String {
    format!("courses/{}", course_id)
}

pub fn lecture(course_id: &str, lecture_id: &str) -> String {
    format!("courses/{}/lectures/{}", course_id, lecture_id)
}

pub fn lecture_events(course_id: &str, lecture_id: &str) -> String {
    format!("{}/lectureEvents", lecture(course_id, lecture_id))
}

pub fn lecture_event(course_id: &str, lecture_id: &str, event_id: &str) -> String {
    format!("{}/{}", lecture_events(course_id, lecture_id), event_id)
}

pub fn lecture_event_attempts(course_id: &str, lecture_id: &str, event_id: &str) -> String {
    format!("{}/attempts", lecture_event(course_id, lecture_id, event_id))
}

pub fn lecture_event_attempt(
    course_id: &str,
    lecture_id: &str,
    event_id: &str,
    user_id: &str,
) -> String {
    format!(
        "{}/{}",
        lecture_event_attempts(course_id, lecture_id, event_id),
        user_id
    )
}

pub fn assignments(course_id: &str) -> String {
    format!("courses/{}/assignments", course_id)
}

pub fn assignment(course_id: &str, quiz_id: &str) -> String {
    format!("{}/{}", assignments(course_id), quiz_id)
}

pub fn assignment_attempts(course_id: &str, quiz_id: &str) -> String {
    format!("{}/attempts", assignment(course_id, quiz_id))
}

pub fn assignment_attempt(course_id: &str, quiz_id: &str, user_id: &str) -> String {
    format!("{}/{}", assignment_attempts(course_id, quiz_id), user_id)
}

/// Collection holding the document at `path`.
pub fn parent(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

pub fn document_id(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, id)| id).unwrap_or(path)
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Ids arrive from URLs and payloads and must stay a single path segment.
pub fn check_ids(ids: &[&str]) -> Result<()> {
    for id in ids {
        if id.is_empty() || id.contains('/') || *id == "." || *id == ".." {
            return Err(Error::BadRequest(format!("invalid document id '{}'", id)));
        }
    }
    Ok(())
}

/// A caller-supplied attempt path must be the caller's own attempt document
/// for the quiz the submission was validated against.
pub fn check_attempt_path(path: &str, course_id: &str, quiz_id: &str, user_id: &str) -> Result<()> {
    if path.trim_matches('/') == assignment_attempt(course_id, quiz_id, user_id) {
        Ok(())
    } else {
        Err(Error::BadRequest(format!("'{}' is not this user's attempt for quiz {}", path, quiz_id)))
    }
}
