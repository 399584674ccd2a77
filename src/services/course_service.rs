use crate::database::{paths, DocumentStore};
use crate::error::{Error, Result};
use crate::models::course::Course;

pub async fn is_professor(store: &dyn DocumentStore, course_id: &str, user_id: &str) -> Result<bool> {
    let Some(snapshot) = store.get(&paths::course(course_id)).await? else {
        return Ok(false);
    };
    let course: Course = snapshot.decode()?;
    Ok(course.is_professor(user_id))
}

/// Fails with `not_authorized` unless `user_id` teaches the course. Callers run
/// this before touching any document.
pub async fn ensure_professor(store: &dyn DocumentStore, course_id: &str, user_id: &str) -> Result<()> {
    if is_professor(store, course_id, user_id).await? {
        Ok(())
    } else {
        tracing::warn!(course_id, user_id, "professor action refused");
        Err(Error::NotAuthorized(course_id.to_string()))
    }
}
