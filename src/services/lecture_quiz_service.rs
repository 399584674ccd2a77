use crate::database::{self, paths, SharedStore, Snapshot, Subscription};
use crate::error::{Error, Result};
use crate::models::exercise::{Answer, Exercise};
use crate::models::lecture::{EventKind, EventPointer, Lecture, LectureEvent, LectureQuiz};
use crate::models::quiz_attempt::QuizAttempt;
use crate::services::course_service::{ensure_professor, is_professor};
use crate::services::distribution_service::{exercise_distribution, Distribution};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// Where a lecture quiz stands, derived from its event and the lecture's
/// active-event pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizState {
    Pending,
    Broadcast,
    ResultVisible,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizAction {
    Select,
    ShowResults(bool),
    End,
}

impl QuizState {
    pub fn of(event: &LectureEvent, lecture: &Lecture) -> Self {
        if event.done {
            return QuizState::Ended;
        }
        let shown = event
            .quiz_model
            .as_ref()
            .is_some_and(|quiz| quiz.show_result_to_students);
        match (lecture.is_active(&event.id), shown) {
            (false, _) => QuizState::Pending,
            (true, false) => QuizState::Broadcast,
            (true, true) => QuizState::ResultVisible,
        }
    }

    /// The state after `action`. `results_shown` is the result flag before
    /// the action; it survives leaving and re-entering the active slot.
    pub fn next(self, action: QuizAction, results_shown: bool) -> Result<Self> {
        use QuizAction::*;
        use QuizState::*;

        let live = |shown: bool| if shown { ResultVisible } else { Broadcast };
        match (self, action) {
            (Ended, _) => Err(Error::InvalidTransition(
                "an ended quiz cannot change".to_string(),
            )),
            (Pending, Select) => Ok(live(results_shown)),
            (Broadcast | ResultVisible, Select) => Ok(self),
            (Pending, ShowResults(_)) => Ok(Pending),
            (Broadcast | ResultVisible, ShowResults(shown)) => Ok(live(shown)),
            (Broadcast | ResultVisible, End) => Ok(Ended),
            (Pending, End) => Err(Error::InvalidTransition(
                "only a broadcast quiz can be ended".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizPools {
    pub active: Option<LectureEvent>,
    pub pending: Vec<LectureEvent>,
    pub ended: Vec<LectureEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiveResults {
    pub event_id: String,
    pub state: QuizState,
    pub attempts: usize,
    pub distribution: Distribution,
}

fn object_mut<'a>(value: &'a mut JsonValue, path: &str) -> Result<&'a mut Map<String, JsonValue>> {
    value
        .as_object_mut()
        .ok_or_else(|| Error::Store(format!("document {} is not an object", path)))
}

fn quiz_model_mut<'a>(value: &'a mut JsonValue, path: &str) -> Result<&'a mut Map<String, JsonValue>> {
    object_mut(value, path)?
        .get_mut("quizModel")
        .and_then(JsonValue::as_object_mut)
        .ok_or_else(|| Error::Store(format!("event {} has no quiz model", path)))
}

fn existing<'a>(snapshot: Option<&'a Snapshot>, path: &str) -> Result<&'a Snapshot> {
    snapshot.ok_or_else(|| Error::NotFound(path.to_string()))
}

/// Lifecycle of quizzes embedded in a lecture. The lecture's `event` field is
/// the single active slot; every change to it goes through a versioned
/// read-check-write, so concurrent professor sessions cannot both win.
#[derive(Clone)]
pub struct LectureQuizService {
    store: SharedStore,
}

impl LectureQuizService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_quiz(
        &self,
        course_id: &str,
        lecture_id: &str,
        actor: &str,
        page_number: i32,
        exercise: Exercise,
        answer: Answer,
    ) -> Result<LectureEvent> {
        paths::check_ids(&[course_id, lecture_id])?;
        ensure_professor(self.store.as_ref(), course_id, actor).await?;
        let quiz = LectureQuiz::new(exercise, answer)?;

        let lecture_path = paths::lecture(course_id, lecture_id);
        if self.store.get(&lecture_path).await?.is_none() {
            return Err(Error::NotFound(lecture_path));
        }

        let event = LectureEvent {
            id: paths::new_id(),
            kind: EventKind::Quiz,
            page_number,
            done: false,
            quiz_model: Some(quiz),
        };
        let path = paths::lecture_event(course_id, lecture_id, &event.id);
        self.store
            .put(&path, serde_json::to_value(&event)?, database::Precondition::Absent)
            .await?;

        tracing::info!(course_id, lecture_id, event_id = %event.id, "Lecture quiz created");
        Ok(event)
    }

    async fn lecture(&self, course_id: &str, lecture_id: &str) -> Result<Lecture> {
        database::get_as(self.store.as_ref(), &paths::lecture(course_id, lecture_id)).await
    }

    async fn quiz_event(&self, course_id: &str, lecture_id: &str, event_id: &str) -> Result<LectureEvent> {
        let event: LectureEvent = database::get_as(
            self.store.as_ref(),
            &paths::lecture_event(course_id, lecture_id, event_id),
        )
        .await?;
        event.quiz()?;
        Ok(event)
    }

    pub async fn state(&self, course_id: &str, lecture_id: &str, event_id: &str) -> Result<QuizState> {
        paths::check_ids(&[course_id, lecture_id, event_id])?;
        let lecture = self.lecture(course_id, lecture_id).await?;
        let event = self.quiz_event(course_id, lecture_id, event_id).await?;
        Ok(QuizState::of(&event, &lecture))
    }

    /// Makes the quiz the lecture's active event, replacing whatever was there.
    /// Returns the pointer it replaced.
    pub async fn select(
        &self,
        course_id: &str,
        lecture_id: &str,
        event_id: &str,
        actor: &str,
    ) -> Result<Option<EventPointer>> {
        paths::check_ids(&[course_id, lecture_id, event_id])?;
        ensure_professor(self.store.as_ref(), course_id, actor).await?;
        let event = self.quiz_event(course_id, lecture_id, event_id).await?;
        let shown = event.quiz()?.show_result_to_students;
        let pointer = serde_json::to_value(event.pointer())?;

        let lecture_path = paths::lecture(course_id, lecture_id);
        let (previous, _) = database::transaction(self.store.as_ref(), &lecture_path, |current| {
            let snapshot = existing(current, &lecture_path)?;
            let lecture: Lecture = snapshot.decode()?;
            QuizState::of(&event, &lecture).next(QuizAction::Select, shown)?;

            let mut data = snapshot.data.clone();
            object_mut(&mut data, &lecture_path)?.insert("event".to_string(), pointer.clone());
            Ok((data, lecture.event))
        })
        .await?;

        // An end that committed after the event was read already ran its
        // release, so the pointer just written would outlive the quiz.
        let latest = self.quiz_event(course_id, lecture_id, event_id).await?;
        if latest.done {
            self.release_slot(course_id, lecture_id, Some(event_id)).await?;
            tracing::warn!(course_id, lecture_id, event_id, "Quiz ended while being selected");
            return Err(Error::InvalidTransition(
                "an ended quiz cannot change".to_string(),
            ));
        }

        tracing::info!(
            course_id,
            lecture_id,
            event_id,
            replaced = ?previous.as_ref().map(|p| &p.id),
            "Lecture quiz is now broadcast"
        );
        Ok(previous)
    }

    pub async fn set_show_results(
        &self,
        course_id: &str,
        lecture_id: &str,
        event_id: &str,
        actor: &str,
        show: bool,
    ) -> Result<LectureEvent> {
        paths::check_ids(&[course_id, lecture_id, event_id])?;
        ensure_professor(self.store.as_ref(), course_id, actor).await?;
        let lecture = self.lecture(course_id, lecture_id).await?;

        let event_path = paths::lecture_event(course_id, lecture_id, event_id);
        let (event, _) = database::transaction(self.store.as_ref(), &event_path, |current| {
            let snapshot = existing(current, &event_path)?;
            let mut event: LectureEvent = snapshot.decode()?;
            let shown = event.quiz()?.show_result_to_students;
            QuizState::of(&event, &lecture).next(QuizAction::ShowResults(show), shown)?;

            let mut data = snapshot.data.clone();
            quiz_model_mut(&mut data, &event_path)?
                .insert("showResultToStudents".to_string(), JsonValue::Bool(show));
            if let Some(quiz) = event.quiz_model.as_mut() {
                quiz.show_result_to_students = show;
            }
            Ok((data, event))
        })
        .await?;

        tracing::info!(course_id, lecture_id, event_id, show, "Lecture quiz results visibility changed");
        Ok(event)
    }

    /// Marks the quiz done and frees the active slot if it still holds it.
    /// Clients watching the event leave once they observe `done`.
    pub async fn end(
        &self,
        course_id: &str,
        lecture_id: &str,
        event_id: &str,
        actor: &str,
    ) -> Result<LectureEvent> {
        paths::check_ids(&[course_id, lecture_id, event_id])?;
        ensure_professor(self.store.as_ref(), course_id, actor).await?;
        let lecture = self.lecture(course_id, lecture_id).await?;

        let event_path = paths::lecture_event(course_id, lecture_id, event_id);
        let (event, _) = database::transaction(self.store.as_ref(), &event_path, |current| {
            let snapshot = existing(current, &event_path)?;
            let mut event: LectureEvent = snapshot.decode()?;
            let shown = event.quiz()?.show_result_to_students;
            QuizState::of(&event, &lecture).next(QuizAction::End, shown)?;

            let mut data = snapshot.data.clone();
            object_mut(&mut data, &event_path)?.insert("done".to_string(), JsonValue::Bool(true));
            quiz_model_mut(&mut data, &event_path)?.insert("ended".to_string(), JsonValue::Bool(true));
            event.done = true;
            if let Some(quiz) = event.quiz_model.as_mut() {
                quiz.ended = true;
            }
            Ok((data, event))
        })
        .await?;

        self.release_slot(course_id, lecture_id, Some(event_id)).await?;
        tracing::info!(course_id, lecture_id, event_id, "Lecture quiz ended");
        Ok(event)
    }

    /// Empties the active slot without ending anything.
    pub async fn clear_active(
        &self,
        course_id: &str,
        lecture_id: &str,
        actor: &str,
    ) -> Result<Option<EventPointer>> {
        paths::check_ids(&[course_id, lecture_id])?;
        ensure_professor(self.store.as_ref(), course_id, actor).await?;
        self.release_slot(course_id, lecture_id, None).await
    }

    /// Clears the lecture pointer, only if it points at `only_if` when given.
    async fn release_slot(
        &self,
        course_id: &str,
        lecture_id: &str,
        only_if: Option<&str>,
    ) -> Result<Option<EventPointer>> {
        let lecture_path = paths::lecture(course_id, lecture_id);
        let (released, _) = database::transaction(self.store.as_ref(), &lecture_path, |current| {
            let snapshot = existing(current, &lecture_path)?;
            let lecture: Lecture = snapshot.decode()?;
            let mut data = snapshot.data.clone();

            let matches = match (&lecture.event, only_if) {
                (Some(_), None) => true,
                (Some(pointer), Some(id)) => pointer.id == id,
                (None, _) => false,
            };
            if !matches {
                return Ok((data, None));
            }
            object_mut(&mut data, &lecture_path)?.insert("event".to_string(), JsonValue::Null);
            Ok((data, lecture.event))
        })
        .await?;
        Ok(released)
    }

    pub async fn pools(&self, course_id: &str, lecture_id: &str, actor: &str) -> Result<QuizPools> {
        paths::check_ids(&[course_id, lecture_id])?;
        ensure_professor(self.store.as_ref(), course_id, actor).await?;
        let lecture = self.lecture(course_id, lecture_id).await?;

        let mut pools = QuizPools {
            active: None,
            pending: Vec::new(),
            ended: Vec::new(),
        };
        for snapshot in self
            .store
            .list(&paths::lecture_events(course_id, lecture_id))
            .await?
        {
            let event: LectureEvent = match snapshot.decode() {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(path = %snapshot.path, error = %e, "Skipping unreadable lecture event");
                    continue;
                }
            };
            if event.kind != EventKind::Quiz {
                continue;
            }
            match QuizState::of(&event, &lecture) {
                QuizState::Ended => pools.ended.push(event),
                QuizState::Pending => pools.pending.push(event),
                QuizState::Broadcast | QuizState::ResultVisible => pools.active = Some(event),
            }
        }
        Ok(pools)
    }

    /// Aggregated answers for the quiz. Students only see them while the
    /// professor shows results.
    pub async fn results(
        &self,
        course_id: &str,
        lecture_id: &str,
        event_id: &str,
        actor: &str,
    ) -> Result<LiveResults> {
        paths::check_ids(&[course_id, lecture_id, event_id])?;
        let lecture = self.lecture(course_id, lecture_id).await?;
        let event = self.quiz_event(course_id, lecture_id, event_id).await?;
        let quiz = event.quiz()?;

        if !quiz.show_result_to_students && !is_professor(self.store.as_ref(), course_id, actor).await? {
            return Err(Error::NotAuthorized(course_id.to_string()));
        }

        let attempts = self
            .store
            .list(&paths::lecture_event_attempts(course_id, lecture_id, event_id))
            .await?;
        let answers: Vec<Answer> = attempts
            .iter()
            .filter_map(|snapshot| match snapshot.decode::<QuizAttempt>() {
                Ok(attempt) => attempt.answers.into_iter().next(),
                Err(e) => {
                    tracing::warn!(path = %snapshot.path, error = %e, "Skipping unreadable attempt");
                    None
                }
            })
            .collect();

        Ok(LiveResults {
            event_id: event.id.clone(),
            state: QuizState::of(&event, &lecture),
            attempts: answers.len(),
            distribution: exercise_distribution(&quiz.exercise, &answers),
        })
    }

    pub async fn watch_lecture(&self, course_id: &str, lecture_id: &str) -> Result<Subscription> {
        paths::check_ids(&[course_id, lecture_id])?;
        self.store.subscribe(&paths::lecture(course_id, lecture_id)).await
    }

    pub async fn watch_event(&self, course_id: &str, lecture_id: &str, event_id: &str) -> Result<Subscription> {
        paths::check_ids(&[course_id, lecture_id, event_id])?;
        self.store
            .subscribe(&paths::lecture_event(course_id, lecture_id, event_id))
            .await
    }
}
