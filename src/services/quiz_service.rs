use crate::database::{self, paths, Precondition, SharedStore};
use crate::error::{Error, Result};
use crate::models::exercise::Answer;
use crate::models::quiz::Quiz;
use crate::models::quiz_attempt::QuizAttempt;
use crate::services::course_service::{ensure_professor, is_professor};
use crate::services::distribution_service::{exercise_distribution, Distribution};
use crate::services::grading_service::GradingService;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizResult {
    pub attempts: u32,
    pub score: usize,
    pub total: usize,
    pub correct: Vec<bool>,
}

/// Assignment-style quizzes. `ended` and `showResultToStudents` are independent
/// flags and several quizzes of a course may be open at once.
#[derive(Clone)]
pub struct QuizService {
    store: SharedStore,
}

impl QuizService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_quiz(&self, course_id: &str, actor: &str, mut quiz: Quiz) -> Result<(String, Quiz)> {
        paths::check_ids(&[course_id])?;
        ensure_professor(self.store.as_ref(), course_id, actor).await?;
        quiz.validate()?;
        quiz.ended = false;

        let quiz_id = paths::new_id();
        self.store
            .put(
                &paths::assignment(course_id, &quiz_id),
                serde_json::to_value(&quiz)?,
                Precondition::Absent,
            )
            .await?;

        tracing::info!(course_id, quiz_id = %quiz_id, exercises = quiz.exercises.len(), "Quiz created");
        Ok((quiz_id, quiz))
    }

    pub async fn get_quiz(&self, course_id: &str, quiz_id: &str) -> Result<Quiz> {
        paths::check_ids(&[course_id, quiz_id])?;
        database::get_as(self.store.as_ref(), &paths::assignment(course_id, quiz_id)).await
    }

    async fn update_flag(&self, course_id: &str, quiz_id: &str, actor: &str, field: &str, value: bool) -> Result<Quiz> {
        paths::check_ids(&[course_id, quiz_id])?;
        ensure_professor(self.store.as_ref(), course_id, actor).await?;

        let path = paths::assignment(course_id, quiz_id);
        let (quiz, _) = database::transaction(self.store.as_ref(), &path, |current| {
            let snapshot = current.ok_or_else(|| Error::NotFound(path.clone()))?;
            let mut data = snapshot.data.clone();
            data.as_object_mut()
                .ok_or_else(|| Error::Store(format!("document {} is not an object", path)))?
                .insert(field.to_string(), serde_json::Value::Bool(value));
            let quiz: Quiz = serde_json::from_value(data.clone())?;
            Ok((data, quiz))
        })
        .await?;

        tracing::info!(course_id, quiz_id, field, value, "Quiz flag updated");
        Ok(quiz)
    }

    pub async fn set_show_results(&self, course_id: &str, quiz_id: &str, actor: &str, show: bool) -> Result<Quiz> {
        self.update_flag(course_id, quiz_id, actor, "showResultToStudents", show)
            .await
    }

    /// Stops accepting submissions. Ending twice is a no-op.
    pub async fn end_quiz(&self, course_id: &str, quiz_id: &str, actor: &str) -> Result<Quiz> {
        self.update_flag(course_id, quiz_id, actor, "ended", true).await
    }

    /// Scores `user_id`'s attempt. Students may only read their own result,
    /// and only once the professor shows results.
    pub async fn quiz_result(&self, course_id: &str, quiz_id: &str, user_id: &str, actor: &str) -> Result<QuizResult> {
        paths::check_ids(&[course_id, quiz_id, user_id])?;
        let quiz = self.get_quiz(course_id, quiz_id).await?;

        if !is_professor(self.store.as_ref(), course_id, actor).await?
            && (actor != user_id || !quiz.show_result_to_students)
        {
            return Err(Error::NotAuthorized(course_id.to_string()));
        }

        let attempt: QuizAttempt = database::get_as(
            self.store.as_ref(),
            &paths::assignment_attempt(course_id, quiz_id, user_id),
        )
        .await?;
        let graded = GradingService::grade(&attempt.answers, &quiz.answers)?;

        Ok(QuizResult {
            attempts: attempt.attempts,
            score: graded.score,
            total: graded.total,
            correct: graded.correct,
        })
    }

    /// Per-exercise answer distributions over every stored attempt.
    pub async fn distributions(&self, course_id: &str, quiz_id: &str, actor: &str) -> Result<Vec<Distribution>> {
        let quiz = self.get_quiz(course_id, quiz_id).await?;
        if !quiz.show_result_to_students && !is_professor(self.store.as_ref(), course_id, actor).await? {
            return Err(Error::NotAuthorized(course_id.to_string()));
        }

        let mut per_exercise: Vec<Vec<Answer>> = vec![Vec::new(); quiz.exercises.len()];
        for snapshot in self.store.list(&paths::assignment_attempts(course_id, quiz_id)).await? {
            let attempt: QuizAttempt = match snapshot.decode() {
                Ok(attempt) => attempt,
                Err(e) => {
                    tracing::warn!(path = %snapshot.path, error = %e, "Skipping unreadable attempt");
                    continue;
                }
            };
            if attempt.answers.len() != quiz.exercises.len() {
                tracing::warn!(path = %snapshot.path, "Skipping attempt with a different exercise count");
                continue;
            }
            for (bucket, answer) in per_exercise.iter_mut().zip(attempt.answers) {
                bucket.push(answer);
            }
        }

        Ok(quiz
            .exercises
            .iter()
            .zip(&per_exercise)
            .map(|(exercise, answers)| exercise_distribution(exercise, answers))
            .collect())
    }
}
