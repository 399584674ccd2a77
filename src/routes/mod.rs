pub mod functions;
pub mod generate;
pub mod health;
pub mod lectures;
pub mod quizzes;

use crate::middleware::auth::require_bearer_auth;
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Every route of the service. `/health` is open; everything under `/api`
/// requires a bearer token.
pub fn api_router(state: AppState) -> Router {
    let functions_api = Router::new()
        .route(
            "/api/functions/createQuizAttempt",
            post(functions::create_quiz_attempt),
        )
        .route(
            "/api/functions/createLectureQuizAttempt",
            post(functions::create_lecture_quiz_attempt),
        );

    let lectures_api = Router::new()
        .route(
            "/api/courses/:course_id/lectures/:lecture_id/quizzes",
            get(lectures::list_quizzes).post(lectures::create_quiz),
        )
        .route(
            "/api/courses/:course_id/lectures/:lecture_id/active",
            axum::routing::delete(lectures::clear_active),
        )
        .route(
            "/api/courses/:course_id/lectures/:lecture_id/quizzes/:event_id/select",
            post(lectures::select_quiz),
        )
        .route(
            "/api/courses/:course_id/lectures/:lecture_id/quizzes/:event_id/show-results",
            post(lectures::show_results),
        )
        .route(
            "/api/courses/:course_id/lectures/:lecture_id/quizzes/:event_id/end",
            post(lectures::end_quiz),
        )
        .route(
            "/api/courses/:course_id/lectures/:lecture_id/quizzes/:event_id/results",
            get(lectures::quiz_results),
        );

    let quizzes_api = Router::new()
        .route("/api/courses/:course_id/quizzes", post(quizzes::create_quiz))
        .route(
            "/api/courses/:course_id/quizzes/:quiz_id/show-results",
            post(quizzes::show_results),
        )
        .route(
            "/api/courses/:course_id/quizzes/:quiz_id/end",
            post(quizzes::end_quiz),
        )
        .route(
            "/api/courses/:course_id/quizzes/:quiz_id/result",
            get(quizzes::quiz_result),
        )
        .route(
            "/api/courses/:course_id/quizzes/:quiz_id/distributions",
            get(quizzes::quiz_distributions),
        );

    let generate_api = Router::new()
        .route(
            "/api/courses/:course_id/generate/quiz",
            post(generate::generate_quiz),
        )
        .route(
            "/api/courses/:course_id/generate/flashcards",
            post(generate::generate_flashcards),
        );

    let authed = functions_api
        .merge(lectures_api)
        .merge(quizzes_api)
        .merge(generate_api)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_bearer_auth,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(authed)
        .with_state(state)
}
