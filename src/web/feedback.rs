use crate::db::{FeedbackStore, NewFeedback};
use crate::error::{AppError, ValidationError};
use crate::state::SharedState;
use crate::web::auth::normalize_email;
use crate::web::fields::{self, FieldValue};
use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

const MAX_FEEDBACK_CHARS: usize = 5000;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeedbackPayload {
    pub name: Option<FieldValue>,
    pub email: Option<FieldValue>,
    pub feedback: Option<FieldValue>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/feedback", post(submit_feedback))
        .with_state(state)
}

async fn submit_feedback(
    State(state): State<SharedState>,
    Json(payload): Json<FeedbackPayload>,
) -> Result<Json<Value>, AppError> {
    fields::ensure_present(&[
        ("name", payload.name.as_ref()),
        ("email", payload.email.as_ref()),
        ("feedback", payload.feedback.as_ref()),
    ])?;
    let message = fields::required("feedback", &payload.feedback)?.text("feedback")?;
    if message.chars().count() > MAX_FEEDBACK_CHARS {
        return Err(ValidationError::OutOfRange { field: "feedback" }.into());
    }

    let id = state
        .feedback
        .insert_feedback(NewFeedback {
            name: fields::required("name", &payload.name)?.text("name")?,
            email: normalize_email(&fields::required("email", &payload.email)?.text("email")?),
            message,
        })
        .await?;
    tracing::info!("Stored feedback {}", id);

    Ok(Json(json!({ "status": "success" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::{send, TestApp};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_submit_feedback() {
        let app = TestApp::new();
        let (status, body) = send(
            app.router(),
            Method::POST,
            "/api/feedback",
            Some(json!({ "name": "Asha", "email": "asha@example.com", "feedback": "Love the meal plans" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(app.store.feedback_count().await, 1);
    }

    #[tokio::test]
    async fn test_feedback_validation() {
        let app = TestApp::new();
        let (status, body) = send(
            app.router(),
            Method::POST,
            "/api/feedback",
            Some(json!({ "name": "Asha", "feedback": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: email, feedback");

        let (status, _) = send(
            app.router(),
            Method::POST,
            "/api/feedback",
            Some(json!({ "name": "Asha", "email": "a@example.com", "feedback": "x".repeat(5001) })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.store.feedback_count().await, 0);
    }
}
