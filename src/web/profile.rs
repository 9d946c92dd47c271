use crate::db::{GoalLog, UserStore};
use crate::domain::models::{check_height_cm, check_weight_kg, normalize_label, Profile};
use crate::domain::plan::{compute_calorie_target, compute_metrics};
use crate::error::{AppError, ValidationError};
use crate::state::SharedState;
use crate::web::fields::{self, FieldValue};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProfilePayload {
    pub user_id: Option<FieldValue>,
    pub height_cm: Option<FieldValue>,
    pub weight_kg: Option<FieldValue>,
    pub goal: Option<FieldValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserIdPayload {
    pub user_id: Option<FieldValue>,
}

#[derive(Debug, Serialize)]
pub struct GoalResponse {
    pub goal_type: Option<String>,
}

/// Metrics computed from a stored profile and its latest goal.
#[derive(Debug, Serialize)]
pub struct ProfileMetricsResponse {
    pub user: String,
    pub goal: String,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "BMR")]
    pub bmr: i64,
    #[serde(rename = "TDEE")]
    pub tdee: i64,
    pub calorie_target: i64,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/update-profile", post(update_profile))
        .route("/get-goal/:user_id", get(get_goal))
        .route("/profile-metrics", post(profile_metrics))
        .with_state(state)
}

async fn update_profile(
    State(state): State<SharedState>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<Json<Value>, AppError> {
    fields::ensure_present(&[
        ("user_id", payload.user_id.as_ref()),
        ("height_cm", payload.height_cm.as_ref()),
        ("weight_kg", payload.weight_kg.as_ref()),
        ("goal", payload.goal.as_ref()),
    ])?;
    let user_id = fields::positive_int::<i64>("user_id", fields::required("user_id", &payload.user_id)?)?;
    let height_cm = check_height_cm(
        "height_cm",
        fields::required("height_cm", &payload.height_cm)?.number("height_cm")?,
    )?;
    let weight_kg = check_weight_kg(
        "weight_kg",
        fields::required("weight_kg", &payload.weight_kg)?.number("weight_kg")?,
    )?;
    let goal = normalize_label(&fields::required("goal", &payload.goal)?.text("goal")?);

    if !state.users.update_body_metrics(user_id, height_cm, weight_kg).await? {
        return Err(AppError::NotFound("User not found"));
    }
    state.goals.append_goal(user_id, &goal).await?;
    tracing::info!("Updated profile and goal for user {}", user_id);

    Ok(Json(json!({ "message": "Profile & goal updated successfully" })))
}

async fn get_goal(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
) -> Result<Json<GoalResponse>, AppError> {
    let goal_type = state
        .goals
        .latest_goal(user_id)
        .await?
        .map(|entry| entry.goal_type);
    Ok(Json(GoalResponse { goal_type }))
}

async fn profile_metrics(
    State(state): State<SharedState>,
    Json(payload): Json<UserIdPayload>,
) -> Result<Json<ProfileMetricsResponse>, AppError> {
    let user_id = fields::positive_int::<i64>("user_id", fields::required("user_id", &payload.user_id)?)?;

    let user = state
        .users
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    let goal = state
        .goals
        .latest_goal(user_id)
        .await?
        .ok_or(ValidationError::GoalNotSet)?;

    let (Some(age), Some(height_cm), Some(weight_kg)) = (user.age, user.height_cm, user.weight_kg) else {
        let missing = [
            ("age", user.age.is_none()),
            ("height_cm", user.height_cm.is_none()),
            ("weight_kg", user.weight_kg.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();
        return Err(ValidationError::MissingFields(missing).into());
    };
    let age = u32::try_from(age).map_err(|_| ValidationError::OutOfRange { field: "age" })?;
    let profile = Profile::new(
        user.name.clone(),
        age,
        user.gender.as_deref().unwrap_or_default(),
        height_cm,
        weight_kg,
    )?;

    let goal = normalize_label(&goal.goal_type);
    let metrics = compute_metrics(&profile);

    Ok(Json(ProfileMetricsResponse {
        user: user.name,
        calorie_target: compute_calorie_target(metrics.tdee, &goal),
        goal,
        bmi: metrics.bmi,
        bmr: metrics.bmr.round_ties_even() as i64,
        tdee: metrics.tdee,
    }))
}
