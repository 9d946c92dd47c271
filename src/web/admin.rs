use crate::db::{DbUser, NewUser, PlanRecord, PlanStore, UserStore};
use crate::domain::models::{check_height_cm, check_weight_kg};
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::auth::{ensure_email_free, hash_password, normalize_email};
use crate::web::fields::{self, FieldValue};
use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
pub struct AdminUser {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub activity: Value,
    pub limitations: Value,
}

#[derive(Debug, Serialize)]
pub struct AdminPlan {
    pub id: i64,
    pub name: String,
    pub goal: String,
    pub created_at: DateTime<Utc>,
    pub plan: Value,
}

/// Profile fields may be null; the admin panel creates bare accounts.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddUserPayload {
    pub name: Option<FieldValue>,
    pub email: Option<FieldValue>,
    pub password: Option<FieldValue>,
    pub age: Option<FieldValue>,
    pub gender: Option<FieldValue>,
    pub height_cm: Option<FieldValue>,
    pub weight_kg: Option<FieldValue>,
    pub limitations: Option<Value>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/plans", get(list_plans))
        .route("/add_user", post(add_user))
        .route("/user/:id", delete(delete_user))
        .route("/plan/:id", delete(delete_plan))
        .with_state(state)
}

fn default_limitations() -> Value {
    json!({ "max_searches": 0 })
}

fn map_admin_user(user: DbUser, limitations: Value) -> AdminUser {
    AdminUser {
        user_id: user.user_id,
        name: user.name,
        email: user.email,
        age: user.age,
        gender: user.gender,
        height_cm: user.height_cm,
        weight_kg: user.weight_kg,
        created_at: user.created_at,
        activity: json!({}),
        limitations,
    }
}

fn map_admin_plan(record: PlanRecord) -> AdminPlan {
    let plan = serde_json::from_str(&record.plan_json).unwrap_or_else(|e| {
        tracing::warn!("Stored plan {} is unreadable: {}", record.id, e);
        json!({})
    });
    AdminPlan {
        id: record.id,
        name: record.name,
        goal: record.goal,
        created_at: record.created_at,
        plan,
    }
}

async fn list_users(State(state): State<SharedState>) -> Result<Json<Vec<AdminUser>>, AppError> {
    let users = state.users.list_users().await?;
    Ok(Json(
        users
            .into_iter()
            .map(|u| map_admin_user(u, default_limitations()))
            .collect(),
    ))
}

async fn list_plans(State(state): State<SharedState>) -> Result<Json<Vec<AdminPlan>>, AppError> {
    let plans = state.plans.list_plans().await?;
    Ok(Json(plans.into_iter().map(map_admin_plan).collect()))
}

async fn add_user(
    State(state): State<SharedState>,
    Json(payload): Json<AddUserPayload>,
) -> Result<Json<AdminUser>, AppError> {
    fields::ensure_present(&[
        ("name", payload.name.as_ref()),
        ("email", payload.email.as_ref()),
        ("password", payload.password.as_ref()),
    ])?;

    let email = normalize_email(&fields::required("email", &payload.email)?.text("email")?);
    ensure_email_free(&state, &email).await?;

    let password = fields::required("password", &payload.password)?.text("password")?;
    let new_user = NewUser {
        name: fields::required("name", &payload.name)?.text("name")?,
        email,
        password_hash: hash_password(&password)?,
        age: fields::optional(&payload.age)
            .map(|v| fields::positive_int("age", v))
            .transpose()?,
        gender: fields::optional(&payload.gender)
            .map(|v| v.text("gender"))
            .transpose()?,
        height_cm: fields::optional(&payload.height_cm)
            .map(|v| v.number("height_cm").and_then(|h| check_height_cm("height_cm", h)))
            .transpose()?,
        weight_kg: fields::optional(&payload.weight_kg)
            .map(|v| v.number("weight_kg").and_then(|w| check_weight_kg("weight_kg", w)))
            .transpose()?,
    };

    let created = state.users.insert_user(new_user).await?;
    tracing::info!("Admin created user {}", created.user_id);

    let limitations = payload
        .limitations
        .filter(|v| !v.is_null())
        .unwrap_or_else(default_limitations);
    Ok(Json(map_admin_user(created, limitations)))
}

async fn delete_user(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    if state.users.delete_user(id).await? {
        tracing::info!("Deleted user {}", id);
    } else {
        tracing::debug!("Delete for unknown user {}", id);
    }
    Ok(Json(json!({ "status": "deleted" })))
}

async fn delete_plan(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    if state.plans.delete_plan(id).await? {
        tracing::info!("Deleted plan {}", id);
    } else {
        tracing::debug!("Delete for unknown plan {}", id);
    }
    Ok(Json(json!({ "status": "deleted" })))
}
