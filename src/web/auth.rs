use crate::db::{DbUser, GoalLog, NewUser, UserStore};
use crate::domain::models::{check_height_cm, check_weight_kg};
use crate::error::{AppError, ValidationError};
use crate::state::SharedState;
use crate::web::fields::{self, FieldValue};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupPayload {
    pub name: Option<FieldValue>,
    pub email: Option<FieldValue>,
    pub password: Option<FieldValue>,
    pub age: Option<FieldValue>,
    pub gender: Option<FieldValue>,
    pub height_cm: Option<FieldValue>,
    pub weight_kg: Option<FieldValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginPayload {
    pub email: Option<FieldValue>,
    pub password: Option<FieldValue>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub goal: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .with_state(state)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Validates a signup form; every field is required.
fn new_user_from_signup(payload: &SignupPayload) -> Result<(NewUser, String), ValidationError> {
    fields::ensure_present(&[
        ("name", payload.name.as_ref()),
        ("email", payload.email.as_ref()),
        ("password", payload.password.as_ref()),
        ("age", payload.age.as_ref()),
        ("gender", payload.gender.as_ref()),
        ("height_cm", payload.height_cm.as_ref()),
        ("weight_kg", payload.weight_kg.as_ref()),
    ])?;

    let password = fields::required("password", &payload.password)?.text("password")?;
    let user = NewUser {
        name: fields::required("name", &payload.name)?.text("name")?,
        email: normalize_email(&fields::required("email", &payload.email)?.text("email")?),
        password_hash: String::new(),
        age: Some(fields::positive_int("age", fields::required("age", &payload.age)?)?),
        gender: Some(fields::required("gender", &payload.gender)?.text("gender")?),
        height_cm: Some(check_height_cm(
            "height_cm",
            fields::required("height_cm", &payload.height_cm)?.number("height_cm")?,
        )?),
        weight_kg: Some(check_weight_kg(
            "weight_kg",
            fields::required("weight_kg", &payload.weight_kg)?.number("weight_kg")?,
        )?),
    };
    Ok((user, password))
}

/// Rejects an email that is already registered before hashing anything.
pub async fn ensure_email_free(state: &SharedState, email: &str) -> Result<(), AppError> {
    if state.users.find_user_by_email(email).await?.is_some() {
        return Err(AppError::Conflict("Email exists".to_string()));
    }
    Ok(())
}

async fn signup(
    State(state): State<SharedState>,
    Json(payload): Json<SignupPayload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (mut user, password) = new_user_from_signup(&payload)?;

    ensure_email_free(&state, &user.email).await?;
    user.password_hash = hash_password(&password)?;

    let created = state.users.insert_user(user).await?;
    tracing::info!("User {} signed up", created.user_id);

    Ok((StatusCode::CREATED, Json(json!({ "message": "Signup successful" }))))
}

async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    fields::ensure_present(&[
        ("email", payload.email.as_ref()),
        ("password", payload.password.as_ref()),
    ])?;
    let email = normalize_email(&fields::required("email", &payload.email)?.text("email")?);
    let password = fields::required("password", &payload.password)?.text("password")?;

    if !state.login_limiter.check(&email).await {
        tracing::warn!("Login rate limit exceeded for {}", email);
        return Err(AppError::RateLimited);
    }

    let user = match state.users.find_user_by_email(&email).await? {
        Some(user) if verify_password(&password, &user.password_hash) => user,
        _ => {
            tracing::warn!("Rejected login for {}", email);
            return Err(AppError::Unauthorized("Invalid credentials"));
        }
    };

    let goal = state
        .goals
        .latest_goal(user.user_id)
        .await?
        .map(|entry| entry.goal_type);

    Ok(Json(login_response(user, goal)))
}

fn login_response(user: DbUser, goal: Option<String>) -> LoginResponse {
    LoginResponse {
        user_id: user.user_id,
        name: user.name,
        email: user.email,
        age: user.age,
        gender: user.gender,
        height_cm: user.height_cm,
        weight_kg: user.weight_kg,
        goal,
    }
}
