#[cfg(test)]
pub mod memory;

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GoalEntry {
    pub goal_id: i64,
    pub user_id: i64,
    pub goal_type: String,
    pub created_at: DateTime<Utc>,
}

/// A generated plan stored verbatim. `plan_json` is opaque to the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanRecord {
    pub id: i64,
    pub name: String,
    pub goal: String,
    pub plan_json: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPlanRecord {
    pub name: String,
    pub goal: String,
    pub plan_json: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SavedPlan {
    pub id: i64,
    pub user_id: i64,
    pub plan_type: String,
    pub plan_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<DbUser>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<DbUser>, StoreError>;
    /// Fails with `StoreError::Conflict` when the email is already registered.
    async fn insert_user(&self, user: NewUser) -> Result<DbUser, StoreError>;
    /// Returns false when no such user exists.
    async fn update_body_metrics(&self, user_id: i64, height_cm: f64, weight_kg: f64) -> Result<bool, StoreError>;
    async fn delete_user(&self, user_id: i64) -> Result<bool, StoreError>;
    /// Newest first.
    async fn list_users(&self) -> Result<Vec<DbUser>, StoreError>;
}

#[async_trait]
pub trait GoalLog: Send + Sync {
    async fn append_goal(&self, user_id: i64, goal_type: &str) -> Result<GoalEntry, StoreError>;
    async fn latest_goal(&self, user_id: i64) -> Result<Option<GoalEntry>, StoreError>;
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn insert_plan(&self, plan: NewPlanRecord) -> Result<i64, StoreError>;
    /// Newest first.
    async fn list_plans(&self) -> Result<Vec<PlanRecord>, StoreError>;
    async fn delete_plan(&self, id: i64) -> Result<bool, StoreError>;
    async fn insert_saved_plan(&self, user_id: i64, plan_type: &str, plan_name: &str) -> Result<SavedPlan, StoreError>;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<i64, StoreError>;
}

/// Postgres-backed store. Every call checks a connection out of the pool and
/// returns it when the query completes.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    match err {
        // 23505: unique_violation
        sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some("23505") => {
            StoreError::Conflict("Email exists".to_string())
        }
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<DbUser>, StoreError> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT user_id, name, email, password_hash, age, gender, height_cm, weight_kg, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<DbUser>, StoreError> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT user_id, name, email, password_hash, age, gender, height_cm, weight_kg, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> Result<DbUser, StoreError> {
        let created = sqlx::query_as::<_, DbUser>(
            r#"
            INSERT INTO users (name, email, password_hash, age, gender, height_cm, weight_kg)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING user_id, name, email, password_hash, age, gender, height_cm, weight_kg, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.age)
        .bind(&user.gender)
        .bind(user.height_cm)
        .bind(user.weight_kg)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;
        Ok(created)
    }

    async fn update_body_metrics(&self, user_id: i64, height_cm: f64, weight_kg: f64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET height_cm = $1,
                weight_kg = $2
            WHERE user_id = $3
            "#,
        )
        .bind(height_cm)
        .bind(weight_kg)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self) -> Result<Vec<DbUser>, StoreError> {
        let users = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT user_id, name, email, password_hash, age, gender, height_cm, weight_kg, created_at
            FROM users
            ORDER BY user_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}

#[async_trait]
impl GoalLog for PgStore {
    async fn append_goal(&self, user_id: i64, goal_type: &str) -> Result<GoalEntry, StoreError> {
        let entry = sqlx::query_as::<_, GoalEntry>(
            r#"
            INSERT INTO goals (user_id, goal_type)
            VALUES ($1, $2)
            RETURNING goal_id, user_id, goal_type, created_at
            "#,
        )
        .bind(user_id)
        .bind(goal_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn latest_goal(&self, user_id: i64) -> Result<Option<GoalEntry>, StoreError> {
        // goal_id breaks ties between entries written in the same instant
        let entry = sqlx::query_as::<_, GoalEntry>(
            r#"
            SELECT goal_id, user_id, goal_type, created_at
            FROM goals
            WHERE user_id = $1
            ORDER BY created_at DESC, goal_id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }
}

#[async_trait]
impl PlanStore for PgStore {
    async fn insert_plan(&self, plan: NewPlanRecord) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO personal_plans (name, goal, plan_json, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&plan.name)
        .bind(&plan.goal)
        .bind(&plan.plan_json)
        .bind(plan.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn list_plans(&self) -> Result<Vec<PlanRecord>, StoreError> {
        let plans = sqlx::query_as::<_, PlanRecord>(
            r#"
            SELECT id, name, goal, plan_json, created_at
            FROM personal_plans
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(plans)
    }

    async fn delete_plan(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM personal_plans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_saved_plan(&self, user_id: i64, plan_type: &str, plan_name: &str) -> Result<SavedPlan, StoreError> {
        let saved = sqlx::query_as::<_, SavedPlan>(
            r#"
            INSERT INTO saved_plans (user_id, plan_type, plan_name)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, plan_type, plan_name, created_at
            "#,
        )
        .bind(user_id)
        .bind(plan_type)
        .bind(plan_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}

#[async_trait]
impl FeedbackStore for PgStore {
    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO feedback (name, email, message)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&feedback.name)
        .bind(&feedback.email)
        .bind(&feedback.message)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }
}
