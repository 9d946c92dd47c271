use crate::db::{NewPlanRecord, PlanStore, SavedPlan, UserStore};
use crate::domain::models::{DietPreference, PlanRequest, Profile, DEFAULT_PREFERRED_TIME};
use crate::domain::plan::{assemble_plan, GeneratedPlan, DAYS_IN_PLAN};
use crate::error::{AppError, ValidationError};
use crate::state::SharedState;
use crate::web::fields::{self, FieldValue};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::{Local, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Body of `POST /generate-plan`. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeneratePlanPayload {
    pub name: Option<FieldValue>,
    pub age: Option<FieldValue>,
    pub sex: Option<FieldValue>,
    pub height: Option<FieldValue>,
    pub weight: Option<FieldValue>,
    pub goal: Option<FieldValue>,
    /// Defaults to vegetarian.
    pub diet_pref: Option<FieldValue>,
    /// Defaults to 3.
    pub days_per_week: Option<FieldValue>,
    /// Defaults to "morning".
    pub preferred_time: Option<FieldValue>,
}

impl GeneratePlanPayload {
    pub fn into_request(self) -> Result<PlanRequest, ValidationError> {
        fields::ensure_present(&[
            ("name", self.name.as_ref()),
            ("age", self.age.as_ref()),
            ("sex", self.sex.as_ref()),
            ("height", self.height.as_ref()),
            ("weight", self.weight.as_ref()),
            ("goal", self.goal.as_ref()),
        ])?;

        let profile = Profile::new(
            fields::required("name", &self.name)?.text("name")?,
            fields::positive_int("age", fields::required("age", &self.age)?)?,
            &fields::required("sex", &self.sex)?.text("sex")?,
            fields::required("height", &self.height)?.number("height")?,
            fields::required("weight", &self.weight)?.number("weight")?,
        )?;
        let goal = fields::required("goal", &self.goal)?.text("goal")?;

        let mut request = PlanRequest::new(profile, &goal);

        if let Some(diet) = fields::optional(&self.diet_pref) {
            request.diet_pref = DietPreference::parse_or_default(&diet.text("diet_pref")?);
        }
        if let Some(days) = fields::optional(&self.days_per_week) {
            let days = days.integer("days_per_week")?;
            if !(0..=DAYS_IN_PLAN as i64).contains(&days) {
                return Err(ValidationError::OutOfRange { field: "days_per_week" });
            }
            request.days_per_week = days as u8;
        }
        request.preferred_time = match fields::optional(&self.preferred_time) {
            Some(time) => time.text("preferred_time")?,
            None => DEFAULT_PREFERRED_TIME.to_string(),
        };

        Ok(request)
    }
}

#[derive(Debug, Serialize)]
pub struct GeneratePlanResponse {
    pub status: &'static str,
    pub plan: GeneratedPlan,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SavePlanPayload {
    pub user_id: Option<FieldValue>,
    /// veg / nonveg
    pub plan_type: Option<FieldValue>,
    pub plan_name: Option<FieldValue>,
}

#[derive(Debug, Serialize)]
pub struct SavePlanResponse {
    pub message: &'static str,
    pub plan: SavedPlan,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/generate-plan", post(generate_plan))
        .route("/save-plan", post(save_plan))
        .with_state(state)
}

async fn generate_plan(
    State(state): State<SharedState>,
    Json(payload): Json<GeneratePlanPayload>,
) -> Result<Json<GeneratePlanResponse>, AppError> {
    let request = payload.into_request()?;

    let generated_at = Utc::now();
    let plan = {
        let mut rng = StdRng::from_entropy();
        // Meal dates follow the server's calendar day.
        assemble_plan(&request, Local::now().date_naive(), &mut rng)
    };

    // The plan is only returned once it has been stored.
    let plan_json = serde_json::to_string(&plan)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to serialize plan: {}", e)))?;
    let plan_id = state
        .plans
        .insert_plan(NewPlanRecord {
            name: plan.name.clone(),
            goal: plan.goal.clone(),
            plan_json,
            created_at: generated_at,
        })
        .await?;
    tracing::info!("Generated plan {} ({}) for {}", plan_id, plan.goal, plan.name);

    Ok(Json(GeneratePlanResponse {
        status: "success",
        plan,
    }))
}

async fn save_plan(
    State(state): State<SharedState>,
    Json(payload): Json<SavePlanPayload>,
) -> Result<(StatusCode, Json<SavePlanResponse>), AppError> {
    fields::ensure_present(&[
        ("user_id", payload.user_id.as_ref()),
        ("plan_type", payload.plan_type.as_ref()),
        ("plan_name", payload.plan_name.as_ref()),
    ])?;
    let user_id = fields::positive_int::<i64>("user_id", fields::required("user_id", &payload.user_id)?)?;
    let plan_type = fields::required("plan_type", &payload.plan_type)?.text("plan_type")?;
    let plan_name = fields::required("plan_name", &payload.plan_name)?.text("plan_name")?;

    if state.users.find_user_by_id(user_id).await?.is_none() {
        return Err(AppError::NotFound("User not found"));
    }

    let saved = state
        .plans
        .insert_saved_plan(user_id, &plan_type, &plan_name)
        .await?;
    tracing::info!("Saved plan '{}' for user {}", saved.plan_name, user_id);

    Ok((
        StatusCode::CREATED,
        Json(SavePlanResponse {
            message: "Plan saved successfully",
            plan: saved,
        }),
    ))
}
