//! Body-composition metrics and weekly plan assembly.
//!
//! Metrics are a pure function of the profile. Schedules draw from an injected
//! random source and the meal calendar starts from a caller-supplied date, so a
//! seeded generator plus a fixed date reproduces a plan exactly.

use crate::domain::models::{DietPreference, Goal, PlanRequest, Profile};
use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Single fixed activity multiplier applied to BMR.
pub const ACTIVITY_FACTOR: f64 = 1.375;
pub const DAYS_IN_PLAN: usize = 7;
pub const MIN_WORKOUT_MINUTES: u32 = 30;
pub const MAX_WORKOUT_MINUTES: u32 = 60;
pub const MEAL_CALORIES: u32 = 500;
pub const MEAL_LABEL: &str = "Meal";
pub const PLAN_NOTES: &str = "This is an auto-generated plan. Adjust based on recovery.";

pub const HABITS: [&str; 4] = [
    "Drink 2–3L water daily",
    "Sleep 7–8 hours",
    "Warm up before workouts",
    "Stretch after exercise",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub bmi: f64,
    pub bmr: f64,
    pub tdee: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Workout,
    Recovery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub day_index: u8,
    #[serde(rename = "type")]
    pub day_type: DayType,
    pub name: String,
    pub duration_min: u32,
    pub intensity: Intensity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub when: String,
    pub item: String,
    pub cal: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealDay {
    pub date: NaiveDate,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressGuidelines {
    pub weight: String,
    pub strength: String,
    pub recovery: String,
}

impl Default for ProgressGuidelines {
    fn default() -> Self {
        Self {
            weight: "Track weekly".to_string(),
            strength: "Increase gradually".to_string(),
            recovery: "Rest when needed".to_string(),
        }
    }
}

/// Immutable once produced. Field names match the JSON the frontend renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPlan {
    pub name: String,
    pub age: u32,
    pub sex: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "BMR_kcal")]
    pub bmr_kcal: i64,
    #[serde(rename = "TDEE_kcal")]
    pub tdee_kcal: i64,
    pub calorie_target_kcal: i64,
    pub goal: String,
    pub diet_pref: DietPreference,
    pub days_per_week: u8,
    pub preferred_time: String,
    pub weekly_workouts: Vec<WorkoutDay>,
    pub weekly_meals: Vec<MealDay>,
    pub habits: Vec<String>,
    pub weekly_progress_guidelines: ProgressGuidelines,
    pub notes: String,
}

/// BMI, Mifflin-St Jeor BMR and TDEE for a validated profile.
pub fn compute_metrics(profile: &Profile) -> Metrics {
    let height_m = profile.height_cm / 100.0;
    let bmi = round_to_tenth(profile.weight_kg / (height_m * height_m));

    let bmr = 10.0 * profile.weight_kg + 6.25 * profile.height_cm - 5.0 * f64::from(profile.age)
        + profile.sex().bmr_offset();

    let tdee = (bmr * ACTIVITY_FACTOR).floor() as i64;

    Metrics { bmi, bmr, tdee }
}

/// Only "weight loss" and "muscle gain" shift the target; anything else keeps TDEE.
pub fn compute_calorie_target(tdee: i64, goal: &str) -> i64 {
    tdee.saturating_add(Goal::parse(goal).map(|g| g.calorie_offset()).unwrap_or(0))
}

/// Days `0..days_per_week` train, the rest recover. Names repeat freely.
pub fn generate_weekly_workouts<R>(goal: &str, days_per_week: u8, rng: &mut R) -> Vec<WorkoutDay>
where
    R: Rng + ?Sized,
{
    let pool = Goal::parse(goal)
        .unwrap_or(Goal::GeneralFitness)
        .workout_pool();

    (0..DAYS_IN_PLAN as u8)
        .map(|day_index| WorkoutDay {
            day_index,
            day_type: if day_index < days_per_week {
                DayType::Workout
            } else {
                DayType::Recovery
            },
            name: pick(pool, rng),
            duration_min: rng.gen_range(MIN_WORKOUT_MINUTES..=MAX_WORKOUT_MINUTES),
            intensity: Intensity::Moderate,
        })
        .collect()
}

pub fn generate_weekly_meals<R>(diet_pref: DietPreference, start_date: NaiveDate, rng: &mut R) -> Vec<MealDay>
where
    R: Rng + ?Sized,
{
    let pool = diet_pref.meal_pool();

    (0..DAYS_IN_PLAN as i64)
        .map(|offset| MealDay {
            date: start_date + Duration::days(offset),
            meals: vec![Meal {
                when: MEAL_LABEL.to_string(),
                item: pick(pool, rng),
                cal: MEAL_CALORIES,
            }],
        })
        .collect()
}

/// Everything is computed in memory; the caller decides what to persist.
pub fn assemble_plan<R>(request: &PlanRequest, today: NaiveDate, rng: &mut R) -> GeneratedPlan
where
    R: Rng + ?Sized,
{
    let profile = &request.profile;
    let metrics = compute_metrics(profile);
    let calorie_target = compute_calorie_target(metrics.tdee, &request.goal);
    let weekly_workouts = generate_weekly_workouts(&request.goal, request.days_per_week, rng);
    let weekly_meals = generate_weekly_meals(request.diet_pref, today, rng);

    GeneratedPlan {
        name: profile.name.clone(),
        age: profile.age,
        sex: profile.sex.clone(),
        weight_kg: profile.weight_kg,
        height_cm: profile.height_cm,
        bmi: metrics.bmi,
        bmr_kcal: metrics.bmr.round_ties_even() as i64,
        tdee_kcal: metrics.tdee,
        calorie_target_kcal: calorie_target,
        goal: request.goal.clone(),
        diet_pref: request.diet_pref,
        days_per_week: request.days_per_week,
        preferred_time: request.preferred_time.clone(),
        weekly_workouts,
        weekly_meals,
        habits: HABITS.iter().map(|h| h.to_string()).collect(),
        weekly_progress_guidelines: ProgressGuidelines::default(),
        notes: PLAN_NOTES.to_string(),
    }
}

fn pick<R>(pool: &[&str], rng: &mut R) -> String
where
    R: Rng + ?Sized,
{
    // Pools are static and never empty.
    pool.choose(rng).copied().unwrap_or_default().to_string()
}

/// Halves go to the even neighbour.
fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
