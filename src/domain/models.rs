use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const MAX_AGE: u32 = 150;
pub const HEIGHT_CM_RANGE: RangeInclusive<f64> = 50.0..=300.0;
pub const WEIGHT_KG_RANGE: RangeInclusive<f64> = 2.0..=700.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    WeightLoss,
    MuscleGain,
    GeneralFitness,
}

impl Goal {
    /// Exact match after trimming and lower-casing. No fuzzy matching.
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "weight loss" => Some(Goal::WeightLoss),
            "muscle gain" => Some(Goal::MuscleGain),
            "general fitness" => Some(Goal::GeneralFitness),
            _ => None,
        }
    }

    pub fn calorie_offset(&self) -> i64 {
        match self {
            Goal::WeightLoss => -300,
            Goal::MuscleGain => 300,
            Goal::GeneralFitness => 0,
        }
    }

    pub fn workout_pool(&self) -> &'static [&'static str] {
        match self {
            Goal::WeightLoss => &["HIIT", "Brisk Walk", "Cycling"],
            Goal::MuscleGain => &["Push Pull Legs", "Upper Lower", "Full Body"],
            Goal::GeneralFitness => &["Mixed Cardio", "Mobility + Core"],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DietPreference {
    #[default]
    Vegetarian,
    NonVegetarian,
}

impl DietPreference {
    /// Unrecognised values fall back to the vegetarian pool.
    pub fn parse_or_default(raw: &str) -> Self {
        match normalize_label(raw).as_str() {
            "non-vegetarian" => DietPreference::NonVegetarian,
            _ => DietPreference::Vegetarian,
        }
    }

    pub fn meal_pool(&self) -> &'static [&'static str] {
        match self {
            DietPreference::Vegetarian => &["Dal Rice", "Paneer Bowl", "Veg Upma"],
            DietPreference::NonVegetarian => &["Chicken Rice", "Egg Omelette", "Fish Curry"],
        }
    }
}

/// Only the literal "male" takes the male BMR offset; every other value takes the female one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Other,
}

impl Sex {
    pub fn from_label(raw: &str) -> Self {
        if normalize_label(raw) == "male" {
            Sex::Male
        } else {
            Sex::Other
        }
    }

    pub fn bmr_offset(&self) -> f64 {
        match self {
            Sex::Male => 5.0,
            Sex::Other => -161.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub age: u32,
    /// Normalised (trimmed, lower-case) label as supplied.
    pub sex: String,
    pub height_cm: f64,
    pub weight_kg: f64,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        age: u32,
        sex: &str,
        height_cm: f64,
        weight_kg: f64,
    ) -> Result<Self, ValidationError> {
        if age == 0 || age > MAX_AGE {
            return Err(ValidationError::OutOfRange { field: "age" });
        }
        let height_cm = check_height_cm("height", height_cm)?;
        let weight_kg = check_weight_kg("weight", weight_kg)?;
        Ok(Self {
            name: name.into(),
            age,
            sex: normalize_label(sex),
            height_cm,
            weight_kg,
        })
    }

    pub fn sex(&self) -> Sex {
        Sex::from_label(&self.sex)
    }
}

/// Bounds keep every derived metric finite and within `i64`.
pub fn check_height_cm(field: &'static str, height_cm: f64) -> Result<f64, ValidationError> {
    if HEIGHT_CM_RANGE.contains(&height_cm) {
        Ok(height_cm)
    } else {
        Err(ValidationError::OutOfRange { field })
    }
}

pub fn check_weight_kg(field: &'static str, weight_kg: f64) -> Result<f64, ValidationError> {
    if WEIGHT_KG_RANGE.contains(&weight_kg) {
        Ok(weight_kg)
    } else {
        Err(ValidationError::OutOfRange { field })
    }
}

pub const DEFAULT_DAYS_PER_WEEK: u8 = 3;
pub const DEFAULT_PREFERRED_TIME: &str = "morning";

#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub profile: Profile,
    /// Normalised goal text. Unrecognised goals are kept verbatim.
    pub goal: String,
    pub diet_pref: DietPreference,
    pub days_per_week: u8,
    pub preferred_time: String,
}

impl PlanRequest {
    pub fn new(profile: Profile, goal: &str) -> Self {
        Self {
            profile,
            goal: normalize_label(goal),
            diet_pref: DietPreference::default(),
            days_per_week: DEFAULT_DAYS_PER_WEEK,
            preferred_time: DEFAULT_PREFERRED_TIME.to_string(),
        }
    }
}

pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}
