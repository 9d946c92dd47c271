pub mod models;
pub mod plan;
