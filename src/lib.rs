//! HouseRater - house-shopping backend for households
//!
//! Members of a household weight rating categories by personal importance, rate the
//! houses they visit, and get a weighted match score per house.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{overall_score, score_label, HouseScore, Scorer};
pub use error::ApiError;
pub use models::{Category, House, Household, HouseholdUser, Rating, Weight};
pub use routes::{configure_routes, AppState};
