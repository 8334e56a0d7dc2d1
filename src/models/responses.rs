use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::onboarding::{Checklist, OnboardingState};
use crate::core::progress::{GroupProgress, RatingProgress};
use crate::core::scoring::HouseScore;
use crate::models::domain::{Category, House, Household, HouseholdUser, Rating, Role, Weight};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Response for the invitation email endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInvitationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl SendInvitationResponse {
    pub fn sent(email_id: String) -> Self {
        Self {
            success: true,
            email_id: Some(email_id),
            message: None,
            mode: None,
        }
    }

    /// No email provider configured; the email was only logged
    pub fn development() -> Self {
        Self {
            success: true,
            email_id: None,
            message: Some("Email service not configured. Email logged to console.".to_string()),
            mode: Some("development".to_string()),
        }
    }
}

/// The caller's identity and, once set up, their membership
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub auth_user_id: Uuid,
    pub email: String,
    pub member: Option<HouseholdUser>,
    pub household: Option<Household>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdResponse {
    pub household: Household,
    pub members: Vec<HouseholdUser>,
    pub owner_count: usize,
    pub can_invite: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub household: Household,
    pub member: HouseholdUser,
    pub member_count: usize,
    /// Fewer members than a household is meant to have
    pub needs_members: bool,
    pub active_category_count: usize,
    pub weights_set: usize,
    pub active_house_count: usize,
    pub archived_house_count: usize,
    pub top_houses: Vec<HouseWithScore>,
    pub checklist: Checklist,
}

/// A category together with the caller's weight for it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithWeight {
    #[serde(flatten)]
    pub category: Category,
    pub weight: Option<Weight>,
    pub weight_label: &'static str,
}

/// A category together with the caller's rating of one house
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithRating {
    #[serde(flatten)]
    pub category: Category,
    pub weight: Option<Weight>,
    pub rating: Option<Rating>,
    pub rating_label: &'static str,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseWithScore {
    #[serde(flatten)]
    pub house: House,
    pub score: Option<u32>,
    pub score_label: &'static str,
    pub rated_count: usize,
    pub total_count: usize,
}

impl HouseWithScore {
    pub fn new(house: House, score: &HouseScore) -> Self {
        Self {
            house,
            score: score.overall_score,
            score_label: score.label,
            rated_count: score.rated_count,
            total_count: score.total_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseDetailResponse {
    pub house: House,
    pub score: HouseScore,
    pub progress: RatingProgress,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseRatingsResponse {
    pub house: House,
    pub categories: Vec<CategoryWithRating>,
    pub progress: RatingProgress,
    pub groups: Vec<GroupProgress>,
}

/// One member's overall score for a house
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberScore {
    pub member_id: Uuid,
    pub name: String,
    pub role: Role,
    pub overall_score: Option<u32>,
    pub label: &'static str,
    pub rated_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdScoresResponse {
    pub house_id: Uuid,
    pub members: Vec<MemberScore>,
    pub household_score: Option<u32>,
    pub household_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingResponse {
    pub state: OnboardingState,
    pub checklist: Checklist,
}

impl From<OnboardingState> for OnboardingResponse {
    fn from(state: OnboardingState) -> Self {
        let checklist = state.checklist();
        Self { state, checklist }
    }
}
