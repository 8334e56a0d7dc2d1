use crate::models::domain::{CategoryGroup, PropertyType, Rating, Role, Weight};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request to create a household with the caller as first owner
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateHouseholdRequest {
    #[validate(length(min = 1, max = 100, message = "Household name is required"))]
    pub household_name: String,
    #[validate(length(min = 1, max = 100, message = "Your name is required"))]
    pub user_name: String,
}

/// Request to invite a new household member
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InviteMemberRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Member
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Category name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_group")]
    pub group: CategoryGroup,
}

fn default_group() -> CategoryGroup {
    CategoryGroup::Custom
}

/// Partial category update; absent fields are left as they are
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Category name is required"))]
    pub name: Option<String>,
    /// Absent leaves the description alone; `null` or blank clears it
    #[serde(default, deserialize_with = "present_field")]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl UpdateCategoryRequest {
    pub fn clears_description(&self) -> bool {
        matches!(self.description, Some(None))
    }
}

/// Distinguish a field sent as `null` from a field left out
fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetWeightRequest {
    pub weight: Weight,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightInput {
    pub category_id: Uuid,
    pub weight: Weight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetWeightsRequest {
    pub weights: Vec<WeightInput>,
}

/// House fields for create and update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HouseForm {
    #[serde(default)]
    pub nickname: Option<String>,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[validate(range(min = 0.0, message = "Price must be a valid positive number"))]
    #[serde(default)]
    pub price: Option<f64>,
    #[validate(range(min = 0, max = 20, message = "Bedrooms must be between 0 and 20"))]
    #[serde(default)]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0.0, max = 10.0, message = "Bathrooms must be between 0 and 10"))]
    #[serde(default)]
    pub bathrooms: Option<f64>,
    #[validate(range(min = 0, message = "Square feet must be a valid positive number"))]
    #[serde(default)]
    pub square_feet: Option<i32>,
    #[validate(range(min = 0, message = "Lot size must be a valid positive number"))]
    #[serde(default)]
    pub lot_size_sqft: Option<i32>,
    #[serde(default)]
    pub year_built: Option<i32>,
    #[serde(default)]
    pub property_type: Option<PropertyType>,
    #[validate(url(message = "Listing URL must be a valid URL"))]
    #[serde(default)]
    pub listing_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRatingRequest {
    pub rating: Rating,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetNotesRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HouseSort {
    #[default]
    Newest,
    Score,
}

/// Query string for the house list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HouseListQuery {
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: HouseSort,
}

/// Body of the invitation email endpoint.
/// Fields are optional so a missing field is reported as such rather than as bad JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInvitationRequest {
    #[serde(default)]
    pub invitee_name: Option<String>,
    #[serde(default)]
    pub invitee_email: Option<String>,
    #[serde(default)]
    pub inviter_name: Option<String>,
    #[serde(default)]
    pub household_name: Option<String>,
}
