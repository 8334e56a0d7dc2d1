use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Highest value a weight or rating can take
pub const MAX_LEVEL: u8 = 5;

/// A household member's personal importance for a category (0-5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Weight(u8);

/// A household member's assessment of a house for a category (0-5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

/// Returned when a weight or rating is outside 0..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("value {0} is outside the allowed range 0-5")]
pub struct LevelOutOfRange(pub i64);

macro_rules! level_type {
    ($name:ident) => {
        impl $name {
            pub fn new(value: u8) -> Option<Self> {
                (value <= MAX_LEVEL).then_some(Self(value))
            }

            pub fn value(self) -> u8 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = LevelOutOfRange;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                u8::try_from(value)
                    .ok()
                    .and_then(Self::new)
                    .ok_or(LevelOutOfRange(value))
            }
        }

        impl TryFrom<i16> for $name {
            type Error = LevelOutOfRange;

            fn try_from(value: i16) -> Result<Self, Self::Error> {
                Self::try_from(i64::from(value))
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.0
            }
        }

        impl From<$name> for i16 {
            fn from(value: $name) -> i16 {
                i16::from(value.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

level_type!(Weight);
level_type!(Rating);

/// Household member role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "household_role", rename_all = "lowercase")]
pub enum Role {
    Owner,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Member => "member",
        }
    }
}

/// Category grouping used for display and progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "category_group", rename_all = "lowercase")]
pub enum CategoryGroup {
    Features,
    Size,
    Neighborhood,
    Transportation,
    Yard,
    Custom,
}

impl CategoryGroup {
    /// Canonical display order
    pub const ALL: [CategoryGroup; 6] = [
        CategoryGroup::Features,
        CategoryGroup::Size,
        CategoryGroup::Neighborhood,
        CategoryGroup::Transportation,
        CategoryGroup::Yard,
        CategoryGroup::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryGroup::Features => "features",
            CategoryGroup::Size => "size",
            CategoryGroup::Neighborhood => "neighborhood",
            CategoryGroup::Transportation => "transportation",
            CategoryGroup::Yard => "yard",
            CategoryGroup::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryGroup::Features => "Features",
            CategoryGroup::Size => "Size & Space",
            CategoryGroup::Neighborhood => "Neighborhood",
            CategoryGroup::Transportation => "Transportation",
            CategoryGroup::Yard => "Yard & Outdoor",
            CategoryGroup::Custom => "Custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "property_type", rename_all = "snake_case")]
pub enum PropertyType {
    SingleFamily,
    Condo,
    Townhouse,
    MultiFamily,
    Mobile,
    Land,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A member of a household; `auth_user_id` stays empty until an invitee signs up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdUser {
    pub id: Uuid,
    pub household_id: Uuid,
    pub auth_user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HouseholdUser {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }

    /// Invited but not yet linked to an identity
    pub fn is_pending(&self) -> bool {
        self.auth_user_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub household_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub group: CategoryGroup,
    pub is_default: bool,
    pub display_order: Option<i32>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWeight {
    pub household_user_id: Uuid,
    pub category_id: Uuid,
    pub weight: Weight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct House {
    pub id: Uuid,
    pub household_id: Uuid,
    pub nickname: Option<String>,
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub price: Option<f64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<f64>,
    pub square_feet: Option<i32>,
    pub lot_size_sqft: Option<i32>,
    pub year_built: Option<i32>,
    pub property_type: Option<PropertyType>,
    pub listing_url: Option<String>,
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl House {
    pub fn is_archived(&self) -> bool {
        !self.is_active
    }
}

/// One member's rating of one house for one category.
/// `rating` is empty when only notes have been entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseRating {
    pub id: Uuid,
    pub household_user_id: Uuid,
    pub house_id: Uuid,
    pub category_id: Uuid,
    pub rating: Option<Rating>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}
