// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Category, CategoryGroup, CategoryWeight, House, HouseRating, Household, HouseholdUser,
    LevelOutOfRange, PropertyType, Rating, Role, Weight, MAX_LEVEL,
};
pub use requests::{
    ChangeRoleRequest, CreateCategoryRequest, CreateHouseholdRequest, HouseForm, HouseListQuery,
    HouseSort, InviteMemberRequest, SendInvitationRequest, SetNotesRequest, SetRatingRequest,
    SetWeightRequest, SetWeightsRequest, UpdateCategoryRequest, WeightInput,
};
pub use responses::{
    CategoryWithRating, CategoryWithWeight, DashboardResponse, ErrorResponse, HealthResponse,
    HouseDetailResponse, HouseRatingsResponse, HouseWithScore, HouseholdResponse,
    HouseholdScoresResponse, MeResponse, MemberScore, OnboardingResponse, SendInvitationResponse,
};
