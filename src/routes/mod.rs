// Route exports
pub mod categories;
pub mod health;
pub mod household;
pub mod houses;
pub mod invitations;
pub mod onboarding;
pub mod ratings;
pub mod weights;

use actix_web::web;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::onboarding::{OnboardingAction, OnboardingStep};
use crate::error::ApiError;
use crate::models::HouseholdUser;
use crate::services::{AuthUser, EmailClient, PostgresClient};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub email: Arc<EmailClient>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/api/send-invitation",
        web::post().to(invitations::send_invitation),
    )
    .service(
        web::scope("/api/v1")
            .configure(health::configure)
            .configure(household::configure)
            .configure(categories::configure)
            .configure(weights::configure)
            .configure(houses::configure)
            .configure(ratings::configure)
            .configure(onboarding::configure),
    );
}

/// The caller's household membership. A pending invitation for the caller's
/// email is claimed the first time it is looked up.
pub(crate) async fn find_member(state: &AppState, user: &AuthUser) -> Result<Option<HouseholdUser>, ApiError> {
    if let Some(member) = state.postgres.find_member_by_auth(user.id).await? {
        return Ok(Some(member));
    }
    Ok(state.postgres.link_invitation(user.id, &user.email).await?)
}

pub(crate) async fn current_member(state: &AppState, user: &AuthUser) -> Result<HouseholdUser, ApiError> {
    find_member(state, user).await?.ok_or_else(ApiError::no_household)
}

/// Mark an onboarding step done as a side effect of another action; failures are only logged
pub(crate) async fn complete_step(state: &AppState, member_id: Uuid, step: OnboardingStep) {
    let action = OnboardingAction::CompleteStep { step };
    if let Err(e) = state.postgres.apply_onboarding(member_id, action).await {
        tracing::warn!("Failed to record onboarding step {:?} for {}: {}", step, member_id, e);
    }
}
