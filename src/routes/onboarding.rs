use actix_web::{web, HttpResponse};

use crate::core::onboarding::OnboardingAction;
use crate::error::ApiError;
use crate::models::OnboardingResponse;
use crate::routes::{current_member, AppState};
use crate::services::AuthUser;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/onboarding", web::get().to(get_onboarding))
        .route("/onboarding/actions", web::post().to(apply_action));
}

/// GET /api/v1/onboarding
async fn get_onboarding(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let onboarding = state.postgres.get_onboarding(member.id).await?;
    Ok(HttpResponse::Ok().json(OnboardingResponse::from(onboarding)))
}

/// Apply one onboarding action
///
/// POST /api/v1/onboarding/actions
///
/// Request body:
/// ```json
/// { "type": "complete_step", "step": "add-first-house" }
/// { "type": "skip_tour", "tour": "houses" }
/// { "type": "complete_onboarding" }
/// ```
async fn apply_action(
    state: web::Data<AppState>,
    user: AuthUser,
    action: web::Json<OnboardingAction>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let onboarding = state
        .postgres
        .apply_onboarding(member.id, action.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(OnboardingResponse::from(onboarding)))
}
