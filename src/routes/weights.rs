use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::core::onboarding::OnboardingStep;
use crate::error::ApiError;
use crate::models::{CategoryWeight, SetWeightRequest, SetWeightsRequest};
use crate::routes::{complete_step, current_member, AppState};
use crate::services::AuthUser;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/weights", web::get().to(get_weights))
        .route("/weights", web::put().to(set_weights))
        .route("/weights/{category_id}", web::put().to(set_weight))
        .route("/weights/{category_id}", web::delete().to(clear_weight));
}

async fn member_weights(state: &AppState, member_id: Uuid) -> Result<Vec<CategoryWeight>, ApiError> {
    let weights = state.postgres.weights_for_member(member_id).await?;
    Ok(weights
        .into_iter()
        .map(|(category_id, weight)| CategoryWeight {
            household_user_id: member_id,
            category_id,
            weight,
        })
        .collect())
}

/// The caller's weights; categories without one are simply absent
///
/// GET /api/v1/weights
async fn get_weights(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    Ok(HttpResponse::Ok().json(member_weights(&state, member.id).await?))
}

/// Set several weights at once
///
/// PUT /api/v1/weights
///
/// Request body:
/// ```json
/// { "weights": [{ "categoryId": "uuid", "weight": 0-5 }] }
/// ```
async fn set_weights(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<SetWeightsRequest>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;

    state
        .postgres
        .set_weights(member.household_id, member.id, &req.weights)
        .await?;

    if !req.weights.is_empty() {
        complete_step(&state, member.id, OnboardingStep::PrioritiesIntro).await;
    }

    Ok(HttpResponse::Ok().json(member_weights(&state, member.id).await?))
}

/// PUT /api/v1/weights/{category_id}
async fn set_weight(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<SetWeightRequest>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let category_id = path.into_inner();

    state
        .postgres
        .set_weight(member.household_id, member.id, category_id, req.weight)
        .await?;

    complete_step(&state, member.id, OnboardingStep::PrioritiesIntro).await;

    Ok(HttpResponse::Ok().json(CategoryWeight {
        household_user_id: member.id,
        category_id,
        weight: req.weight,
    }))
}

/// Return a category's weight to "not set"
///
/// DELETE /api/v1/weights/{category_id}
async fn clear_weight(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let category_id = path.into_inner();

    if !state.postgres.clear_weight(member.id, category_id).await? {
        tracing::debug!("No weight to clear for member {} on {}", member.id, category_id);
    }

    Ok(HttpResponse::NoContent().finish())
}
