use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::core::categories::weight_label;
use crate::core::validation::{validate_category_update, validate_new_category};
use crate::error::ApiError;
use crate::models::{CategoryWithWeight, CreateCategoryRequest, UpdateCategoryRequest};
use crate::routes::{current_member, AppState};
use crate::services::AuthUser;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/categories", web::get().to(list_categories))
        .route("/categories", web::post().to(create_category))
        .route("/categories/{id}", web::patch().to(update_category))
        .route("/categories/{id}", web::delete().to(delete_category));
}

/// All household categories, active or not, with the caller's weight for each
///
/// GET /api/v1/categories
async fn list_categories(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let categories = state.postgres.list_categories(member.household_id).await?;
    let weights = state.postgres.weights_for_member(member.id).await?;

    let response: Vec<CategoryWithWeight> = categories
        .into_iter()
        .map(|category| {
            let weight = weights.get(&category.id).copied();
            CategoryWithWeight {
                category,
                weight,
                weight_label: weight_label(weight),
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/categories
async fn create_category(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let req = validate_new_category(req.into_inner()).map_err(ApiError::Validation)?;

    let category = state.postgres.create_category(member.household_id, &req).await?;
    tracing::info!("Created category {} in household {}", category.id, member.household_id);

    Ok(HttpResponse::Created().json(category))
}

/// Rename, describe, or toggle a category
///
/// PATCH /api/v1/categories/{id}
async fn update_category(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let req = validate_category_update(req.into_inner()).map_err(ApiError::Validation)?;

    let category = state
        .postgres
        .update_category(member.household_id, path.into_inner(), &req)
        .await?;

    Ok(HttpResponse::Ok().json(category))
}

/// DELETE /api/v1/categories/{id}
async fn delete_category(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let category_id = path.into_inner();

    state.postgres.delete_category(member.household_id, category_id).await?;
    tracing::info!("Deleted category {} from household {}", category_id, member.household_id);

    Ok(HttpResponse::NoContent().finish())
}
