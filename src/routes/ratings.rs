use actix_web::{web, HttpResponse};
use std::collections::HashMap;
use uuid::Uuid;

use crate::core::categories::rating_label;
use crate::core::onboarding::OnboardingStep;
use crate::core::progress::{group_progress, rating_progress};
use crate::core::validation::blank_to_none;
use crate::error::ApiError;
use crate::models::{CategoryWithRating, HouseRatingsResponse, SetNotesRequest, SetRatingRequest};
use crate::routes::{complete_step, current_member, AppState};
use crate::services::AuthUser;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/houses/{id}/ratings", web::get().to(get_ratings))
        .route("/houses/{id}/ratings/{category_id}", web::put().to(set_rating))
        .route("/houses/{id}/ratings/{category_id}/notes", web::put().to(set_notes));
}

/// The rating sheet for a house: every active category with the caller's weight,
/// rating and notes, plus progress overall and per group
///
/// GET /api/v1/houses/{id}/ratings
async fn get_ratings(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let house = state.postgres.get_house(member.household_id, path.into_inner()).await?;

    let categories: Vec<_> = state
        .postgres
        .list_categories(member.household_id)
        .await?
        .into_iter()
        .filter(|c| c.is_active)
        .collect();
    let weights = state.postgres.weights_for_member(member.id).await?;
    let rows = state.postgres.ratings_for_house(member.id, house.id).await?;

    let ratings: HashMap<Uuid, _> = rows
        .iter()
        .filter_map(|r| r.rating.map(|rating| (r.category_id, rating)))
        .collect();
    let mut notes: HashMap<Uuid, String> = rows
        .into_iter()
        .filter_map(|r| r.notes.map(|n| (r.category_id, n)))
        .collect();

    let progress = rating_progress(&categories, &ratings);
    let groups = group_progress(&categories, &ratings);

    let sheet: Vec<CategoryWithRating> = categories
        .into_iter()
        .map(|category| {
            let rating = ratings.get(&category.id).copied();
            CategoryWithRating {
                weight: weights.get(&category.id).copied(),
                rating,
                rating_label: rating_label(rating),
                notes: notes.remove(&category.id),
                category,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(HouseRatingsResponse {
        house,
        categories: sheet,
        progress,
        groups,
    }))
}

/// PUT /api/v1/houses/{id}/ratings/{category_id}
async fn set_rating(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<SetRatingRequest>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let (house_id, category_id) = path.into_inner();

    state.postgres.get_house(member.household_id, house_id).await?;
    state.postgres.get_category(member.household_id, category_id).await?;

    let rating = state
        .postgres
        .set_rating(member.id, house_id, category_id, req.rating)
        .await?;

    complete_step(&state, member.id, OnboardingStep::RateHouse).await;

    Ok(HttpResponse::Ok().json(rating))
}

/// Save notes for a category; an existing rating is kept
///
/// PUT /api/v1/houses/{id}/ratings/{category_id}/notes
async fn set_notes(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<SetNotesRequest>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let (house_id, category_id) = path.into_inner();

    state.postgres.get_house(member.household_id, house_id).await?;
    state.postgres.get_category(member.household_id, category_id).await?;

    let notes = blank_to_none(req.into_inner().notes);
    let rating = state
        .postgres
        .set_rating_notes(member.id, house_id, category_id, notes.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(rating))
}
