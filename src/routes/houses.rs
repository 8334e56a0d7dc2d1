use actix_web::{web, HttpResponse};
use std::collections::HashMap;
use uuid::Uuid;

use crate::core::onboarding::OnboardingStep;
use crate::core::progress::rating_progress;
use crate::core::scoring::{compare_scores, household_average, score_label, HouseScore, Scorer};
use crate::core::validation::validate_house_form;
use crate::error::ApiError;
use crate::models::{
    HouseDetailResponse, HouseForm, HouseListQuery, HouseSort, HouseWithScore,
    HouseholdScoresResponse, HouseholdUser, MemberScore,
};
use crate::routes::{complete_step, current_member, AppState};
use crate::services::AuthUser;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/houses", web::get().to(list_houses))
        .route("/houses", web::post().to(create_house))
        .route("/houses/{id}", web::get().to(get_house))
        .route("/houses/{id}", web::put().to(update_house))
        .route("/houses/{id}/archive", web::post().to(archive_house))
        .route("/houses/{id}/restore", web::post().to(restore_house))
        .route("/houses/{id}/score", web::get().to(house_score))
        .route("/houses/{id}/household-scores", web::get().to(household_scores));
}

/// The caller's score for one house
async fn score_for_member(
    state: &AppState,
    member: &HouseholdUser,
    house_id: Uuid,
) -> Result<HouseScore, ApiError> {
    let categories = state.postgres.list_categories(member.household_id).await?;
    let weights = state.postgres.weights_for_member(member.id).await?;
    let ratings: HashMap<Uuid, _> = state
        .postgres
        .ratings_for_house(member.id, house_id)
        .await?
        .into_iter()
        .filter_map(|r| r.rating.map(|rating| (r.category_id, rating)))
        .collect();

    Ok(Scorer::new(&categories, &weights).score_house(house_id, &ratings))
}

/// Houses with the caller's score for each
///
/// GET /api/v1/houses?archived=false&q=maple&sort=newest|score
async fn list_houses(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<HouseListQuery>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;

    let houses = state
        .postgres
        .list_houses(member.household_id, query.archived, query.q.as_deref())
        .await?;
    let categories = state.postgres.list_categories(member.household_id).await?;
    let weights = state.postgres.weights_for_member(member.id).await?;
    let ratings = state.postgres.ratings_for_member(member.id).await?;

    let house_ids: Vec<Uuid> = houses.iter().map(|h| h.id).collect();
    let scores = Scorer::new(&categories, &weights).score_houses(&house_ids, &ratings);

    let mut response: Vec<HouseWithScore> = houses
        .into_iter()
        .filter_map(|house| {
            scores
                .get(&house.id)
                .map(|score| HouseWithScore::new(house, score))
        })
        .collect();

    // Stable sort keeps newest-first among equal scores
    if query.sort == HouseSort::Score {
        response.sort_by(|a, b| compare_scores(a.score, b.score));
    }

    tracing::debug!(
        "Listing {} houses for member {} (archived: {})",
        response.len(),
        member.id,
        query.archived
    );

    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/houses
async fn create_house(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<HouseForm>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let form = validate_house_form(req.into_inner()).map_err(ApiError::Validation)?;

    let house = state.postgres.create_house(member.household_id, &form).await?;
    tracing::info!("Member {} added house {}", member.id, house.id);

    complete_step(&state, member.id, OnboardingStep::AddFirstHouse).await;

    Ok(HttpResponse::Created().json(house))
}

/// A house with the caller's score and rating progress
///
/// GET /api/v1/houses/{id}
async fn get_house(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let house = state.postgres.get_house(member.household_id, path.into_inner()).await?;

    let categories = state.postgres.list_categories(member.household_id).await?;
    let weights = state.postgres.weights_for_member(member.id).await?;
    let ratings: HashMap<Uuid, _> = state
        .postgres
        .ratings_for_house(member.id, house.id)
        .await?
        .into_iter()
        .filter_map(|r| r.rating.map(|rating| (r.category_id, rating)))
        .collect();

    let score = Scorer::new(&categories, &weights).score_house(house.id, &ratings);
    let progress = rating_progress(&categories, &ratings);

    Ok(HttpResponse::Ok().json(HouseDetailResponse {
        house,
        score,
        progress,
    }))
}

/// PUT /api/v1/houses/{id}
async fn update_house(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<HouseForm>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let form = validate_house_form(req.into_inner()).map_err(ApiError::Validation)?;

    let house = state
        .postgres
        .update_house(member.household_id, path.into_inner(), &form)
        .await?;

    Ok(HttpResponse::Ok().json(house))
}

/// POST /api/v1/houses/{id}/archive
async fn archive_house(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let house = state
        .postgres
        .set_house_active(member.household_id, path.into_inner(), false)
        .await?;
    Ok(HttpResponse::Ok().json(house))
}

/// POST /api/v1/houses/{id}/restore
async fn restore_house(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let house = state
        .postgres
        .set_house_active(member.household_id, path.into_inner(), true)
        .await?;
    Ok(HttpResponse::Ok().json(house))
}

/// The caller's overall score and per-category breakdown
///
/// GET /api/v1/houses/{id}/score
async fn house_score(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let house = state.postgres.get_house(member.household_id, path.into_inner()).await?;

    let score = score_for_member(&state, &member, house.id).await?;
    Ok(HttpResponse::Ok().json(score))
}

/// Every member's score for a house, plus the household average
///
/// GET /api/v1/houses/{id}/household-scores
async fn household_scores(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let house = state.postgres.get_house(member.household_id, path.into_inner()).await?;

    let members = state.postgres.list_members(member.household_id).await?;
    let categories = state.postgres.list_categories(member.household_id).await?;
    let weights = state.postgres.weights_for_household(member.household_id).await?;
    let ratings = state.postgres.ratings_by_member_for_house(house.id).await?;

    let no_weights = HashMap::new();
    let no_ratings = HashMap::new();
    let scores: Vec<MemberScore> = members
        .into_iter()
        .map(|m| {
            let member_weights = weights.get(&m.id).unwrap_or(&no_weights);
            let member_ratings = ratings.get(&m.id).unwrap_or(&no_ratings);
            let score = Scorer::new(&categories, member_weights).score_house(house.id, member_ratings);
            MemberScore {
                member_id: m.id,
                name: m.name,
                role: m.role,
                overall_score: score.overall_score,
                label: score.label,
                rated_count: score.rated_count,
            }
        })
        .collect();

    let household_score = household_average(scores.iter().map(|s| s.overall_score));

    Ok(HttpResponse::Ok().json(HouseholdScoresResponse {
        house_id: house.id,
        members: scores,
        household_score,
        household_label: score_label(household_score),
    }))
}
