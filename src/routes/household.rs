use actix_web::{web, HttpResponse};
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

use crate::core::household::{owner_count, RoleChange, MAX_MEMBERS, MIN_MEMBERS};
use crate::core::onboarding::OnboardingStep;
use crate::core::scoring::{compare_scores, Scorer};
use crate::core::validation::{validate_invite, validation_message};
use crate::error::ApiError;
use crate::models::{
    ChangeRoleRequest, CreateHouseholdRequest, DashboardResponse, HouseWithScore, HouseholdResponse,
    InviteMemberRequest, MeResponse,
};
use crate::routes::{complete_step, current_member, find_member, AppState};
use crate::services::{AuthUser, EmailOutcome, Invitation};

/// Houses shown on the dashboard
const TOP_HOUSES: usize = 3;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/me", web::get().to(me))
        .route("/household", web::get().to(get_household))
        .route("/household", web::post().to(create_household))
        .route("/household/members", web::get().to(list_members))
        .route("/household/members", web::post().to(invite_member))
        .route("/household/members/{id}", web::delete().to(remove_member))
        .route("/household/members/{id}/role", web::put().to(change_role))
        .route("/dashboard", web::get().to(dashboard));
}

/// GET /api/v1/me
async fn me(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, ApiError> {
    let member = find_member(&state, &user).await?;
    let household = match &member {
        Some(member) => Some(state.postgres.get_household(member.household_id).await?),
        None => None,
    };

    Ok(HttpResponse::Ok().json(MeResponse {
        auth_user_id: user.id,
        email: user.email,
        member,
        household,
    }))
}

/// Create a household with the caller as owner
///
/// POST /api/v1/household
///
/// Request body:
/// ```json
/// { "householdName": "string", "userName": "string" }
/// ```
async fn create_household(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<CreateHouseholdRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = CreateHouseholdRequest {
        household_name: req.household_name.trim().to_string(),
        user_name: req.user_name.trim().to_string(),
    };
    req.validate()
        .map_err(|e| ApiError::Validation(validation_message(&e)))?;

    if find_member(&state, &user).await?.is_some() {
        return Err(ApiError::Conflict("You already belong to a household".to_string()));
    }

    let (household, owner) = state
        .postgres
        .create_household(&req.household_name, user.id, &req.user_name, &user.email)
        .await?;

    Ok(HttpResponse::Created().json(HouseholdResponse {
        household,
        can_invite: true,
        owner_count: 1,
        members: vec![owner],
    }))
}

/// GET /api/v1/household
async fn get_household(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let household = state.postgres.get_household(member.household_id).await?;
    let members = state.postgres.list_members(member.household_id).await?;

    Ok(HttpResponse::Ok().json(HouseholdResponse {
        household,
        owner_count: owner_count(&members),
        can_invite: member.is_owner() && members.len() < MAX_MEMBERS,
        members,
    }))
}

/// GET /api/v1/household/members
async fn list_members(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let members = state.postgres.list_members(member.household_id).await?;
    Ok(HttpResponse::Ok().json(members))
}

/// Invite a member by email. The invitation email is best-effort.
///
/// POST /api/v1/household/members
///
/// Request body:
/// ```json
/// { "name": "string", "email": "string", "role": "owner|member" }
/// ```
async fn invite_member(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<InviteMemberRequest>,
) -> Result<HttpResponse, ApiError> {
    let actor = current_member(&state, &user).await?;
    let req = validate_invite(req.into_inner()).map_err(ApiError::Validation)?;

    let invited = state
        .postgres
        .invite_member(actor.household_id, actor.id, &req.name, &req.email, req.role)
        .await?;

    tracing::info!(
        "Member {} invited {} to household {} as {}",
        actor.id,
        invited.id,
        actor.household_id,
        invited.role.as_str()
    );

    complete_step(&state, actor.id, OnboardingStep::HouseholdMembers).await;

    let household = state.postgres.get_household(actor.household_id).await?;
    let invitation = Invitation {
        invitee_name: &invited.name,
        invitee_email: &invited.email,
        inviter_name: &actor.name,
        household_name: &household.name,
    };
    let email_sent = match state.email.send_invitation(&invitation).await {
        Ok(EmailOutcome::Sent { .. }) => true,
        Ok(EmailOutcome::Logged) => false,
        Err(e) => {
            tracing::warn!("Invitation email to {} failed: {}", invited.email, e);
            false
        }
    };

    Ok(HttpResponse::Created().json(serde_json::json!({
        "member": invited,
        "emailSent": email_sent,
    })))
}

/// DELETE /api/v1/household/members/{id}
async fn remove_member(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let actor = current_member(&state, &user).await?;
    state
        .postgres
        .remove_member(actor.household_id, actor.id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// PUT /api/v1/household/members/{id}/role
async fn change_role(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<ChangeRoleRequest>,
) -> Result<HttpResponse, ApiError> {
    let actor = current_member(&state, &user).await?;
    let target_id = path.into_inner();

    let change = state
        .postgres
        .change_role(actor.household_id, actor.id, target_id, req.role)
        .await?;

    if let RoleChange::Changed { from, to } = change {
        tracing::info!(
            "Member {} changed role of {} from {} to {}",
            actor.id,
            target_id,
            from.as_str(),
            to.as_str()
        );
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "memberId": target_id,
        "role": req.role,
        "changed": change != RoleChange::Unchanged,
    })))
}

/// GET /api/v1/dashboard
async fn dashboard(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, ApiError> {
    let member = current_member(&state, &user).await?;
    let household_id = member.household_id;

    let household = state.postgres.get_household(household_id).await?;
    let members = state.postgres.list_members(household_id).await?;
    let categories = state.postgres.list_categories(household_id).await?;
    let weights = state.postgres.weights_for_member(member.id).await?;
    let houses = state.postgres.list_houses(household_id, false, None).await?;
    let (active_house_count, archived_house_count) = state.postgres.count_houses(household_id).await?;
    let ratings = state.postgres.ratings_for_member(member.id).await?;
    let onboarding = state.postgres.get_onboarding(member.id).await?;

    let house_ids: Vec<Uuid> = houses.iter().map(|h| h.id).collect();
    let scores = Scorer::new(&categories, &weights).score_houses(&house_ids, &ratings);

    let mut top_houses: Vec<HouseWithScore> = houses
        .into_iter()
        .filter_map(|house| {
            scores
                .get(&house.id)
                .map(|score| HouseWithScore::new(house, score))
        })
        .collect();
    top_houses.sort_by(|a, b| compare_scores(a.score, b.score));
    top_houses.truncate(TOP_HOUSES);

    let active_ids: HashSet<Uuid> = categories
        .iter()
        .filter(|c| c.is_active)
        .map(|c| c.id)
        .collect();

    Ok(HttpResponse::Ok().json(DashboardResponse {
        household,
        member_count: members.len(),
        needs_members: members.len() < MIN_MEMBERS,
        active_category_count: active_ids.len(),
        weights_set: weights.keys().filter(|id| active_ids.contains(id)).count(),
        active_house_count: active_house_count as usize,
        archived_house_count: archived_house_count as usize,
        top_houses,
        checklist: onboarding.checklist(),
        member,
    }))
}
