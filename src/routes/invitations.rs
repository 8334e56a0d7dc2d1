use actix_web::{web, HttpResponse};

use crate::models::{SendInvitationRequest, SendInvitationResponse};
use crate::routes::AppState;
use crate::services::{EmailOutcome, Invitation};

fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Send an invitation email
///
/// POST /api/send-invitation
///
/// Request body:
/// ```json
/// {
///   "inviteeName": "string",
///   "inviteeEmail": "string",
///   "inviterName": "string",
///   "householdName": "string"
/// }
/// ```
pub async fn send_invitation(
    state: web::Data<AppState>,
    req: web::Json<SendInvitationRequest>,
) -> HttpResponse {
    let fields = (
        required(&req.invitee_name),
        required(&req.invitee_email),
        required(&req.inviter_name),
        required(&req.household_name),
    );

    let (Some(invitee_name), Some(invitee_email), Some(inviter_name), Some(household_name)) = fields
    else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Missing required fields",
        }));
    };

    let invitation = Invitation {
        invitee_name,
        invitee_email,
        inviter_name,
        household_name,
    };

    match state.email.send_invitation(&invitation).await {
        Ok(EmailOutcome::Sent { id }) => HttpResponse::Ok().json(SendInvitationResponse::sent(id)),
        Ok(EmailOutcome::Logged) => HttpResponse::Ok().json(SendInvitationResponse::development()),
        Err(e) => {
            tracing::error!("Failed to send invitation to {}: {}", invitee_email, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to send email",
                "details": e.details(),
            }))
        }
    }
}
