use crate::models::{CreateCategoryRequest, HouseForm, InviteMemberRequest, UpdateCategoryRequest};
use chrono::Datelike;
use validator::{Validate, ValidationErrors};

pub const MIN_YEAR_BUILT: i32 = 1800;

/// Trim a string, mapping blank input to `None`
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Emails are compared and stored trimmed and lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// First human-readable message out of a validator error set
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                (field.to_string(), message)
            })
        })
        .collect();
    fields.sort();

    fields
        .into_iter()
        .next()
        .map(|(_, message)| message)
        .unwrap_or_else(|| errors.to_string())
}

/// Normalize and validate a house form against the given calendar year
pub fn validate_house_form_at(form: HouseForm, current_year: i32) -> Result<HouseForm, String> {
    let form = HouseForm {
        nickname: blank_to_none(form.nickname),
        address: form.address.trim().to_string(),
        city: blank_to_none(form.city),
        state: blank_to_none(form.state),
        zip: blank_to_none(form.zip),
        listing_url: blank_to_none(form.listing_url),
        notes: blank_to_none(form.notes),
        ..form
    };

    form.validate().map_err(|e| validation_message(&e))?;

    if let Some(year) = form.year_built {
        if !(MIN_YEAR_BUILT..=current_year).contains(&year) {
            return Err(format!(
                "Year built must be between {} and {}",
                MIN_YEAR_BUILT, current_year
            ));
        }
    }

    Ok(form)
}

pub fn validate_house_form(form: HouseForm) -> Result<HouseForm, String> {
    validate_house_form_at(form, chrono::Utc::now().year())
}

pub fn validate_invite(request: InviteMemberRequest) -> Result<InviteMemberRequest, String> {
    let request = InviteMemberRequest {
        name: request.name.trim().to_string(),
        email: normalize_email(&request.email),
        ..request
    };
    request.validate().map_err(|e| validation_message(&e))?;
    Ok(request)
}

pub fn validate_new_category(request: CreateCategoryRequest) -> Result<CreateCategoryRequest, String> {
    let request = CreateCategoryRequest {
        name: request.name.trim().to_string(),
        description: blank_to_none(request.description),
        ..request
    };
    request.validate().map_err(|e| validation_message(&e))?;
    Ok(request)
}

pub fn validate_category_update(request: UpdateCategoryRequest) -> Result<UpdateCategoryRequest, String> {
    let request = UpdateCategoryRequest {
        name: request.name.map(|n| n.trim().to_string()),
        description: request.description.map(blank_to_none),
        ..request
    };
    request.validate().map_err(|e| validation_message(&e))?;
    Ok(request)
}
