use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use crate::{
    dto::{FundProgress, InvitationDetails, NewInvitationDto, RsvpDto},
    errors::{ApiError, FieldErrors},
    models::{Invitation, RsvpEntry},
    money::Money,
    AppState,
};

use super::{auth::UserAuthData, ledger, templates::{EventSummary, Notification}, user::is_valid_email};

fn required_text(value: Option<String>, field: &'static str, message: &str, errors: &mut FieldErrors) -> String {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v,
        _ => {
            errors.insert(field, message.to_string());
            String::new()
        }
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Invitation not found".to_string())
}

/// Validates every field up front; an invitation is either fully valid or not written.
pub fn build(owner: Uuid, dto: NewInvitationDto) -> Result<Invitation, ApiError> {
    let mut errors = FieldErrors::new();
    let child_name = required_text(dto.child_name, "childName", "Child name is required", &mut errors);
    let event_location = required_text(dto.event_location, "eventLocation", "Event location is required", &mut errors);
    let charity_name = required_text(dto.charity_name, "charityName", "Charity name is required", &mut errors);
    if dto.event_date.is_none() {
        errors.insert("eventDate", "Event date is required".to_string());
    }
    if dto.event_end_time.is_none() {
        errors.insert("eventEndTime", "Event end time is required".to_string());
    }
    if let (Some(start), Some(end)) = (dto.event_date, dto.event_end_time) {
        if end <= start {
            errors.insert("eventEndTime", "Event end time must be after the start time".to_string());
        }
    }
    match dto.gift_fund_target {
        Some(target) if target.is_chargeable() => {}
        Some(target) if target.is_positive() => {
            errors.insert("giftFundTarget", format!("Gift fund target must not exceed {}", Money::MAX));
        }
        Some(_) => {
            errors.insert("giftFundTarget", "Gift fund target must be greater than zero".to_string());
        }
        None => {
            errors.insert("giftFundTarget", "Gift fund target is required".to_string());
        }
    }
    for email in &dto.invitee_emails {
        if !is_valid_email(email.trim()) {
            errors.insert("inviteeEmails", format!("'{email}' is not a valid email"));
        }
    }
    ApiError::check(errors)?;

    match (dto.event_date, dto.event_end_time, dto.gift_fund_target) {
        (Some(event_date), Some(event_end_time), Some(gift_fund_target)) => Ok(Invitation {
            id: Uuid::new_v4(),
            child_name,
            event_date,
            event_end_time,
            event_location,
            charity_name,
            gift_fund_target,
            current_gift_fund: Money::ZERO,
            created_by: owner,
            created_at: Utc::now(),
            rsvps: Vec::new(),
        }),
        _ => Err(ApiError::InternalError),
    }
}

pub async fn create(user_auth_data: &UserAuthData, dto: NewInvitationDto, state: &AppState) -> Result<Invitation, ApiError> {
    let invitees: Vec<String> = dto.invitee_emails.iter().map(|e| e.trim().to_string()).collect();
    let invitation = build(user_auth_data.user_id, dto)?;
    let invitation = state.store.create_invitation(invitation).await?;
    info!("invitation {} created by {}", invitation.id, user_auth_data.user_id);

    if !invitees.is_empty() {
        let notification = Notification::Invitation { event: EventSummary::from(&invitation) };
        for email in &invitees {
            state.notifier.dispatch_best_effort(email, &notification).await;
        }
    }
    Ok(invitation)
}

pub async fn get_by_id(id: Uuid, state: &AppState) -> Result<Invitation, ApiError> {
    state.store.get_invitation(id).await?.ok_or_else(not_found)
}

pub async fn get_details(id: Uuid, state: &AppState) -> Result<InvitationDetails, ApiError> {
    let invitation = get_by_id(id, state).await?;
    let donations = ledger::list_donations(state.store.as_ref(), id).await?;
    let fund_progress = FundProgress::of(&invitation);
    Ok(InvitationDetails { invitation, donations, fund_progress })
}

pub async fn get_by_owner(owner: Uuid, state: &AppState) -> Result<Vec<Invitation>, ApiError> {
    Ok(state.store.list_invitations_by_owner(owner).await?)
}

/// Appends the answer as a new entry; earlier answers from the same guest stay.
pub async fn rsvp(id: Uuid, dto: RsvpDto, state: &AppState) -> Result<Invitation, ApiError> {
    let mut errors = FieldErrors::new();
    let guest_name = dto.guest_name.trim().to_string();
    if guest_name.is_empty() {
        errors.insert("guestName", "Guest name is required".to_string());
    }
    let email = dto.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
    if let Some(email) = &email {
        if !is_valid_email(email) {
            errors.insert("email", "Please enter a valid email".to_string());
        }
    }
    ApiError::check(errors)?;

    let entry = RsvpEntry {
        guest_name,
        email,
        attending: dto.attending,
        timestamp: Utc::now(),
    };
    let invitation = state.store.append_rsvp(id, entry.clone()).await?;
    info!("rsvp from '{}' recorded for invitation {}", entry.guest_name, id);

    match &entry.email {
        Some(email) => {
            let notification = Notification::RsvpConfirmation {
                guest_name: entry.guest_name.clone(),
                attending: entry.attending,
                event: EventSummary::from(&invitation),
            };
            state.notifier.dispatch_best_effort(email, &notification).await;
        }
        None => warn!("rsvp for invitation {} has no email, skipping confirmation", id),
    }
    Ok(invitation)
}
