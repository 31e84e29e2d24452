use log::{info, warn};

use crate::{
    dto::NewDonationDto,
    errors::{ApiError, FieldErrors},
    models::{Donation, Donor},
    money::Money,
    AppState,
};

use super::{
    ledger,
    payment::PaymentError,
    templates::{EventSummary, Notification},
    user::is_valid_email,
};

/// Charges the donor, then records the donation.
///
/// Validation and the invitation lookup happen before the card is touched.
/// A failed or timed-out charge returns before the ledger is called, so it
/// leaves no donation and no change to the gift-fund total.
pub async fn create(dto: NewDonationDto, state: &AppState) -> Result<Donation, ApiError> {
    let mut errors = FieldErrors::new();
    match dto.amount {
        Some(amount) if amount.is_chargeable() => {}
        Some(amount) if amount.is_positive() => {
            errors.insert("amount", format!("Amount must not exceed {}", Money::MAX));
        }
        Some(_) => {
            errors.insert("amount", "Amount must be greater than zero".to_string());
        }
        None => {
            errors.insert("amount", "Amount is required".to_string());
        }
    }
    if dto.invitation_id.is_none() {
        errors.insert("invitationId", "Invitation is required".to_string());
    }
    let donor = dto.donor.map(|d| Donor {
        name: d.name.trim().to_string(),
        email: d.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
    });
    match &donor {
        Some(donor) => {
            if donor.name.is_empty() {
                errors.insert("donor.name", "Donor name is required".to_string());
            }
            if let Some(email) = &donor.email {
                if !is_valid_email(email) {
                    errors.insert("donor.email", "Please enter a valid email".to_string());
                }
            }
        }
        None => {
            errors.insert("donor", "Donor details are required".to_string());
        }
    }
    let payment_method = dto.payment_method_id.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
    if payment_method.is_none() {
        errors.insert("paymentMethodId", "Payment method is required".to_string());
    }
    ApiError::check(errors)?;

    let (Some(amount), Some(invitation_id), Some(donor), Some(payment_method)) =
        (dto.amount, dto.invitation_id, donor, payment_method)
    else {
        return Err(ApiError::InternalError);
    };

    let invitation = state
        .store
        .get_invitation(invitation_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invitation not found".to_string()))?;

    let charge = tokio::time::timeout(
        state.payment_timeout,
        state.payments.charge(amount, &state.currency, &payment_method),
    )
    .await
    .unwrap_or(Err(PaymentError::Timeout));
    let payment_reference = match charge {
        Ok(reference) => reference,
        Err(err) => {
            warn!("payment of {} for invitation {} failed: {}", amount, invitation_id, err);
            return Err(err.into());
        }
    };

    let donation = ledger::record_donation(
        state.store.as_ref(),
        invitation.id,
        amount,
        donor,
        payment_reference,
    )
    .await?;
    info!("donation {} completed", donation.id);

    if let Some(email) = &donation.donor.email {
        let notification = Notification::DonationConfirmation {
            donor_name: donation.donor.name.clone(),
            amount: donation.amount,
            event: EventSummary::from(&invitation),
        };
        state.notifier.dispatch_best_effort(email, &notification).await;
    }
    Ok(donation)
}
