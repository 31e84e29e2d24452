use actix_web::{get, web, HttpResponse};
use chrono::{Duration, Utc};
use serde_json::json;

use crate::{
    dto::{SampleInvitation, TestEmailRequest},
    errors::ApiError,
    models::{Attendance, Donor},
    money::Money,
    service::{
        auth::{AuthMiddleware, UserAuthData},
        templates::{EventSummary, Notification},
        user::is_valid_email,
    },
    AppState,
};

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "healthy", "timestamp": Utc::now().to_rfc3339() }))
}

/// Reports whether real email delivery is configured.
#[get("/health")]
pub async fn email_health(state: web::Data<AppState>) -> HttpResponse {
    let notifier = &state.notifier;
    if !notifier.is_configured() {
        return HttpResponse::InternalServerError().json(json!({
            "status": "error",
            "message": "Email service is not properly configured",
            "details": "Missing environment variables: RESEND_API_KEY",
        }));
    }
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "message": "Email service is properly configured",
        "config": {
            "fromEmail": notifier.from_address(),
            "apiKeyConfigured": true,
        },
    }))
}

fn sample_event(sample: Option<SampleInvitation>) -> EventSummary {
    match sample {
        Some(sample) => EventSummary::from(sample),
        None => {
            let start = Utc::now() + Duration::days(14);
            EventSummary {
                id: None,
                child_name: "Sample Child".to_string(),
                event_date: start,
                event_end_time: start + Duration::hours(2),
                event_location: "Sample Park".to_string(),
                charity_name: "Sample Charity".to_string(),
            }
        }
    }
}

/// Sends one sample email. Unlike everywhere else, a delivery failure is the result.
pub async fn send_test_email(
    _user: UserAuthData,
    dto: web::Json<TestEmailRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let dto = dto.into_inner();
    let to = match dto.test_email.as_deref().map(str::trim) {
        Some(email) if is_valid_email(email) => email.to_string(),
        _ => return Err(ApiError::BadRequest("Test email address is required".to_string())),
    };
    let test_type = dto.test_type.unwrap_or_default();
    let event = sample_event(dto.sample_invitation);
    let notification = match test_type.as_str() {
        "invitation" => Notification::Invitation { event },
        "rsvp" => {
            let (guest_name, attending) = dto
                .sample_rsvp
                .map(|r| (r.guest_name, r.attending))
                .unwrap_or_else(|| ("Sample Guest".to_string(), Attendance::Attending));
            Notification::RsvpConfirmation { guest_name, attending, event }
        }
        "donation" => {
            let (donor, amount) = dto
                .sample_donation
                .map(|d| (d.donor, d.amount))
                .unwrap_or_else(|| {
                    (Donor { name: "Sample Donor".to_string(), email: None }, Money::from_cents(2_500))
                });
            Notification::DonationConfirmation { donor_name: donor.name, amount, event }
        }
        _ => return Err(ApiError::BadRequest("Invalid test type".to_string())),
    };

    let delivery_id = state.notifier.dispatch(&to, &notification).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Test {test_type} email sent successfully to {to}"),
        "result": { "messageId": delivery_id },
    })))
}

pub fn config(cfg: &mut web::ServiceConfig, auth: AuthMiddleware) {
    cfg.service(email_health).service(
        web::resource("/email")
            .wrap(auth)
            .route(web::post().to(send_test_email)),
    );
}
