use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    models::{Attendance, Donation, Donor, Invitation, UserProfile},
    money::Money,
};

#[derive(Debug, Deserialize, Clone)]
pub struct NewUserDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoginUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthUserResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimsUser {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user: ClaimsUser,
    pub iat: i64,
    pub exp: i64,
}

/// Every field is optional here so that missing ones can be reported together.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewInvitationDto {
    pub child_name: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub event_end_time: Option<DateTime<Utc>>,
    pub event_location: Option<String>,
    pub charity_name: Option<String>,
    pub gift_fund_target: Option<Money>,
    #[serde(default)]
    pub invitee_emails: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RsvpDto {
    #[serde(default)]
    pub guest_name: String,
    pub email: Option<String>,
    pub attending: Attendance,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewDonationDto {
    pub amount: Option<Money>,
    pub invitation_id: Option<Uuid>,
    pub donor: Option<Donor>,
    pub payment_method_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundProgress {
    pub target: Money,
    pub accumulated: Money,
    pub percent_complete: i64,
}

impl FundProgress {
    pub fn of(invitation: &Invitation) -> Self {
        Self {
            target: invitation.gift_fund_target,
            accumulated: invitation.current_gift_fund,
            percent_complete: invitation.current_gift_fund.percent_of(invitation.gift_fund_target),
        }
    }
}

/// `GET /invitations/{id}` body: the invitation with its donations resolved.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationDetails {
    #[serde(flatten)]
    pub invitation: Invitation,
    pub donations: Vec<Donation>,
    pub fund_progress: FundProgress,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TestEmailRequest {
    pub test_email: Option<String>,
    pub test_type: Option<String>,
    pub sample_invitation: Option<SampleInvitation>,
    pub sample_rsvp: Option<SampleRsvp>,
    pub sample_donation: Option<SampleDonation>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SampleInvitation {
    pub id: Option<Uuid>,
    pub child_name: String,
    pub event_date: DateTime<Utc>,
    pub event_end_time: DateTime<Utc>,
    pub event_location: String,
    pub charity_name: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SampleRsvp {
    pub guest_name: String,
    pub attending: Attendance,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SampleDonation {
    pub amount: Money,
    pub donor: Donor,
}
