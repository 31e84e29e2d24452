use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::money::Money;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub pwd_hash: String,
    pub created_at: DateTime<Utc>,
}

/// What the API reveals about a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Canonical RSVP answer.
///
/// Serialized as the boolean `attending`. Clients may also send `"yes"` or
/// `"no"`; every conversion from those strings happens here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attendance {
    Attending,
    NotAttending,
}

impl Attendance {
    pub fn is_attending(&self) -> bool {
        matches!(self, Attendance::Attending)
    }
}

impl From<bool> for Attendance {
    fn from(attending: bool) -> Self {
        if attending {
            Attendance::Attending
        } else {
            Attendance::NotAttending
        }
    }
}

impl Serialize for Attendance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.is_attending())
    }
}

impl<'de> Deserialize<'de> for Attendance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AttendanceVisitor;

        impl<'de> de::Visitor<'de> for AttendanceVisitor {
            type Value = Attendance;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a boolean or \"yes\"/\"no\"")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Attendance, E> {
                Ok(Attendance::from(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Attendance, E> {
                match v.trim().to_ascii_lowercase().as_str() {
                    "yes" | "true" => Ok(Attendance::Attending),
                    "no" | "false" => Ok(Attendance::NotAttending),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }
        }

        deserializer.deserialize_any(AttendanceVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpEntry {
    pub guest_name: String,
    pub email: Option<String>,
    pub attending: Attendance,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub child_name: String,
    pub event_date: DateTime<Utc>,
    pub event_end_time: DateTime<Utc>,
    pub event_location: String,
    pub charity_name: String,
    pub gift_fund_target: Money,
    /// Only ever written by the donation ledger.
    pub current_gift_fund: Money,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub rsvps: Vec<RsvpEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donor {
    #[serde(default)]
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Pending,
    Completed,
    Failed,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Completed => "completed",
            DonationStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DonationStatus::Pending),
            "completed" => Some(DonationStatus::Completed),
            "failed" => Some(DonationStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: Uuid,
    pub invitation: Uuid,
    pub donor: Donor,
    pub amount: Money,
    pub charity_amount: Money,
    pub gift_fund_amount: Money,
    pub payment_reference: String,
    pub status: DonationStatus,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    /// Builds a pending donation with its split fixed for good.
    pub fn new(invitation: Uuid, donor: Donor, amount: Money, payment_reference: String) -> Self {
        let split = amount.allocate();
        Self {
            id: Uuid::new_v4(),
            invitation,
            donor,
            amount,
            charity_amount: split.charity,
            gift_fund_amount: split.gift_fund,
            payment_reference,
            status: DonationStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn completed(mut self) -> Self {
        self.status = DonationStatus::Completed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attendance_accepts_both_representations() {
        for (raw, expected) in [
            ("true", Attendance::Attending),
            ("false", Attendance::NotAttending),
            ("\"yes\"", Attendance::Attending),
            ("\"No\"", Attendance::NotAttending),
        ] {
            let parsed: Attendance = serde_json::from_str(raw).unwrap();
            assert_eq!(parsed, expected, "{raw}");
        }
        assert!(serde_json::from_str::<Attendance>("\"maybe\"").is_err());
        assert!(serde_json::from_str::<Attendance>("1").is_err());
    }

    #[test]
    fn attendance_serializes_as_bool() {
        assert_eq!(serde_json::to_string(&Attendance::Attending).unwrap(), "true");
        assert_eq!(serde_json::to_string(&Attendance::NotAttending).unwrap(), "false");
    }

    #[test]
    fn new_donation_is_pending_with_fixed_split() {
        let donor = Donor { name: "Ada".into(), email: None };
        let donation = Donation::new(Uuid::new_v4(), donor, Money::from_cents(2000), "pi_1".into());
        assert_eq!(donation.status, DonationStatus::Pending);
        assert_eq!(donation.gift_fund_amount, Money::from_cents(200));
        assert_eq!(donation.charity_amount, Money::from_cents(1800));
        assert_eq!(donation.completed().status, DonationStatus::Completed);
    }

    #[test]
    fn donation_status_strings() {
        for status in [DonationStatus::Pending, DonationStatus::Completed, DonationStatus::Failed] {
            assert_eq!(DonationStatus::parse(status.as_str()), Some(status));
        }
    }
}
