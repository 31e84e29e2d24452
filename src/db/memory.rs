//! In-process store for local runs and tests.
//!
//! Every operation takes the lock once and releases it before returning,
//! so no guard is ever held across an `.await`.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Donation, Invitation, RsvpEntry, User};

use super::{DonationStore, InvitationStore, StoreError, UserStore};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    invitations: Vec<Invitation>,
    donations: Vec<Donation>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        let mut tables = self.tables()?;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("User already exists".to_string()));
        }
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.tables()?.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl InvitationStore for MemoryStore {
    async fn create_invitation(&self, invitation: Invitation) -> Result<Invitation, StoreError> {
        self.tables()?.invitations.push(invitation.clone());
        Ok(invitation)
    }

    async fn get_invitation(&self, id: Uuid) -> Result<Option<Invitation>, StoreError> {
        Ok(self.tables()?.invitations.iter().find(|i| i.id == id).cloned())
    }

    async fn list_invitations_by_owner(&self, owner: Uuid) -> Result<Vec<Invitation>, StoreError> {
        Ok(self
            .tables()?
            .invitations
            .iter()
            .filter(|i| i.created_by == owner)
            .cloned()
            .collect())
    }

    async fn append_rsvp(&self, id: Uuid, entry: RsvpEntry) -> Result<Invitation, StoreError> {
        let mut tables = self.tables()?;
        let invitation = tables
            .invitations
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound("Invitation"))?;
        invitation.rsvps.push(entry);
        Ok(invitation.clone())
    }
}

#[async_trait]
impl DonationStore for MemoryStore {
    async fn insert_and_credit(&self, donation: Donation) -> Result<Donation, StoreError> {
        let mut tables = self.tables()?;
        let invitation = tables
            .invitations
            .iter_mut()
            .find(|i| i.id == donation.invitation)
            .ok_or(StoreError::NotFound("Invitation"))?;
        invitation.current_gift_fund = invitation
            .current_gift_fund
            .checked_add(donation.gift_fund_amount)
            .ok_or_else(|| StoreError::Backend("gift fund total overflow".to_string()))?;
        tables.donations.push(donation.clone());
        Ok(donation)
    }

    async fn list_donations(&self, invitation_id: Uuid) -> Result<Vec<Donation>, StoreError> {
        Ok(self
            .tables()?
            .donations
            .iter()
            .filter(|d| d.invitation == invitation_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{
        models::{Donor, Invitation},
        money::Money,
    };

    fn invitation(current_cents: i64) -> Invitation {
        let start = Utc::now() + Duration::days(1);
        Invitation {
            id: Uuid::new_v4(),
            child_name: "Mia".into(),
            event_date: start,
            event_end_time: start + Duration::hours(2),
            event_location: "Park".into(),
            charity_name: "Save the Bees".into(),
            gift_fund_target: Money::from_cents(10_000),
            current_gift_fund: Money::from_cents(current_cents),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            rsvps: vec![],
        }
    }

    #[tokio::test]
    async fn overflowing_total_writes_nothing_and_store_stays_usable() {
        let store = MemoryStore::default();
        let full = store.create_invitation(invitation(i64::MAX - 5)).await.unwrap();
        let donor = Donor { name: "Ada".into(), email: None };

        let donation = Donation::new(full.id, donor.clone(), Money::from_cents(1_000), "pi_1".into());
        let err = store.insert_and_credit(donation).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(store.list_donations(full.id).await.unwrap().is_empty());
        let unchanged = store.get_invitation(full.id).await.unwrap().unwrap();
        assert_eq!(unchanged.current_gift_fund, Money::from_cents(i64::MAX - 5));

        let other = store.create_invitation(invitation(0)).await.unwrap();
        let donation = Donation::new(other.id, donor, Money::from_cents(1_000), "pi_2".into());
        store.insert_and_credit(donation).await.unwrap();
        let credited = store.get_invitation(other.id).await.unwrap().unwrap();
        assert_eq!(credited.current_gift_fund, Money::from_cents(100));
    }
}
