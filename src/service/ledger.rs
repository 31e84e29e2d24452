//! Donation ledger: the only writer of an invitation's gift-fund total.

use log::info;
use uuid::Uuid;

use crate::{
    db::DonationStore,
    errors::{ApiError, FieldErrors},
    models::{Donation, Donor},
    money::Money,
};

/// Records a donation whose charge the gateway already confirmed.
///
/// The split is fixed here, and the donation row and the gift-fund increment
/// are committed together. An unknown invitation is rejected and nothing is
/// written.
pub async fn record_donation<S>(
    store: &S,
    invitation_id: Uuid,
    amount: Money,
    donor: Donor,
    payment_reference: String,
) -> Result<Donation, ApiError>
where
    S: DonationStore + ?Sized,
{
    if !amount.is_chargeable() {
        let mut errors = FieldErrors::new();
        errors.insert("amount", format!("Amount must be between 0.01 and {}", Money::MAX));
        return Err(ApiError::Validation(errors));
    }
    let donation = Donation::new(invitation_id, donor, amount, payment_reference).completed();
    let donation = store.insert_and_credit(donation).await?;
    info!(
        "donation {} recorded for invitation {}: {} (charity {}, gift fund {})",
        donation.id, invitation_id, donation.amount, donation.charity_amount, donation.gift_fund_amount
    );
    Ok(donation)
}

pub async fn list_donations<S>(store: &S, invitation_id: Uuid) -> Result<Vec<Donation>, ApiError>
where
    S: DonationStore + ?Sized,
{
    Ok(store.list_donations(invitation_id).await?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::{
        db::{InvitationStore, MemoryStore},
        models::{DonationStatus, Invitation},
    };

    fn donor() -> Donor {
        Donor { name: "Grandma".into(), email: Some("grandma@example.com".into()) }
    }

    async fn seeded(target_cents: i64) -> (Arc<MemoryStore>, Uuid) {
        let store = Arc::new(MemoryStore::default());
        let start = Utc::now() + Duration::days(7);
        let invitation = Invitation {
            id: Uuid::new_v4(),
            child_name: "Mia".into(),
            event_date: start,
            event_end_time: start + Duration::hours(2),
            event_location: "Park".into(),
            charity_name: "Save the Bees".into(),
            gift_fund_target: Money::from_cents(target_cents),
            current_gift_fund: Money::ZERO,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            rsvps: vec![],
        };
        let id = invitation.id;
        store.create_invitation(invitation).await.unwrap();
        (store, id)
    }

    async fn total(store: &MemoryStore, id: Uuid) -> Money {
        store.get_invitation(id).await.unwrap().unwrap().current_gift_fund
    }

    #[tokio::test]
    async fn fifty_dollar_donation_credits_five() {
        let (store, id) = seeded(50_000).await;
        let donation = record_donation(store.as_ref(), id, Money::from_cents(5_000), donor(), "pi_1".into())
            .await
            .unwrap();

        assert_eq!(donation.status, DonationStatus::Completed);
        assert_eq!(donation.gift_fund_amount, Money::from_cents(500));
        assert_eq!(donation.charity_amount, Money::from_cents(4_500));
        assert_eq!(total(&store, id).await, Money::from_cents(500));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_donations_never_lose_updates() {
        let (store, id) = seeded(50_000).await;
        let amounts: Vec<i64> = (1..=40).map(|i| i * 137).collect();
        let expected: i64 = amounts.iter().map(|a| Money::from_cents(*a).allocate().gift_fund.cents()).sum();

        let tasks: Vec<_> = amounts
            .into_iter()
            .map(|cents| {
                let store = store.clone();
                tokio::spawn(async move {
                    record_donation(store.as_ref(), id, Money::from_cents(cents), donor(), format!("pi_{cents}")).await
                })
            })
            .collect();
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(total(&store, id).await, Money::from_cents(expected));
        assert_eq!(list_donations(store.as_ref(), id).await.unwrap().len(), 40);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn two_twenty_dollar_donations_make_four() {
        let (store, id) = seeded(50_000).await;
        let a = record_donation(store.as_ref(), id, Money::from_cents(2_000), donor(), "pi_a".into());
        let b = record_donation(store.as_ref(), id, Money::from_cents(2_000), donor(), "pi_b".into());
        let (a, b) = futures::join!(a, b);
        a.unwrap();
        b.unwrap();
        assert_eq!(total(&store, id).await, Money::from_cents(400));
    }

    #[tokio::test]
    async fn unknown_invitation_writes_nothing() {
        let (store, id) = seeded(10_000).await;
        let missing = Uuid::new_v4();
        let err = record_donation(store.as_ref(), missing, Money::from_cents(1_000), donor(), "pi_x".into())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(list_donations(store.as_ref(), missing).await.unwrap().is_empty());
        assert_eq!(total(&store, id).await, Money::ZERO);
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let (store, id) = seeded(10_000).await;
        let err = record_donation(store.as_ref(), id, Money::ZERO, donor(), "pi_0".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(list_donations(store.as_ref(), id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn amount_above_gateway_limit_is_rejected() {
        let (store, id) = seeded(10_000).await;
        let too_much = Money::from_cents(crate::money::MAX_AMOUNT_CENTS + 1);
        let err = record_donation(store.as_ref(), id, too_much, donor(), "pi_big".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(total(&store, id).await, Money::ZERO);
    }

    #[tokio::test]
    async fn listing_keeps_insertion_order() {
        let (store, id) = seeded(10_000).await;
        assert!(list_donations(store.as_ref(), id).await.unwrap().is_empty());
        for reference in ["pi_1", "pi_2", "pi_3"] {
            record_donation(store.as_ref(), id, Money::from_cents(1_000), donor(), reference.into())
                .await
                .unwrap();
        }
        let references: Vec<String> = list_donations(store.as_ref(), id)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.payment_reference)
            .collect();
        assert_eq!(references, vec!["pi_1", "pi_2", "pi_3"]);
    }
}
