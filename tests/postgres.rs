//! Runs the Postgres store against a real database.
//!
//! Skipped unless `TEST_DATABASE_URL` points at a scratch database; the
//! migrations are applied on connect.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use charity_invites::{
    db::{init_db_pool, DonationStore, InvitationStore, PgStore, StoreError, UserStore},
    models::{Donation, Donor, Invitation, User},
    money::Money,
};

async fn store() -> Option<Arc<PgStore>> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = init_db_pool(&url, 5).await.expect("test database reachable");
    Some(Arc::new(PgStore { pool }))
}

async fn seeded(store: &PgStore) -> Invitation {
    let owner = store
        .create_user(User {
            id: Uuid::new_v4(),
            name: "Parent".into(),
            email: format!("{}@example.com", Uuid::new_v4()),
            pwd_hash: "sha3-256$00$00".into(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    let start = Utc::now() + Duration::days(3);
    store
        .create_invitation(Invitation {
            id: Uuid::new_v4(),
            child_name: "Mia".into(),
            event_date: start,
            event_end_time: start + Duration::hours(2),
            event_location: "Park".into(),
            charity_name: "Save the Bees".into(),
            gift_fund_target: Money::from_cents(50_000),
            current_gift_fund: Money::ZERO,
            created_by: owner.id,
            created_at: Utc::now(),
            rsvps: vec![],
        })
        .await
        .unwrap()
}

fn donation(invitation: Uuid, cents: i64, reference: &str) -> Donation {
    let donor = Donor { name: "Grandma".into(), email: None };
    Donation::new(invitation, donor, Money::from_cents(cents), reference.to_string()).completed()
}

async fn total(store: &PgStore, id: Uuid) -> Money {
    store.get_invitation(id).await.unwrap().unwrap().current_gift_fund
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_credits_are_not_lost() {
    let Some(store) = store().await else { return };
    let invitation = seeded(&store).await;

    let a = tokio::spawn({
        let store = store.clone();
        async move { store.insert_and_credit(donation(invitation.id, 2_000, "pi_a")).await }
    });
    let b = tokio::spawn({
        let store = store.clone();
        async move { store.insert_and_credit(donation(invitation.id, 2_000, "pi_b")).await }
    });
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(total(&store, invitation.id).await, Money::from_cents(400));
    assert_eq!(store.list_donations(invitation.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_invitation_rolls_back() {
    let Some(store) = store().await else { return };
    let missing = Uuid::new_v4();

    let err = store.insert_and_credit(donation(missing, 2_000, "pi_x")).await.unwrap_err();
    assert_eq!(err, StoreError::NotFound("Invitation"));
    assert!(store.list_donations(missing).await.unwrap().is_empty());
}

#[tokio::test]
async fn inconsistent_split_is_refused_and_total_untouched() {
    let Some(store) = store().await else { return };
    let invitation = seeded(&store).await;

    let mut broken = donation(invitation.id, 2_000, "pi_bad");
    broken.charity_amount = Money::from_cents(1_000);
    let err = store.insert_and_credit(broken).await.unwrap_err();
    assert!(matches!(err, StoreError::Backend(_)));

    assert_eq!(total(&store, invitation.id).await, Money::ZERO);
    assert!(store.list_donations(invitation.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_keys_map_by_constraint() {
    let Some(store) = store().await else { return };
    let invitation = seeded(&store).await;

    let first = donation(invitation.id, 2_000, "pi_1");
    store.insert_and_credit(first.clone()).await.unwrap();
    let err = store.insert_and_credit(first).await.unwrap_err();
    assert!(matches!(err, StoreError::Backend(_)));
    assert_eq!(total(&store, invitation.id).await, Money::from_cents(200));

    let email = format!("{}@example.com", Uuid::new_v4());
    let user = |id| User {
        id,
        name: "Ada".into(),
        email: email.clone(),
        pwd_hash: "sha3-256$00$00".into(),
        created_at: Utc::now(),
    };
    store.create_user(user(Uuid::new_v4())).await.unwrap();
    let err = store.create_user(user(Uuid::new_v4())).await.unwrap_err();
    assert_eq!(err, StoreError::Conflict("User already exists".into()));
}
