use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    models::{Donation, DonationStatus, Donor},
    money::Money,
    PGPool,
};

use super::{DonationStore, PgStore, StoreError};

#[derive(Debug, FromRow)]
struct DonationRow {
    id: Uuid,
    invitation_id: Uuid,
    donor_name: String,
    donor_email: Option<String>,
    amount_cents: i64,
    charity_cents: i64,
    gift_fund_cents: i64,
    payment_reference: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<DonationRow> for Donation {
    type Error = StoreError;

    fn try_from(row: DonationRow) -> Result<Self, Self::Error> {
        let status = DonationStatus::parse(&row.status)
            .ok_or_else(|| StoreError::Backend(format!("unknown donation status '{}'", row.status)))?;
        Ok(Donation {
            id: row.id,
            invitation: row.invitation_id,
            donor: Donor {
                name: row.donor_name,
                email: row.donor_email,
            },
            amount: Money::from_cents(row.amount_cents),
            charity_amount: Money::from_cents(row.charity_cents),
            gift_fund_amount: Money::from_cents(row.gift_fund_cents),
            payment_reference: row.payment_reference,
            status,
            created_at: row.created_at,
        })
    }
}

/// Inserts the donation and bumps the invitation's gift fund inside one
/// transaction. The increment is done by the database, never read-modify-write.
pub async fn insert_and_credit(donation: &Donation, pool: &PGPool) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;

    let credited = sqlx::query(
        "UPDATE invitations
        SET current_gift_fund_cents = current_gift_fund_cents + $1
        WHERE id = $2",
    )
    .bind(donation.gift_fund_amount.cents())
    .bind(donation.invitation)
    .execute(&mut *tx)
    .await?;

    if credited.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(StoreError::NotFound("Invitation"));
    }

    sqlx::query(
        "INSERT INTO donations (id, invitation_id, donor_name, donor_email, amount_cents,
            charity_cents, gift_fund_cents, payment_reference, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(donation.id)
    .bind(donation.invitation)
    .bind(&donation.donor.name)
    .bind(&donation.donor.email)
    .bind(donation.amount.cents())
    .bind(donation.charity_amount.cents())
    .bind(donation.gift_fund_amount.cents())
    .bind(&donation.payment_reference)
    .bind(donation.status.as_str())
    .bind(donation.created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn get_by_invitation(invitation_id: Uuid, pool: &PGPool) -> Result<Vec<Donation>, StoreError> {
    let rows = sqlx::query_as::<_, DonationRow>(
        "SELECT id, invitation_id, donor_name, donor_email, amount_cents, charity_cents,
            gift_fund_cents, payment_reference, status, created_at
        FROM donations WHERE invitation_id = $1 ORDER BY seq",
    )
    .bind(invitation_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Donation::try_from).collect()
}

#[async_trait]
impl DonationStore for PgStore {
    async fn insert_and_credit(&self, donation: Donation) -> Result<Donation, StoreError> {
        insert_and_credit(&donation, &self.pool).await?;
        Ok(donation)
    }

    async fn list_donations(&self, invitation_id: Uuid) -> Result<Vec<Donation>, StoreError> {
        get_by_invitation(invitation_id, &self.pool).await
    }
}
