use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    models::{Attendance, Invitation, RsvpEntry},
    money::Money,
    PGPool,
};

use super::{InvitationStore, PgStore, StoreError};

const INVITATION_COLUMNS: &str = "id, child_name, event_date, event_end_time, event_location, \
    charity_name, gift_fund_target_cents, current_gift_fund_cents, created_by, created_at";

#[derive(Debug, FromRow)]
struct InvitationRow {
    id: Uuid,
    child_name: String,
    event_date: DateTime<Utc>,
    event_end_time: DateTime<Utc>,
    event_location: String,
    charity_name: String,
    gift_fund_target_cents: i64,
    current_gift_fund_cents: i64,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl InvitationRow {
    fn into_invitation(self, rsvps: Vec<RsvpEntry>) -> Invitation {
        Invitation {
            id: self.id,
            child_name: self.child_name,
            event_date: self.event_date,
            event_end_time: self.event_end_time,
            event_location: self.event_location,
            charity_name: self.charity_name,
            gift_fund_target: Money::from_cents(self.gift_fund_target_cents),
            current_gift_fund: Money::from_cents(self.current_gift_fund_cents),
            created_by: self.created_by,
            created_at: self.created_at,
            rsvps,
        }
    }
}

#[derive(Debug, FromRow)]
struct RsvpRow {
    invitation_id: Uuid,
    guest_name: String,
    email: Option<String>,
    attending: bool,
    created_at: DateTime<Utc>,
}

impl From<RsvpRow> for RsvpEntry {
    fn from(row: RsvpRow) -> Self {
        RsvpEntry {
            guest_name: row.guest_name,
            email: row.email,
            attending: Attendance::from(row.attending),
            timestamp: row.created_at,
        }
    }
}

pub async fn create(invitation: &Invitation, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        "INSERT INTO invitations (id, child_name, event_date, event_end_time, event_location,
            charity_name, gift_fund_target_cents, current_gift_fund_cents, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(invitation.id)
    .bind(&invitation.child_name)
    .bind(invitation.event_date)
    .bind(invitation.event_end_time)
    .bind(&invitation.event_location)
    .bind(&invitation.charity_name)
    .bind(invitation.gift_fund_target.cents())
    .bind(invitation.current_gift_fund.cents())
    .bind(invitation.created_by)
    .bind(invitation.created_at)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Option<Invitation>, sqlx::Error> {
    let row = sqlx::query_as::<_, InvitationRow>(&format!(
        "SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(row) => {
            let rsvps = get_rsvps(&[row.id], pool).await?.remove(&row.id).unwrap_or_default();
            Ok(Some(row.into_invitation(rsvps)))
        }
        None => Ok(None),
    }
}

pub async fn get_by_creator(creator: Uuid, pool: &PGPool) -> Result<Vec<Invitation>, sqlx::Error> {
    let rows = sqlx::query_as::<_, InvitationRow>(&format!(
        "SELECT {INVITATION_COLUMNS} FROM invitations WHERE created_by = $1 ORDER BY created_at"
    ))
    .bind(creator)
    .fetch_all(pool)
    .await?;
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut rsvps = get_rsvps(&ids, pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let entries = rsvps.remove(&row.id).unwrap_or_default();
            row.into_invitation(entries)
        })
        .collect())
}

async fn get_rsvps(ids: &[Uuid], pool: &PGPool) -> Result<HashMap<Uuid, Vec<RsvpEntry>>, sqlx::Error> {
    let mut grouped: HashMap<Uuid, Vec<RsvpEntry>> = HashMap::new();
    if ids.is_empty() {
        return Ok(grouped);
    }
    let rows = sqlx::query_as::<_, RsvpRow>(
        "SELECT invitation_id, guest_name, email, attending, created_at
        FROM rsvps WHERE invitation_id = ANY($1) ORDER BY seq",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    for row in rows {
        grouped.entry(row.invitation_id).or_default().push(row.into());
    }
    Ok(grouped)
}

/// Returns the number of rows written: zero when the invitation is unknown.
pub async fn add_rsvp(id: Uuid, entry: &RsvpEntry, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        "INSERT INTO rsvps (invitation_id, guest_name, email, attending, created_at)
        SELECT $1, $2, $3, $4, $5
        WHERE EXISTS (SELECT 1 FROM invitations WHERE id = $1)",
    )
    .bind(id)
    .bind(&entry.guest_name)
    .bind(&entry.email)
    .bind(entry.attending.is_attending())
    .bind(entry.timestamp)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

#[async_trait]
impl InvitationStore for PgStore {
    async fn create_invitation(&self, invitation: Invitation) -> Result<Invitation, StoreError> {
        create(&invitation, &self.pool).await?;
        Ok(invitation)
    }

    async fn get_invitation(&self, id: Uuid) -> Result<Option<Invitation>, StoreError> {
        Ok(get_by_id(id, &self.pool).await?)
    }

    async fn list_invitations_by_owner(&self, owner: Uuid) -> Result<Vec<Invitation>, StoreError> {
        Ok(get_by_creator(owner, &self.pool).await?)
    }

    async fn append_rsvp(&self, id: Uuid, entry: RsvpEntry) -> Result<Invitation, StoreError> {
        if add_rsvp(id, &entry, &self.pool).await? == 0 {
            return Err(StoreError::NotFound("Invitation"));
        }
        get_by_id(id, &self.pool)
            .await?
            .ok_or(StoreError::NotFound("Invitation"))
    }
}
