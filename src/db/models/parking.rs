//! Active parking session models.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeSet;

use super::common::now_timestamp;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParkingSession {
    pub user_id: i64,
    pub vehicle_type: String,
    pub predicted_label: String,
    pub lot_no: i64,
    pub duration: f64,
    pub session_start: String,
    pub total_charge: f64,
}

/// Parking session about to be stored
#[derive(Debug, Clone)]
pub struct NewParkingSession {
    pub user_id: i64,
    pub vehicle_type: String,
    pub predicted_label: String,
    pub lot_no: u16,
    pub duration: f64,
    pub total_charge: f64,
}

/// Result of trying to store a parking session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored; carries the session start timestamp
    Inserted(String),
    /// The user already has an active session
    AlreadyParked,
    /// Another session holds the lot
    LotTaken,
}

impl ParkingSession {
    pub async fn find_active(
        db: &SqlitePool,
        user_id: i64,
    ) -> Result<Option<ParkingSession>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM parkingDetails WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(db)
            .await
    }

    /// Store a session in one statement. Uniqueness of user and lot is left to
    /// the table constraints so concurrent requests cannot both succeed.
    pub async fn insert(
        db: &SqlitePool,
        session: &NewParkingSession,
    ) -> Result<InsertOutcome, sqlx::Error> {
        let session_start = now_timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO parkingDetails (user_id, vehicle_type, predicted_label, lot_no, duration, session_start, total_charge)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(session.user_id)
        .bind(&session.vehicle_type)
        .bind(&session.predicted_label)
        .bind(i64::from(session.lot_no))
        .bind(session.duration)
        .bind(&session_start)
        .bind(session.total_charge)
        .execute(db)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted(session_start)),
            Err(e) if crate::db::is_unique_violation(&e, "parkingDetails", "user_id") => {
                Ok(InsertOutcome::AlreadyParked)
            }
            Err(e) if crate::db::is_unique_violation(&e, "parkingDetails", "lot_no") => {
                Ok(InsertOutcome::LotTaken)
            }
            Err(e) => Err(e),
        }
    }

    /// Lot numbers held by any active session
    pub async fn list_occupied_slots(db: &SqlitePool) -> Result<BTreeSet<u16>, sqlx::Error> {
        let lots: Vec<i64> = sqlx::query_scalar("SELECT lot_no FROM parkingDetails")
            .fetch_all(db)
            .await?;

        Ok(lots
            .into_iter()
            .filter_map(|lot| u16::try_from(lot).ok())
            .collect())
    }

    pub async fn count(db: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM parkingDetails")
            .fetch_one(db)
            .await
    }
}
