//! Issue report models.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::now_timestamp;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IssueReport {
    pub user_id: i64,
    pub lot_no: i64,
    pub vehicle_type: String,
    pub predicted_label: String,
    pub description: String,
    pub created_at: String,
}

impl IssueReport {
    pub async fn has_report(db: &SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT user_id FROM parkingReports WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(db)
                .await?;
        Ok(found.is_some())
    }

    pub async fn find_by_user(
        db: &SqlitePool,
        user_id: i64,
    ) -> Result<Option<IssueReport>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM parkingReports WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(db)
            .await
    }

    /// Store a report. Returns `None` if the user already filed one.
    pub async fn insert(
        db: &SqlitePool,
        user_id: i64,
        lot_no: u16,
        vehicle_type: &str,
        predicted_label: &str,
        description: &str,
    ) -> Result<Option<IssueReport>, sqlx::Error> {
        let report = IssueReport {
            user_id,
            lot_no: i64::from(lot_no),
            vehicle_type: vehicle_type.to_string(),
            predicted_label: predicted_label.to_string(),
            description: description.to_string(),
            created_at: now_timestamp(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO parkingReports (user_id, lot_no, vehicle_type, predicted_label, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(report.user_id)
        .bind(report.lot_no)
        .bind(&report.vehicle_type)
        .bind(&report.predicted_label)
        .bind(&report.description)
        .bind(&report.created_at)
        .execute(db)
        .await;

        match result {
            Ok(_) => Ok(Some(report)),
            Err(e) if crate::db::is_unique_violation(&e, "parkingReports", "user_id") => Ok(None),
            Err(e) => Err(e),
        }
    }
}
