use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::Rider;

/// Claims the first available rider by flipping their availability in the same statement that selects them. Two
/// concurrent orders can therefore never claim the same rider: the second UPDATE matches zero rows and returns
/// `None`. Selection is deliberately "first available found" with no proximity or load weighting.
pub async fn claim_available_rider(conn: &mut SqliteConnection) -> Result<Option<Rider>, sqlx::Error> {
    let rider: Option<Rider> = sqlx::query_as(
        r#"
        UPDATE riders SET is_available = 0
        WHERE id = (SELECT id FROM riders WHERE is_available = 1 ORDER BY id ASC LIMIT 1)
        RETURNING *"#,
    )
    .fetch_optional(conn)
    .await?;
    if let Some(r) = &rider {
        debug!("🗃️ Rider {} ({}) claimed for dispatch", r.id, r.display_name);
    }
    Ok(rider)
}

pub async fn fetch_rider(rider_id: i64, conn: &mut SqliteConnection) -> Result<Option<Rider>, sqlx::Error> {
    let rider = sqlx::query_as("SELECT * FROM riders WHERE id = $1").bind(rider_id).fetch_optional(conn).await?;
    Ok(rider)
}
