use hfp_core::VehiclePosition;

use crate::{PostgresAdapter, models};

/// Wrapper with additional methods inteded for testing purposes.
#[derive(Debug, Clone)]
pub struct TestDb {
    pub db: PostgresAdapter,
}

impl TestDb {
    pub async fn all_positions(&self) -> Vec<VehiclePosition> {
        sqlx::query_as::<_, models::VehiclePosition>(
            r#"
SELECT
    vehicle_position_id,
    route_number,
    vehicle_number,
    "timestamp",
    speed,
    latitude,
    longitude
FROM
    vehicle_positions
ORDER BY
    vehicle_position_id
            "#,
        )
        .fetch_all(&self.db.pool)
        .await
        .unwrap()
        .into_iter()
        .map(VehiclePosition::from)
        .collect()
    }

    pub async fn clear(&self) {
        sqlx::query("TRUNCATE vehicle_positions")
            .execute(&self.db.pool)
            .await
            .unwrap();
    }
}
