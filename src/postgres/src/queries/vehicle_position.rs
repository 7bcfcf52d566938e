use hfp_core::{Coordinates, MaxSpeedQuery, NewVehiclePosition};
use snafu::ResultExt;

use crate::{
    PostgresAdapter,
    error::{Result, error::QuerySnafu},
    models::{ClosestVehicle, MaxSpeedNearPoint, RouteAverageSpeed},
};

impl PostgresAdapter {
    pub(crate) async fn add_vehicle_position_impl(
        &self,
        position: &NewVehiclePosition,
    ) -> Result<()> {
        sqlx::query(
            r#"
INSERT INTO
    vehicle_positions (
        route_number,
        vehicle_number,
        "timestamp",
        speed,
        latitude,
        longitude
    )
VALUES
    ($1, $2, $3, $4, $5, $6)
ON CONFLICT (route_number, vehicle_number, "timestamp") DO NOTHING
            "#,
        )
        .bind(&position.route_id)
        .bind(&position.vehicle_id)
        .bind(position.observed_at)
        .bind(position.speed)
        .bind(position.latitude)
        .bind(position.longitude)
        .execute(&self.pool)
        .await
        .context(QuerySnafu)?;

        Ok(())
    }

    pub(crate) async fn closest_vehicles_impl(
        &self,
        point: &Coordinates,
        limit: u32,
    ) -> Result<Vec<ClosestVehicle>> {
        sqlx::query_as::<_, ClosestVehicle>(
            r#"
SELECT
    vehicle_position_id,
    route_number,
    vehicle_number,
    "timestamp",
    speed,
    latitude,
    longitude,
    ST_Distance (
        "location",
        ST_SetSRID (ST_MakePoint ($2, $1), 4326)::geography
    ) AS distance
FROM
    vehicle_positions
ORDER BY
    distance ASC,
    vehicle_number ASC,
    route_number ASC,
    "timestamp" DESC
LIMIT
    $3
            "#,
        )
        .bind(point.latitude())
        .bind(point.longitude())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context(QuerySnafu)
    }

    pub(crate) async fn unique_closest_vehicles_impl(
        &self,
        point: &Coordinates,
        limit: u32,
    ) -> Result<Vec<ClosestVehicle>> {
        sqlx::query_as::<_, ClosestVehicle>(
            r#"
SELECT
    *
FROM
    (
        SELECT DISTINCT
            ON (vehicle_number) vehicle_position_id,
            route_number,
            vehicle_number,
            "timestamp",
            speed,
            latitude,
            longitude,
            ST_Distance (
                "location",
                ST_SetSRID (ST_MakePoint ($2, $1), 4326)::geography
            ) AS distance
        FROM
            vehicle_positions
        ORDER BY
            vehicle_number,
            distance ASC,
            route_number ASC,
            "timestamp" DESC
    ) q
ORDER BY
    distance ASC,
    vehicle_number ASC
LIMIT
    $3
            "#,
        )
        .bind(point.latitude())
        .bind(point.longitude())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context(QuerySnafu)
    }

    pub(crate) async fn max_speeds_near_point_impl(
        &self,
        query: &MaxSpeedQuery,
    ) -> Result<Vec<MaxSpeedNearPoint>> {
        let routes: Vec<&str> = query.routes.iter().map(|r| r.as_str()).collect();

        sqlx::query_as::<_, MaxSpeedNearPoint>(
            r#"
SELECT
    route_number,
    vehicle_number,
    MAX(speed) AS max_speed,
    (
        EXTRACT(
            EPOCH
            FROM
                ($5::TIMESTAMPTZ - "timestamp")
        ) * 1000
    )::BIGINT AS milliseconds_ago,
    MIN(
        ST_Distance (
            "location",
            ST_SetSRID (ST_MakePoint ($2, $1), 4326)::geography
        )
    ) AS distance
FROM
    vehicle_positions
WHERE
    route_number = ANY ($4::TEXT[])
    AND ST_DWithin (
        "location",
        ST_SetSRID (ST_MakePoint ($2, $1), 4326)::geography,
        $3
    )
GROUP BY
    route_number,
    vehicle_number,
    "timestamp",
    latitude,
    longitude
ORDER BY
    max_speed DESC,
    distance ASC,
    vehicle_number ASC
            "#,
        )
        .bind(query.point.latitude())
        .bind(query.point.longitude())
        .bind(query.radius_meters)
        .bind(&routes)
        .bind(query.evaluated_at)
        .fetch_all(&self.pool)
        .await
        .context(QuerySnafu)
    }

    pub(crate) async fn average_speed_per_route_impl(&self) -> Result<Vec<RouteAverageSpeed>> {
        sqlx::query_as::<_, RouteAverageSpeed>(
            r#"
SELECT
    route_number,
    AVG(speed) AS average_speed
FROM
    vehicle_positions
GROUP BY
    route_number
ORDER BY
    route_number
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context(QuerySnafu)
    }
}
