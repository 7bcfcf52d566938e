use async_trait::async_trait;
use hfp_core::{
    ClosestVehicle, Coordinates, CoreResult, MaxSpeedNearPoint, MaxSpeedQuery, NewVehiclePosition,
    PsqlLogStatements, PsqlSettings, RouteAverageSpeed, VehiclePositionInbound,
    VehiclePositionOutbound,
};
use snafu::ResultExt;
use sqlx::{
    ConnectOptions, PgPool,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};
use tracing::{info, instrument};

use crate::error::{
    Result,
    error::{ConnectionSnafu, MigrationSnafu},
};

#[derive(Debug, Clone)]
pub struct PostgresAdapter {
    pub(crate) pool: PgPool,
}

impl PostgresAdapter {
    pub async fn new(settings: &PsqlSettings) -> Result<PostgresAdapter> {
        let mut opts = PgConnectOptions::new()
            .username(&settings.username)
            .password(&settings.password)
            .host(&settings.ip)
            .port(settings.port);

        if let Some(db_name) = &settings.db_name {
            opts = opts.database(db_name);
        }

        if let Some(root_cert_path) = &settings.root_cert {
            opts = opts
                .ssl_root_cert(root_cert_path)
                .ssl_mode(PgSslMode::VerifyFull);
        }

        match settings.log_statements {
            PsqlLogStatements::Enable => (),
            PsqlLogStatements::Disable => {
                opts = opts.disable_statement_logging();
            }
        }

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .connect_with(opts)
            .await
            .context(ConnectionSnafu)?;

        Ok(PostgresAdapter { pool })
    }

    #[instrument(skip_all)]
    pub async fn do_migrations(&self) -> Result<()> {
        sqlx::migrate!()
            .set_ignore_missing(true)
            .run(&self.pool)
            .await
            .context(MigrationSnafu)?;

        info!("database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl VehiclePositionInbound for PostgresAdapter {
    async fn add_vehicle_position(&self, position: &NewVehiclePosition) -> CoreResult<()> {
        Ok(self.add_vehicle_position_impl(position).await?)
    }
}

#[async_trait]
impl VehiclePositionOutbound for PostgresAdapter {
    async fn closest_vehicles(
        &self,
        point: &Coordinates,
        limit: u32,
    ) -> CoreResult<Vec<ClosestVehicle>> {
        Ok(self
            .closest_vehicles_impl(point, limit)
            .await?
            .into_iter()
            .map(ClosestVehicle::from)
            .collect())
    }

    async fn unique_closest_vehicles(
        &self,
        point: &Coordinates,
        limit: u32,
    ) -> CoreResult<Vec<ClosestVehicle>> {
        Ok(self
            .unique_closest_vehicles_impl(point, limit)
            .await?
            .into_iter()
            .map(ClosestVehicle::from)
            .collect())
    }

    async fn max_speeds_near_point(
        &self,
        query: &MaxSpeedQuery,
    ) -> CoreResult<Vec<MaxSpeedNearPoint>> {
        Ok(self
            .max_speeds_near_point_impl(query)
            .await?
            .into_iter()
            .map(MaxSpeedNearPoint::from)
            .collect())
    }

    async fn average_speed_per_route(&self) -> CoreResult<Vec<RouteAverageSpeed>> {
        Ok(self
            .average_speed_per_route_impl()
            .await?
            .into_iter()
            .map(RouteAverageSpeed::from)
            .collect())
    }
}
