use crate::*;
use async_trait::async_trait;

#[async_trait]
pub trait VehiclePositionInbound: Send + Sync {
    /// Appends a single position, storing a report that already exists is a no-op.
    async fn add_vehicle_position(&self, position: &NewVehiclePosition) -> CoreResult<()>;
}
