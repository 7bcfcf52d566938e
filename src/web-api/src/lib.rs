#![deny(rust_2018_idioms)]

use hfp_core::{VehiclePositionInbound, VehiclePositionOutbound};
use postgres::PostgresAdapter;

pub mod error;
pub mod response;
pub mod routes;
pub mod settings;
pub mod startup;

pub trait Database:
    VehiclePositionInbound + VehiclePositionOutbound + Clone + Send + Sync + 'static
{
}

impl Database for PostgresAdapter {}

#[cfg(feature = "test")]
impl Database for hfp_core::test_helper::InMemoryStore {}
