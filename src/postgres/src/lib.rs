#![deny(rust_2018_idioms)]

mod adapter;
mod error;
mod models;
mod queries;
#[cfg(feature = "test")]
mod test_db;

pub use adapter::PostgresAdapter;
pub use error::{Error, Result};
#[cfg(feature = "test")]
pub use test_db::TestDb;
