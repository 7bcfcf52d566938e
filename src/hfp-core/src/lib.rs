#![deny(rust_2018_idioms)]

//! Domain types, ports and the spatial query engine shared by the hfp crates.

mod distance;
mod domain;
mod error;
mod ports;
mod queries;
mod settings;
mod spatial;

#[cfg(feature = "test")]
pub mod test_helper;

pub use distance::*;
pub use domain::*;
pub use error::*;
pub use ports::*;
pub use queries::*;
pub use settings::*;
pub use spatial::*;
