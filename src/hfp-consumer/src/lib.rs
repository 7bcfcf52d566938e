#![deny(rust_2018_idioms)]

//! Ingests vehicle positions from the HFP feed during bounded time windows.

pub mod error;
pub mod models;
pub mod mqtt;
pub mod session;
pub mod settings;
pub mod subscription;

pub use error::*;
pub use models::decode;
pub use mqtt::MqttFeed;
pub use session::*;
pub use settings::FeedSettings;
pub use subscription::*;
