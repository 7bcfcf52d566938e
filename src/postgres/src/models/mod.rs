mod vehicle_position;

pub use vehicle_position::*;
