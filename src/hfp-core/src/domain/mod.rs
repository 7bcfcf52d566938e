mod coordinates;
mod feed;
mod vehicle;

pub use coordinates::*;
pub use feed::*;
pub use vehicle::*;
