mod feed;
mod inbound;
mod outbound;

pub use feed::*;
pub use inbound::*;
pub use outbound::*;
