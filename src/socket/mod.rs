pub mod hub;
pub mod protocol;
pub mod session;

pub use hub::SocketHub;
pub use protocol::{Notification, ServerEvent};
