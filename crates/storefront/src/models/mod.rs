//! Per-visitor state kept in the session.

pub mod flash;
pub mod session;

pub use flash::{Flash, FlashKind};
pub use session::keys as session_keys;
