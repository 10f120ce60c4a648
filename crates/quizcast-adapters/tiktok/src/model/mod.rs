//! Connector frame model.
//!
//! - [`frame`]: the JSON frames relayed by the connector bridge
//! - [`gift`]: gift streak mapping
//! - [`user`]: versioned user object mapping and avatar resolution

pub mod frame;
pub mod gift;
pub mod user;

pub use frame::Frame;
pub use gift::GiftFrame;
pub use user::{AvatarCandidate, UserInspection, UserSchema};
