//! Database models split into domain-specific modules.

pub mod activity;
pub mod playlist;
pub mod song;
pub mod user;

pub use activity::*;
pub use playlist::*;
pub use song::*;
pub use user::*;
