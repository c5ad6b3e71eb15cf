pub mod config;
pub mod diff;
pub mod lease;

pub use config::ClientConfig;
pub use diff::{Change, ChangeKind};
pub use lease::*;
