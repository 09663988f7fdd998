//! Command implementations

pub mod backup;
pub mod verify;
pub mod version;
