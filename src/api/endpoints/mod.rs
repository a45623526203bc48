//! API endpoint handlers.

pub mod ask;
pub mod health;
pub mod intake;
pub mod reports;
