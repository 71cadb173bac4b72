//! Policy rulebases.

pub mod nat;
pub mod security;

pub use nat::NatRule;
pub use security::{SecurityProfiles, SecurityRule};
