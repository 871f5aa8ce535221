//! # Folio admin console
//!
//! Session login against the configured admin identity plus project
//! management through the gateway.

pub mod client;
pub mod commands;
