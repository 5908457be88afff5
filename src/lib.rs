//! WhatsApp feedback service: rating intake, replies, and support-team alerts.

pub mod channels;
pub mod config;
pub mod error;
pub mod feedback;
pub mod logging;
pub mod server;
