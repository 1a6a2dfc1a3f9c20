pub mod alerts;
pub mod auth;
pub mod machines;
pub mod metrics;
pub mod notifications;
pub mod ws;
