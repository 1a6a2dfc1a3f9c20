//! Shared entity and DTO definitions for the LunaSentri control plane.
//!
//! This crate holds no behavior — only the shapes that cross crate and
//! wire boundaries. Validation and state transitions live in the crates
//! that own them (`lunasentri-core-identity`, `lunasentri-domain-alerts`).

pub mod alert;
pub mod channel;
pub mod machine;
pub mod operator;
pub mod sample;

pub use alert::{AlertEvent, AlertRule, Comparator};
pub use channel::{ChannelState, ChatChannel, DeliveryChannel, WebhookChannel};
pub use machine::{Machine, MachineStatus, SystemInfo};
pub use operator::{Operator, OperatorProfile, Session};
pub use sample::MetricSample;
