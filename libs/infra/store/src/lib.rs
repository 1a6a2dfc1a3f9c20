//! Persistence layer for the LunaSentri control plane, backed by libSQL.
//!
//! A [`StoreClient`] owns the underlying database handle; repositories
//! borrow a cheap clone of it and translate rows to and from the
//! `lunasentri-domain-models` types. Schema application is idempotent and
//! runs once at connect time.

mod client;
mod errors;
mod repositories;
mod rows;
mod schema;

pub use client::StoreClient;
pub use errors::StoreError;
pub use repositories::{
    AlertEventRepository, AlertRuleRepository, ChannelRepository, MachineRepository,
    OperatorRepository, SampleRepository,
};
