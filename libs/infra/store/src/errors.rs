use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(#[from] libsql::Error),

    #[error("row mapping failed: {0}")]
    Mapping(String),

    #[error("operator not found")]
    OperatorNotFound,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("machine not found")]
    MachineNotFound,

    #[error("rule not found")]
    RuleNotFound,

    #[error("event not found")]
    EventNotFound,

    #[error("channel not found")]
    ChannelNotFound,

    #[error("cannot delete the last admin")]
    LastAdminProtected,
}
