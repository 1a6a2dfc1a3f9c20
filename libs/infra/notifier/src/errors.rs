use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("network delivery failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("channel returned non-success status {0}")]
    Rejected(reqwest::StatusCode),

    #[error("delivery timed out")]
    Timeout,

    #[error("channel is suppressed by cool-down or disabled state")]
    Suppressed,

    #[error("store error: {0}")]
    Store(#[from] lunasentri_infra_store::StoreError),
}
