use catalog_common::error::CommonError;
use catalog_common::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("validation failed: {0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Common(#[from] CommonError),
}
