/// Errors raised by the shared helpers themselves.
///
/// Store failures have their own `StoreError`; Redis failures never surface because the
/// cache degrades to misses. Server crates wrap both in their `AppError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("invalid phone number: '{0}'")]
    InvalidPhone(String),
}
