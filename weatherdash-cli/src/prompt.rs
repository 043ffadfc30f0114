use anyhow::Result;
use inquire::{InquireError, error::InquireResult};

/// Run a blocking `inquire` prompt off the async runtime.
///
/// Returns `None` when the user cancels with Esc or Ctrl-C.
pub async fn prompt<T, F>(ask: F) -> Result<Option<T>>
where
    F: FnOnce() -> InquireResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(ask).await? {
        Ok(answer) => Ok(Some(answer)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}
