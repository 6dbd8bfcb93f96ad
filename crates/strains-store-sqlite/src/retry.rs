//! Bounded retries for the strict-create path.
//!
//! A create can lose a race for the SQLite write lock; a busy or locked
//! database is retried a fixed number of times. Every other failure (domain
//! errors, constraint violations, bind errors) is returned on the first
//! occurrence. When the budget runs out the last failure is returned wrapped in
//! [`Error::RetriesExhausted`].

use std::{future::Future, time::Duration};

use rusqlite::ErrorCode;

use crate::{Error, Result};

/// Base delay between attempts; attempt `n` waits `n` times this.
const BACKOFF_STEP: Duration = Duration::from_millis(20);

fn is_transient(e: &Error) -> bool {
  match e {
    Error::Database(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqliteFailure(failure, _),
    )) => matches!(
      failure.code,
      ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
    ),
    _ => false,
  }
}

/// Run `op` once, then up to `max_retries` more times while it fails with a
/// transient error. `op` receives the 1-based attempt number.
pub(crate) async fn with_retries<T, F, Fut>(
  max_retries: u32,
  mut op: F,
) -> Result<T>
where
  F: FnMut(u32) -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let max_attempts = max_retries.saturating_add(1);
  let mut attempt = 0;

  loop {
    attempt += 1;
    let error = match op(attempt).await {
      Ok(value) => return Ok(value),
      Err(e) if !is_transient(&e) => return Err(e),
      Err(e) => e,
    };

    tracing::warn!(attempt, max_attempts, %error, "create attempt failed");
    if attempt >= max_attempts {
      return Err(Error::RetriesExhausted { attempts: attempt, source: Box::new(error) });
    }
    tokio::time::sleep(BACKOFF_STEP * attempt).await;
  }
}
