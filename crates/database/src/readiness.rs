use crate::error::DbError;
use configuration::ReadinessSettings;
use sqlx::{Connection, PgPool};
use std::future::Future;
use std::time::Duration;

/// Outcome of the startup probe. The probe itself never decides what the
/// process does next; the caller applies its `ReadinessPolicy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready { attempts: u32 },
    Unreachable { attempts: u32, last_error: String },
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready { .. })
    }
}

/// Checks out one pooled connection and pings it, giving up after `timeout`.
pub async fn ping(pool: &PgPool, timeout: Duration) -> Result<(), DbError> {
    let attempt = async {
        let mut conn = pool.acquire().await?;
        conn.ping().await?;
        Ok::<(), DbError>(())
    };

    match tokio::time::timeout(timeout, attempt).await {
        Ok(result) => result,
        Err(_) => Err(DbError::Unavailable(format!(
            "no answer within {}ms",
            timeout.as_millis()
        ))),
    }
}

/// Runs `probe` up to `settings.max_attempts` times, sleeping
/// `settings.interval()` between failures and stopping at the first success.
///
/// Each failure is logged. Exhausting every attempt is reported through the
/// return value, never by panicking or exiting.
pub async fn wait_until_ready<F, Fut>(settings: &ReadinessSettings, mut probe: F) -> Readiness
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), DbError>>,
{
    let max_attempts = settings.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match probe().await {
            Ok(()) => {
                tracing::info!(attempt, "Database is ready.");
                return Readiness::Ready { attempts: attempt };
            }
            Err(e) => {
                tracing::warn!(attempt, max_attempts, error = %e, "Waiting for database...");
                last_error = e.to_string();
            }
        }
        if attempt < max_attempts {
            tokio::time::sleep(settings.interval()).await;
        }
    }

    tracing::error!(attempts = max_attempts, error = %last_error, "Database never became ready.");
    Readiness::Unreachable {
        attempts: max_attempts,
        last_error,
    }
}
