use deadpool_redis::Pool;
use deadpool_redis::redis::{self, AsyncCommands};

use crate::domain::repository::FailedLoginTracker;
use crate::error::AuthServiceError;

/// Failed-login counters in Redis. Every failure refreshes the TTL, so the
/// lock lifts `ttl_secs` after the last failed attempt.
#[derive(Clone)]
pub struct RedisFailedLoginTracker {
    pub pool: Pool,
    pub threshold: u64,
    pub ttl_secs: u64,
}

fn failed_login_key(identifier: &str) -> String {
    format!("failed_login:{}", identifier.trim().to_lowercase())
}

impl FailedLoginTracker for RedisFailedLoginTracker {
    async fn record_failure(&self, identifier: &str) -> Result<u64, AuthServiceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?;
        let key = failed_login_key(identifier);
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .incr(&key, 1u64)
            .expire(&key, self.ttl_secs as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e: redis::RedisError| AuthServiceError::Internal(e.into()))?;
        Ok(count)
    }

    async fn is_locked(&self, identifier: &str) -> Result<bool, AuthServiceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?;
        let count: Option<u64> = conn
            .get(failed_login_key(identifier))
            .await
            .map_err(|e: redis::RedisError| AuthServiceError::Internal(e.into()))?;
        Ok(count.unwrap_or(0) >= self.threshold)
    }

    async fn reset(&self, identifier: &str) -> Result<(), AuthServiceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?;
        let (): () = conn
            .del(failed_login_key(identifier))
            .await
            .map_err(|e: redis::RedisError| AuthServiceError::Internal(e.into()))?;
        Ok(())
    }

    fn threshold(&self) -> u64 {
        self.threshold
    }
}
