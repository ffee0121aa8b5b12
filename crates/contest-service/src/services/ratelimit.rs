//! Per-user fixed-window rate limiting

use std::time::Duration;

use contest_core::UserId;
use tracing::{debug, instrument};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::keys;

/// Rate limiter backed by the ephemeral store
pub struct RateLimiter<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RateLimiter<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Count one call of `action` by `user`
    ///
    /// # Errors
    /// Returns `ServiceError::RateLimited` once the window's budget is spent
    #[instrument(skip(self))]
    pub async fn check(&self, user: UserId, action: &str) -> ServiceResult<()> {
        let limits = &self.ctx.config().limits;
        let window = Duration::from_secs(limits.rate_limit_window_secs.max(1));

        let calls = self
            .ctx
            .ephemeral()
            .incr_window(&keys::rate(action, user), window)
            .await?;

        if calls > limits.rate_limit_max_calls {
            debug!(calls, "Rate limit hit");
            return Err(ServiceError::RateLimited {
                retry_after_secs: window.as_secs(),
            });
        }
        Ok(())
    }
}
