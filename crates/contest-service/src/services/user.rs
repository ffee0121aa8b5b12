//! User service
//!
//! Handles first contact with the bot, referral rewards and point spending.

use contest_core::entities::User;
use contest_core::{DomainError, UserId};
use tracing::{info, instrument};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// User service
pub struct UserService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> UserService<'a> {
    /// Create a new UserService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register the user on first contact
    ///
    /// The referrer is credited once, when the user is new and the referrer
    /// is a known user. Returns whether the user was created.
    #[instrument(skip(self, display_name))]
    pub async fn ensure_user(
        &self,
        id: UserId,
        display_name: &str,
        referrer: Option<UserId>,
    ) -> ServiceResult<bool> {
        let user = User::new(id, display_name.to_string()).with_referrer(referrer);
        let created = self.ctx.user_repo().create_if_absent(&user).await?;

        if let (true, Some(referrer_id)) = (created, user.referrer_id) {
            if self.ctx.user_repo().find_by_id(referrer_id).await?.is_some() {
                let points = self.ctx.config().limits.referral_points;
                self.ctx.user_repo().add_points(referrer_id, points).await?;
                info!(user_id = %id, referrer_id = %referrer_id, points, "Referral credited");
            }
        }

        Ok(created)
    }

    /// Get a user by id
    #[instrument(skip(self))]
    pub async fn get(&self, id: UserId) -> ServiceResult<User> {
        self.ctx
            .user_repo()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    /// Spend reward points
    ///
    /// # Errors
    /// Returns `InsufficientPoints` when the balance does not cover `points`
    #[instrument(skip(self))]
    pub async fn spend_points(&self, id: UserId, points: i64) -> ServiceResult<()> {
        if points <= 0 {
            return Err(ServiceError::validation("points must be positive"));
        }
        if !self.ctx.user_repo().spend_points(id, points).await? {
            return Err(DomainError::InsufficientPoints.into());
        }
        info!(user_id = %id, points, "Points spent");
        Ok(())
    }
}
