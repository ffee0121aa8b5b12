//! Entitlement entity <-> model mapper

use contest_core::entities::EntitlementRecord;
use contest_core::value_objects::UserId;

use crate::models::EntitlementModel;

impl From<EntitlementModel> for EntitlementRecord {
    fn from(model: EntitlementModel) -> Self {
        EntitlementRecord {
            user_id: UserId::new(model.user_id),
            feature: model.feature,
            expires_at: model.expires_at,
            credits: model.credits,
        }
    }
}
