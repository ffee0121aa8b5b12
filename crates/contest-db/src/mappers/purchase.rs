//! Purchase entity <-> model mapper

use contest_core::entities::{Purchase, PurchaseStatus};
use contest_core::value_objects::UserId;

use crate::models::PurchaseModel;

impl From<PurchaseModel> for Purchase {
    fn from(model: PurchaseModel) -> Self {
        Purchase {
            id: model.id,
            user_id: UserId::new(model.user_id),
            payload: model.payload,
            amount: model.amount,
            // The CHECK constraint limits status to known values
            status: PurchaseStatus::parse(&model.status).unwrap_or(PurchaseStatus::NeedsReview),
            created_at: model.created_at,
        }
    }
}
