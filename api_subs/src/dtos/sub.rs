use db::models::subscription::Subscription;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::plan::Plan;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "planId is required"))]
    pub plan_id: String,
}

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub plans: &'static [Plan],
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub subscription: Option<Subscription>,
}

impl SubscriptionResponse {
    pub fn with_message(message: &str, subscription: Subscription) -> Self {
        SubscriptionResponse {
            message: Some(message.to_string()),
            subscription: Some(subscription),
        }
    }
}
