use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use common::{
    error::{AppError, Res},
    validation,
};
use db::{
    SubscriptionStore,
    dtos::subscription::SubscriptionCreateRequest,
    models::subscription::{Subscription, SubscriptionStatus},
};
use uuid::Uuid;

use crate::{
    dtos::sub::PlanRequest,
    models::plan::{self, PLANS, Plan},
};

pub const TRIAL_DAYS: i64 = 14;

pub const NO_SUBSCRIPTION: &str = "No subscription found";

/// Builds the row for a fresh subscription: a trial of `TRIAL_DAYS`
/// starting at `now`, with the trial window equal to the first period.
pub fn new_trial(user_id: Uuid, plan: &Plan, now: DateTime<Utc>) -> SubscriptionCreateRequest {
    let trial_end = now + Duration::days(TRIAL_DAYS);
    SubscriptionCreateRequest {
        user_id,
        plan_id: plan.id.to_string(),
        plan_name: plan.name.to_string(),
        status: SubscriptionStatus::Trialing,
        current_period_start: now,
        current_period_end: trial_end,
        trial_start: Some(now),
        trial_end: Some(trial_end),
    }
}

/// Validates the request and resolves it against the catalog.
fn requested_plan(req: &PlanRequest) -> Res<&'static Plan> {
    validation::validate(req)?;
    plan::find_plan(&req.plan_id).ok_or_else(|| {
        AppError::validation(format!(
            "Unknown plan '{}', planId must be one of [{}]",
            req.plan_id,
            plan::plan_ids().join(", ")
        ))
    })
}

/// Subscription lifecycle.
///
/// ```text
/// none --create--> trialing --upgrade--> active
///                      |                   |
///                      +------cancel-------+--> (same status, cancelAtPeriodEnd)
///                                                  --reactivate--> active
/// ```
///
/// Nothing moves a subscription to `canceled` when the period ends, a
/// pending cancellation stays pending until it is reactivated.
#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn SubscriptionStore>,
}

impl SubscriptionService {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        SubscriptionService { store }
    }

    pub fn list_plans(&self) -> &'static [Plan] {
        &PLANS
    }

    /// The user's most recent subscription. `None` is not an error.
    pub async fn current(&self, user_id: Uuid) -> Res<Option<Subscription>> {
        self.store.find_by_user(user_id).await
    }

    /// Starts a trial on the requested plan.
    pub async fn create(&self, user_id: Uuid, req: &PlanRequest) -> Res<Subscription> {
        let plan = requested_plan(req)?;

        if self.store.find_live_by_user(user_id).await?.is_some() {
            return Err(AppError::Conflict(
                "User already has an active subscription".to_string(),
            ));
        }

        let subscription = self.store.insert(new_trial(user_id, plan, Utc::now())).await?;
        log::info!(
            "User {} started a {} trial, subscription {}",
            user_id,
            plan.id,
            subscription.id
        );
        Ok(subscription)
    }

    /// Moves the current subscription to the requested plan and marks it active.
    /// The billing period is left as is.
    pub async fn upgrade(&self, user_id: Uuid, req: &PlanRequest) -> Res<Subscription> {
        let plan = requested_plan(req)?;
        let mut subscription = self.require_current(user_id).await?;

        if subscription.status == SubscriptionStatus::Canceled {
            return Err(AppError::BadRequest(
                "Cannot upgrade canceled subscription".to_string(),
            ));
        }

        subscription.plan_id = plan.id.to_string();
        subscription.plan_name = plan.name.to_string();
        subscription.status = SubscriptionStatus::Active;
        let subscription = self.store.update(&subscription).await?;
        log::info!("User {} moved to the {} plan", user_id, plan.id);
        Ok(subscription)
    }

    /// Schedules cancellation at the end of the current period.
    pub async fn cancel(&self, user_id: Uuid) -> Res<Subscription> {
        let mut subscription = self.require_current(user_id).await?;

        if subscription.status == SubscriptionStatus::Canceled {
            return Err(AppError::Conflict("Subscription already canceled".to_string()));
        }
        if subscription.cancel_at_period_end {
            return Err(AppError::Conflict(
                "Subscription is already set to cancel at period end".to_string(),
            ));
        }

        subscription.cancel_at_period_end = true;
        subscription.canceled_at = Some(Utc::now());
        let subscription = self.store.update(&subscription).await?;
        log::info!("User {} canceled subscription {}", user_id, subscription.id);
        Ok(subscription)
    }

    /// Drops a pending cancellation (or revives a canceled row) and marks it active.
    pub async fn reactivate(&self, user_id: Uuid) -> Res<Subscription> {
        let mut subscription = self.require_current(user_id).await?;

        if !subscription.cancel_at_period_end && subscription.status == SubscriptionStatus::Active
        {
            return Err(AppError::Conflict("Subscription is already active".to_string()));
        }

        subscription.cancel_at_period_end = false;
        subscription.canceled_at = None;
        subscription.status = SubscriptionStatus::Active;
        let subscription = self.store.update(&subscription).await?;
        log::info!("User {} reactivated subscription {}", user_id, subscription.id);
        Ok(subscription)
    }

    async fn require_current(&self, user_id: Uuid) -> Res<Subscription> {
        self.store
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(NO_SUBSCRIPTION.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use db::MemoryStore;

    use super::*;

    fn service() -> SubscriptionService {
        SubscriptionService::new(Arc::new(MemoryStore::default()))
    }

    fn plan(id: &str) -> PlanRequest {
        PlanRequest {
            plan_id: id.to_string(),
        }
    }

    #[test]
    fn trial_window_is_fourteen_days() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let trial = new_trial(user_id, plan::find_plan("pro").unwrap(), now);

        assert_eq!(trial.user_id, user_id);
        assert_eq!(trial.plan_id, "pro");
        assert_eq!(trial.plan_name, "Pro Plan");
        assert_eq!(trial.status, SubscriptionStatus::Trialing);
        assert_eq!(trial.current_period_start, now);
        assert_eq!(trial.current_period_end, now + Duration::days(14));
        assert_eq!(trial.trial_start, Some(now));
        assert_eq!(trial.trial_end, Some(trial.current_period_end));
    }

    #[test]
    fn catalog_has_three_plans() {
        let plans = service().list_plans();
        let ids: Vec<_> = plans.iter().map(|plan| plan.id).collect();
        assert_eq!(ids, ["basic", "pro", "enterprise"]);
        assert_eq!(plans[1].price, 29.99);
        assert!(plans.iter().all(|plan| !plan.features.is_empty()));
    }

    #[tokio::test]
    async fn no_subscription_is_not_an_error() {
        assert!(service().current(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_starts_trial() {
        let subs = service();
        let user_id = Uuid::new_v4();
        let sub = subs.create(user_id, &plan("basic")).await.unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Trialing);
        assert!(!sub.cancel_at_period_end);
        assert_eq!(sub.trial_end, Some(sub.current_period_end));
        assert_eq!(
            sub.current_period_end - sub.current_period_start,
            Duration::days(TRIAL_DAYS)
        );
        assert_eq!(subs.current(user_id).await.unwrap(), Some(sub));
    }

    #[tokio::test]
    async fn create_twice_conflicts() {
        let subs = service();
        let user_id = Uuid::new_v4();
        subs.create(user_id, &plan("basic")).await.unwrap();

        let err = subs.create(user_id, &plan("pro")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_plan_is_rejected_before_lookup() {
        let subs = service();
        let user_id = Uuid::new_v4();

        for result in [
            subs.create(user_id, &plan("unknown-plan")).await,
            subs.upgrade(user_id, &plan("unknown-plan")).await,
        ] {
            match result.unwrap_err() {
                AppError::Validation(details) => {
                    assert_eq!(details.len(), 1);
                    assert!(details[0].contains("unknown-plan"));
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn empty_plan_id_is_a_validation_error() {
        let err = service().create(Uuid::new_v4(), &plan("")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(details) if details == ["planId is required"]));
    }

    #[tokio::test]
    async fn upgrade_activates_trial() {
        let subs = service();
        let user_id = Uuid::new_v4();
        let trial = subs.create(user_id, &plan("basic")).await.unwrap();

        let sub = subs.upgrade(user_id, &plan("enterprise")).await.unwrap();
        assert_eq!(sub.id, trial.id);
        assert_eq!(sub.user_id, user_id);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.plan_id, "enterprise");
        assert_eq!(sub.plan_name, "Enterprise Plan");
        assert_eq!(sub.current_period_end, trial.current_period_end);
    }

    #[tokio::test]
    async fn operations_without_subscription_are_not_found() {
        let subs = service();
        let user_id = Uuid::new_v4();

        for result in [
            subs.upgrade(user_id, &plan("pro")).await,
            subs.cancel(user_id).await,
            subs.reactivate(user_id).await,
        ] {
            assert!(matches!(result, Err(AppError::NotFound(msg)) if msg == NO_SUBSCRIPTION));
        }
    }

    #[tokio::test]
    async fn cancel_then_reactivate() {
        let subs = service();
        let user_id = Uuid::new_v4();
        subs.create(user_id, &plan("pro")).await.unwrap();
        subs.upgrade(user_id, &plan("pro")).await.unwrap();

        let canceled = subs.cancel(user_id).await.unwrap();
        assert!(canceled.cancel_at_period_end);
        assert!(canceled.canceled_at.is_some());
        assert_eq!(canceled.status, SubscriptionStatus::Active);

        let err = subs.cancel(user_id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let reactivated = subs.reactivate(user_id).await.unwrap();
        assert!(!reactivated.cancel_at_period_end);
        assert!(reactivated.canceled_at.is_none());
        assert_eq!(reactivated.status, SubscriptionStatus::Active);

        let err = subs.reactivate(user_id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "Subscription is already active"));
    }

    #[tokio::test]
    async fn canceling_a_trial_keeps_it_trialing() {
        let subs = service();
        let user_id = Uuid::new_v4();
        subs.create(user_id, &plan("basic")).await.unwrap();

        let sub = subs.cancel(user_id).await.unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Trialing);
        assert!(sub.cancel_at_period_end);

        // a pending cancellation still counts as live
        let err = subs.create(user_id, &plan("pro")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn reactivating_a_trial_activates_it() {
        let subs = service();
        let user_id = Uuid::new_v4();
        subs.create(user_id, &plan("basic")).await.unwrap();

        let sub = subs.reactivate(user_id).await.unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn canceled_subscription_cannot_be_upgraded_or_canceled() {
        let store = Arc::new(MemoryStore::default());
        let subs = SubscriptionService::new(store.clone());
        let user_id = Uuid::new_v4();
        let mut sub = subs.create(user_id, &plan("basic")).await.unwrap();

        sub.status = SubscriptionStatus::Canceled;
        SubscriptionStore::update(store.as_ref(), &sub).await.unwrap();

        let err = subs.upgrade(user_id, &plan("pro")).await.unwrap_err();
        assert!(
            matches!(err, AppError::BadRequest(msg) if msg == "Cannot upgrade canceled subscription")
        );
        let err = subs.cancel(user_id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "Subscription already canceled"));

        // with the live slot free a new trial can start
        let fresh = subs.create(user_id, &plan("pro")).await.unwrap();
        assert_eq!(subs.current(user_id).await.unwrap(), Some(fresh));
    }
}
