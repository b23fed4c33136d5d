use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::subscription::SubscriptionCreateRequest, models::subscription::Subscription,
    unique_violation_as_conflict,
};

const LIVE_CONFLICT: &str = "User already has an active subscription";

pub async fn get_latest_by_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>(
        r#"
        SELECT * FROM subscriptions
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_live_by_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>(
        r#"
        SELECT * FROM subscriptions
        WHERE user_id = $1 AND status IN ('active', 'trialing')
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn insert_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: SubscriptionCreateRequest,
) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions (
            user_id, plan_id, plan_name, status,
            current_period_start, current_period_end, trial_start, trial_end
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(data.user_id)
    .bind(data.plan_id)
    .bind(data.plan_name)
    .bind(data.status)
    .bind(data.current_period_start)
    .bind(data.current_period_end)
    .bind(data.trial_start)
    .bind(data.trial_end)
    .fetch_one(executor)
    .await
    .map_err(|e| unique_violation_as_conflict(e, LIVE_CONFLICT))
}

pub async fn update_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subscription: &Subscription,
) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>(
        r#"
        UPDATE subscriptions SET
            plan_id = $2,
            plan_name = $3,
            status = $4,
            current_period_start = $5,
            current_period_end = $6,
            cancel_at_period_end = $7,
            canceled_at = $8,
            trial_start = $9,
            trial_end = $10,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(subscription.id)
    .bind(&subscription.plan_id)
    .bind(&subscription.plan_name)
    .bind(subscription.status)
    .bind(subscription.current_period_start)
    .bind(subscription.current_period_end)
    .bind(subscription.cancel_at_period_end)
    .bind(subscription.canceled_at)
    .bind(subscription.trial_start)
    .bind(subscription.trial_end)
    .fetch_optional(executor)
    .await
    .map_err(|e| unique_violation_as_conflict(e, LIVE_CONFLICT))?
    .ok_or_else(|| AppError::NotFound("No subscription found".to_string()))
}
