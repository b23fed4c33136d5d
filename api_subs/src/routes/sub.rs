use actix_web::{Responder, get, post, web};
use common::error::Res;
use common::http::Success;
use db::models::user::User;

use crate::dtos::sub::{PlanRequest, PlansResponse, SubscriptionResponse};
use crate::services::sub::SubscriptionService;

/// Lists the plans a user can subscribe to. Public.
///
/// # Frontend Example
/// ```javascript
/// const { plans } = await (await fetch('/api/subscriptions/plans')).json();
/// plans.forEach(plan => console.log(plan.id, plan.name, plan.price, plan.features));
/// ```
pub async fn get_plans(subs: web::Data<SubscriptionService>) -> Res<impl Responder> {
    Success::ok(PlansResponse {
        plans: subs.list_plans(),
    })
}

/// Gets the signed-in user's subscription.
///
/// # Output
/// - Success: `{ subscription }`, `null` when the user never subscribed
#[get("/current")]
pub async fn get_current(
    user: web::ReqData<User>,
    subs: web::Data<SubscriptionService>,
) -> Res<impl Responder> {
    let subscription = subs.current(user.id).await?;
    Success::ok(SubscriptionResponse {
        message: None,
        subscription,
    })
}

/// Starts a 14 day trial of the given plan.
///
/// # Input
/// - `req`: `{ planId }`, one of the ids from `/subscriptions/plans`
///
/// # Output
/// - Success: 201 Created with the trialing subscription
/// - Error: 400 for an unknown plan, 409 if the user already has a live subscription
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/subscriptions/create', {
///   method: 'POST',
///   headers: {
///     'Content-Type': 'application/json',
///     'Authorization': `Bearer ${localStorage.getItem('authToken')}`
///   },
///   body: JSON.stringify({ planId: 'pro' })
/// });
/// ```
#[post("/create")]
pub async fn post_create(
    user: web::ReqData<User>,
    req: web::Json<PlanRequest>,
    subs: web::Data<SubscriptionService>,
) -> Res<impl Responder> {
    let subscription = subs.create(user.id, &req).await?;
    Success::created(SubscriptionResponse::with_message(
        "Subscription created successfully",
        subscription,
    ))
}

#[post("/upgrade")]
pub async fn post_upgrade(
    user: web::ReqData<User>,
    req: web::Json<PlanRequest>,
    subs: web::Data<SubscriptionService>,
) -> Res<impl Responder> {
    let subscription = subs.upgrade(user.id, &req).await?;
    Success::ok(SubscriptionResponse::with_message(
        "Subscription upgraded successfully",
        subscription,
    ))
}

/// Schedules cancellation at the end of the current period.
/// The subscription keeps its status until then.
#[post("/cancel")]
pub async fn post_cancel(
    user: web::ReqData<User>,
    subs: web::Data<SubscriptionService>,
) -> Res<impl Responder> {
    let subscription = subs.cancel(user.id).await?;
    Success::ok(SubscriptionResponse::with_message(
        "Subscription will be canceled at the end of the current period",
        subscription,
    ))
}

#[post("/reactivate")]
pub async fn post_reactivate(
    user: web::ReqData<User>,
    subs: web::Data<SubscriptionService>,
) -> Res<impl Responder> {
    let subscription = subs.reactivate(user.id).await?;
    Success::ok(SubscriptionResponse::with_message(
        "Subscription reactivated successfully",
        subscription,
    ))
}
