use actix_web::{Responder, delete, get, put, web};
use common::error::Res;
use common::http::{MessageResponse, Success};
use db::models::user::User;

use crate::dtos::user::{ProfileResponse, UpdateProfileRequest};
use crate::services::user::UserService;

/// Endpoint to retrieve the signed-in user's profile with the current subscription.
///
/// # Output
/// - Success: `{ user: { ...user, subscription } }`, `subscription` is `null`
///   for users that never subscribed
/// - Error: 401 Unauthorized without a valid token
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/users/profile', {
///   headers: {
///     'Authorization': `Bearer ${localStorage.getItem('authToken')}`
///   }
/// });
///
/// if (response.ok) {
///   const { user } = await response.json();
///   console.log(user.firstName, user.subscription?.status);
/// }
/// ```
#[get("/profile")]
pub async fn get_profile(
    user: web::ReqData<User>,
    users: web::Data<UserService>,
) -> Res<impl Responder> {
    let profile = users.profile(user.into_inner()).await?;
    Success::ok(ProfileResponse {
        message: None,
        user: profile,
    })
}

/// Updates `firstName`, `lastName` and `email`. Absent fields are kept.
#[put("/profile")]
pub async fn put_profile(
    user: web::ReqData<User>,
    req: web::Json<UpdateProfileRequest>,
    users: web::Data<UserService>,
) -> Res<impl Responder> {
    let profile = users.update_profile(&user, req.into_inner()).await?;
    Success::ok(ProfileResponse {
        message: Some("Profile updated successfully".to_string()),
        user: profile,
    })
}

#[delete("/account")]
pub async fn delete_account(
    user: web::ReqData<User>,
    users: web::Data<UserService>,
) -> Res<impl Responder> {
    users.deactivate(&user).await?;
    Success::ok(MessageResponse::new("Account deactivated successfully"))
}
