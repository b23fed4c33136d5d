use actix_web::{Responder, post, web};
use common::error::Res;
use common::http::{MessageResponse, Success};
use db::models::user::User;

use crate::dtos::auth::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
use crate::services::auth::AuthService;

/// Registers a new user with email and password authentication.
///
/// # Input
/// - `req`: JSON payload with `email`, `password`, `firstName` and `lastName`
/// - `auth`: Auth service
///
/// # Output
/// - Success: 201 Created with a token and the created user
/// - Error: 400 with `details` for invalid fields, 409 if the email is taken
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/auth/register', {
///   method: 'POST',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({
///     email: 'user@example.com',
///     password: 'securepassword',
///     firstName: 'John',
///     lastName: 'Doe'
///   })
/// });
///
/// if (response.ok) {
///   const { token, user } = await response.json();
///   localStorage.setItem('authToken', token);
/// }
/// ```
#[post("/register")]
pub async fn post_register(
    req: web::Json<RegisterRequest>,
    auth: web::Data<AuthService>,
) -> Res<impl Responder> {
    let (token, user) = auth.register(req.into_inner()).await?;
    Success::created(AuthResponse {
        message: "User created successfully".to_string(),
        token,
        user,
    })
}

/// Authenticates a user with email and password.
///
/// # Output
/// - Success: 200 with a fresh token and the user
/// - Error: 401 `Invalid credentials` for an unknown email or a wrong
///   password, 401 `Account is disabled` for deactivated accounts
#[post("/login")]
pub async fn post_login(
    req: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
) -> Res<impl Responder> {
    let (token, user) = auth.login(req.into_inner()).await?;
    Success::ok(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user,
    })
}

/// Returns the user the bearer token belongs to.
pub async fn get_me(user: web::ReqData<User>) -> Res<impl Responder> {
    Success::ok(UserResponse {
        user: user.into_inner(),
    })
}

pub async fn post_logout(
    user: web::ReqData<User>,
    auth: web::Data<AuthService>,
) -> Res<impl Responder> {
    Success::ok(MessageResponse::new(auth.logout(&user)))
}
