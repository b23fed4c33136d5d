use actix_web::web;

use middleware::auth::AuthMiddleware;

pub mod dtos {
    pub mod auth;
    pub mod user;
}
pub mod middleware {
    pub mod auth;
}
mod routes {
    pub mod auth;
    pub mod user;
}
pub mod services {
    pub mod auth;
    pub mod password;
    pub mod user;
}

pub use services::{auth::AuthService, user::UserService};

// Auth middleware
pub fn auth_middleware() -> AuthMiddleware {
    AuthMiddleware
}

/// `/auth` routes. Registration and login are public, `/me` and `/logout`
/// carry their own guard.
pub fn mount_auth() -> actix_web::Scope {
    web::scope("/auth")
        .service(routes::auth::post_register)
        .service(routes::auth::post_login)
        .service(
            web::resource("/me")
                .wrap(auth_middleware())
                .route(web::get().to(routes::auth::get_me)),
        )
        .service(
            web::resource("/logout")
                .wrap(auth_middleware())
                .route(web::post().to(routes::auth::post_logout)),
        )
}

/// Profile routes, expected to be mounted behind `auth_middleware()`.
pub fn configure_user(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::user::get_profile)
        .service(routes::user::put_profile)
        .service(routes::user::delete_account);
}
