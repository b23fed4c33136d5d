use actix_web::web;

pub mod routes {
    pub mod sub;
}

pub mod services {
    pub mod sub;
}

pub mod dtos {
    pub mod sub;
}

pub mod models {
    pub mod plan;
}

pub use services::sub::SubscriptionService;

/// Public plan listing. Register it ahead of the guarded `/subscriptions` scope.
pub fn mount_plans() -> actix_web::Resource {
    web::resource("/subscriptions/plans").route(web::get().to(routes::sub::get_plans))
}

/// Subscription routes, expected to be mounted behind the auth middleware.
pub fn configure_subs(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::sub::get_current)
        .service(routes::sub::post_create)
        .service(routes::sub::post_upgrade)
        .service(routes::sub::post_cancel)
        .service(routes::sub::post_reactivate);
}
