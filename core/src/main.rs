mod cors;
mod health;

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    web::{self},
};
use api_auth::{AuthService, UserService};
use api_subs::SubscriptionService;
use common::env_config::Config;
use db::{MemoryStore, PgStore, SubscriptionStore, UserStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();

    // init logger
    let level = if config.is_production() {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Debug
    };
    logger::setup(&config.log_file, level).expect("Failed to set up logger");

    // init store
    let (users, subscriptions): (Arc<dyn UserStore>, Arc<dyn SubscriptionStore>) =
        match &config.database_url {
            Some(database_url) => {
                let pool = db::setup(database_url, config.is_production())
                    .await
                    .expect("Failed to set up database");
                let store = Arc::new(PgStore::new(pool));
                (store.clone(), store)
            }
            None => {
                log::warn!("DATABASE_URL is not set, using the in-memory store");
                let store = Arc::new(MemoryStore::default());
                (store.clone(), store)
            }
        };

    let auth_service = web::Data::new(AuthService::new(
        users.clone(),
        config.jwt_config.clone(),
    ));
    let user_service = web::Data::new(UserService::new(users, subscriptions.clone()));
    let subscription_service = web::Data::new(SubscriptionService::new(subscriptions));

    let origin = config.cors_allowed_origin.clone();
    let console_logging_enabled = config.console_logging_enabled;
    let bind_addr = (config.server_host.clone(), config.server_port);
    log::info!(
        "Starting {} server on {}:{}",
        config.environment,
        config.server_host,
        config.server_port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(auth_service.clone())
            .app_data(user_service.clone())
            .app_data(subscription_service.clone())
            .app_data(common::http::json_config())
            .wrap(logger::middleware(console_logging_enabled)) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(
                web::scope("/api")
                    .service(health::get_health)
                    .service(api_auth::mount_auth())
                    .service(
                        web::scope("/users")
                            .wrap(api_auth::auth_middleware())
                            .configure(api_auth::configure_user),
                    )
                    // public, must come before the guarded scope
                    .service(api_subs::mount_plans())
                    .service(
                        web::scope("/subscriptions")
                            .wrap(api_auth::auth_middleware())
                            .configure(api_subs::configure_subs),
                    ),
            )
    })
    .bind(bind_addr)?
    .workers(config.num_workers)
    .run()
    .await
}
