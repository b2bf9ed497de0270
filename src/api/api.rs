use std::sync::Arc;
use std::time::Duration;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::{DefaultHeaders, Logger, NormalizePath, TrailingSlash},
    web, App, HttpServer,
};

use super::{
    errors::TodoApiError,
    middlewares::{cors::Cors, rate_limit::RateLimiter},
    state::AppState,
    system_handler, todos_handler,
};
use crate::config::Config;
use crate::store::TodoStore;

pub const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "SAMEORIGIN"))
        .add(("Cross-Origin-Resource-Policy", "cross-origin"))
        .add(("Referrer-Policy", "no-referrer"))
        .add(("X-DNS-Prefetch-Control", "off"))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| TodoApiError::BadRequest(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| TodoApiError::BadRequest(err.to_string()).into())
}

fn not_found_route() -> actix_web::Route {
    web::route().to(system_handler::not_found)
}

/// The whole HTTP surface. Shared between the server and the tests.
pub fn build_app(
    state: web::Data<AppState>,
    limiter: RateLimiter,
    cors: Cors,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .app_data(json_config())
        .app_data(query_config())
        .wrap(cors)
        .wrap(security_headers())
        .wrap(NormalizePath::new(TrailingSlash::Trim))
        .wrap(Logger::default())
        .route("/", web::get().to(system_handler::index))
        .service(
            web::scope("/api")
                .wrap(limiter)
                .route("/health", web::get().to(system_handler::health))
                .service(
                    web::scope("/todos")
                        .service(
                            web::resource("")
                                .route(web::get().to(todos_handler::get_todos))
                                .route(web::post().to(todos_handler::create_todo))
                                .route(web::delete().to(todos_handler::delete_all_todos))
                                .default_service(not_found_route()),
                        )
                        .service(
                            web::resource("/completed/all")
                                .route(web::delete().to(todos_handler::delete_completed_todos))
                                .default_service(not_found_route()),
                        )
                        .service(
                            web::resource("/{id}")
                                .route(web::get().to(todos_handler::get_todo))
                                .route(web::put().to(todos_handler::update_todo))
                                .route(web::delete().to(todos_handler::delete_todo))
                                .default_service(not_found_route()),
                        ),
                ),
        )
        .default_service(not_found_route())
}

/// Serves until SIGINT/SIGTERM, then drains the workers.
pub async fn start_server(config: Config, store: Arc<dyn TodoStore>) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new(store, config.is_development()));

    let limiter = RateLimiter::new(
        config.rate_limit_max,
        Duration::from_secs(config.rate_limit_window_secs),
    )
    .trust_proxy(config.trust_proxy);

    let cors = Cors::new(&config.frontend_url);

    let address = config.bind_address();

    log::info!("Server is running on http://{}", address);
    log::info!("Environment: {}", config.environment);

    HttpServer::new(move || build_app(state.clone(), limiter.clone(), cors.clone()))
        .bind(address.as_str())?
        .shutdown_timeout(10)
        .run()
        .await?;

    log::info!("HTTP server closed");

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use actix_web::web;

    use crate::api::middlewares::{cors::Cors, rate_limit::RateLimiter};
    use crate::api::state::AppState;
    use crate::store::{MemoryTodoStore, TodoStore};

    pub fn state(store: Arc<dyn TodoStore>) -> web::Data<AppState> {
        web::Data::new(AppState::new(store, true))
    }

    pub fn memory_state() -> web::Data<AppState> {
        state(Arc::new(MemoryTodoStore::new()))
    }

    pub fn limiter() -> RateLimiter {
        RateLimiter::new(1000, Duration::from_secs(900))
    }

    pub fn cors() -> Cors {
        Cors::new("*")
    }
}
