use actix_web::dev::HttpServiceFactory;
use actix_web::http::header;
use actix_web::middleware::DefaultHeaders;
use actix_web::web;

pub mod public_config;
pub mod unsubscribe;

/// Permissive cross-origin headers attached to every API response
fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .add((header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"))
        .add((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
}

/// API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/api")
        .wrap(cors_headers())
        .service(unsubscribe::resource())
        .service(public_config::show)
}
