use actix_web::{get, web, HttpResponse, Responder};

use crate::settings::PublicConfig;

/// Public configuration for the browser-side forms. Holds no secrets.
#[tracing::instrument(name = "Serve public config", skip(config))]
#[get("/config")]
pub async fn show(config: web::Data<PublicConfig>) -> impl Responder {
    HttpResponse::Ok().json(config.get_ref())
}
