use actix_web::{get, HttpResponse, Responder};
use serde_json::json;

#[get("/")]
pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({"message": "Listing Scout API", "status": "running"}))
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({"status": "healthy", "service": "property-scraping"}))
}
