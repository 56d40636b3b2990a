pub mod default_route;
pub mod scrape_route;

use actix_web::web;

/// Register every route. Shared by the server and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(default_route::root)
        .service(default_route::health)
        .service(
            web::scope("/api/scrape")
                .service(scrape_route::scrape_by_address)
                .service(scrape_route::scrape_by_url)
                .service(scrape_route::scrape_batch),
        );
}
