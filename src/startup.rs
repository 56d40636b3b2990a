use crate::configuration::ScrapingSettings;
use crate::routes;
use crate::scrapers::RetrievalChain;
use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

pub fn run(
    listener: TcpListener,
    chain: RetrievalChain,
    scraping: ScrapingSettings,
) -> Result<Server, std::io::Error> {
    let chain = web::Data::new(chain);
    let scraping = web::Data::new(scraping);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(chain.clone())
            .app_data(scraping.clone())
            .configure(routes::configure)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
