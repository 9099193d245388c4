use std::io;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;

use toolshelf_api::app_state::AppState;
use toolshelf_api::cache::DirectoryCache;
use toolshelf_api::config::Config;
use toolshelf_api::handlers;
use toolshelf_api::logging::{self, setup_logger};
use toolshelf_api::store::{DirectoryStore, PgStore};

fn startup_error(err: toolshelf_api::Error) -> io::Error {
    io::Error::other(err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    setup_logger();

    let config = Config::from_env().map_err(startup_error)?;
    let bind_address = config.bind_address();

    let pool = toolshelf_api::db::initialize_db(&config.database_url)
        .await
        .map_err(startup_error)?;
    let store: Arc<dyn DirectoryStore> = Arc::new(PgStore::new(pool));
    // One cache service for the whole process, shared by every worker.
    let cache = Arc::new(DirectoryCache::new(config.cache_ttl, config.similar_tools_ttl));

    log::info!(
        "Cache TTLs: {:?} (categories, tools), {:?} (similar tools)",
        cache.categories.ttl(),
        cache.similar_tools.ttl()
    );
    log::info!("Starting server at http://{bind_address}");

    let state = web::Data::new(AppState::new(store, cache, config.site_base_url.clone()));

    HttpServer::new(move || {
        App::new()
            .wrap(logging::Logger::default())
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run()
    .await
}
