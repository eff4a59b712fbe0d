use std::sync::Arc;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use hrm_leave::config::Config;
use hrm_leave::db::init_db;
use hrm_leave::docs::ApiDoc;
use hrm_leave::leave::{
    CachedDirectory, Catalog, HolidaySet, LeaveEngine, MySqlDirectory, MySqlLeaveStore, WorkingDayCalculator,
};
use hrm_leave::routes;

#[get("/")]
async fn index() -> impl Responder {
    "HRM leave service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;

    let directory = Arc::new(MySqlDirectory::new(pool.clone()));
    let employees = Arc::new(CachedDirectory::new(directory.clone(), config.leave.directory_cache_ttl));
    let calculator = WorkingDayCalculator::new(Arc::new(HolidaySet::new(config.leave.holidays.iter().copied())));

    let engine = LeaveEngine::new(
        Arc::new(MySqlLeaveStore::new(pool)),
        employees,
        directory,
        Catalog::from_policy(&config.leave),
        calculator,
    )
    .with_max_attempts(config.leave.max_conflict_retries);

    let limiter = Arc::new(routes::build_limiter(config.rate_protected_per_min)?);
    let server_addr = config.server_addr.clone();
    info!(
        addr = %server_addr,
        holidays = config.leave.holidays.len(),
        "Leave engine ready"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(engine.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config.api_prefix, limiter.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
