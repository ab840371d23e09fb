use actix_cors::Cors;
use actix_web::http::header;
use actix_web::web::{scope, Data};
use actix_web::{App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use complaint_engine::api::{self, ApiDoc};
use complaint_engine::auth::{ApiKeyMiddleware, API_KEY_HEADER};
use complaint_engine::configuration::Settings;
use complaint_engine::db::init_db;
use complaint_engine::geo::zones::ZoneAdmin;
use complaint_engine::geo::ZoneResolver;
use complaint_engine::lifecycle::ComplaintEngine;
use complaint_engine::migration::{Migrator, MigratorTrait};
use complaint_engine::notify::Dispatcher;
use complaint_engine::repository::SeaOrmRepository;
use complaint_engine::telemetry::{get_subscriber, init_subscriber};
use complaint_engine::util::image_store::LocalImageStore;
use complaint_engine::util::line::LineClient;
use complaint_engine::util::telegram::TelegramClient;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = get_subscriber("complaint_engine".into(), "info,sqlx=warn".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    let settings = Settings::from_env()?;
    info!(host = %settings.host, port = settings.port, "configuration loaded");

    let db = init_db(&settings.database_url).await?;
    info!("running migrations");
    Migrator::up(&db, None).await?;

    let repository = Arc::new(SeaOrmRepository::new(db));
    let dispatcher = Dispatcher::new(
        repository.clone(),
        Arc::new(LineClient::new(&settings.line_api_base_url)),
        Arc::new(TelegramClient::new(&settings.telegram_api_base_url)),
    );
    let engine = ComplaintEngine::new(
        repository.clone(),
        ZoneResolver::new(repository.clone(), settings.central_zone_name.clone()),
        repository.clone(),
        Arc::new(LocalImageStore::new(&settings.image_dir, &settings.image_base_url)),
        dispatcher,
    );

    let engine_data = Data::new(engine);
    let zone_data = Data::new(ZoneAdmin::new(repository));
    let api_key = settings.staff_api_key.clone();

    info!("listening on http://{}:{}", settings.host, settings.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::HeaderName::from_static(API_KEY_HEADER),
            ])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(engine_data.clone())
            .app_data(zone_data.clone())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()))
            .service(api::health_check)
            .service(api::create_complaint)
            .service(api::get_complaint)
            .service(api::cancel_complaint)
            .service(api::reopen_complaint)
            .service(
                scope("/api")
                    .wrap(ApiKeyMiddleware::new(api_key.clone()))
                    .service(api::report_result)
                    .service(api::verify_complaint)
                    .service(api::reject_verification)
                    .service(api::reject_complaint)
                    .service(api::remind_complaint)
                    .service(api::delete_complaint)
                    .service(api::list_zones)
                    .service(api::create_zone)
                    .service(api::update_zone)
                    .service(api::delete_zone),
            )
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await?;

    Ok(())
}
