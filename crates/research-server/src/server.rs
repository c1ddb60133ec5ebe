use std::io;

use actix_cors::Cors;
use actix_web::{error, middleware::Logger, web, App, HttpRequest, HttpServer};

use crate::config::{CorsPolicy, ServerConfig};
use crate::controllers::{
    citation_controller, collaboration_controller, data_controller, literature_controller,
    proposal_controller, system_controller,
};
use crate::error::AppError;
use crate::state::AppState;

pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(4 * 1024 * 1024)
            .error_handler(json_error_handler),
    )
    .app_data(web::PathConfig::default().error_handler(path_error_handler))
    .configure(system_controller::config)
    .service(
        web::scope("/api")
            .configure(citation_controller::config)
            .configure(literature_controller::config)
            .configure(collaboration_controller::config)
            .configure(data_controller::config)
            .configure(proposal_controller::config),
    );
}

fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid request body: {}", err)).into()
}

fn path_error_handler(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid path: {}", err)).into()
}

fn cors(policy: &CorsPolicy) -> Cors {
    match policy {
        CorsPolicy::Permissive => Cors::permissive(),
        CorsPolicy::AllowList(origins) => origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
            .supports_credentials(),
    }
}

pub async fn run(config: ServerConfig, state: AppState) -> io::Result<()> {
    let state = web::Data::new(state);
    let cors_policy = config.cors.clone();
    let bind_addr = (config.host.clone(), config.port);

    log::info!("Starting research server on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(&cors_policy))
            .wrap(Logger::default())
            .configure(app_config)
    })
    .bind(bind_addr)?
    .run()
    .await
}
