use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::dto::CitationRequest;
use crate::error::AppError;
use crate::state::AppState;

async fn generate_citation(
    state: web::Data<AppState>,
    request: web::Json<CitationRequest>,
) -> Result<HttpResponse, AppError> {
    let CitationRequest {
        paper_url,
        citation_style,
    } = request.into_inner();
    let citation = state
        .citation
        .generate_citation(&paper_url, &citation_style)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "citation": citation, "style": citation_style })))
}

async fn get_citation_styles(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({ "styles": state.citation.available_styles() }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/citation/generate").route(web::post().to(generate_citation)))
        .service(web::resource("/citation/styles").route(web::get().to(get_citation_styles)));
}
