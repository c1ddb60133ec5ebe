use actix_web::{web, HttpResponse};
use research_agents::ExtractionKind;
use serde_json::{json, Value};

use crate::dto::{ExtractionRequest, VisualizationRequest};
use crate::error::AppError;
use crate::state::AppState;

async fn extract_data(
    state: web::Data<AppState>,
    request: web::Json<ExtractionRequest>,
) -> Result<HttpResponse, AppError> {
    let kind = request
        .extraction_type
        .parse::<ExtractionKind>()
        .unwrap_or(ExtractionKind::All);
    let extracted = state
        .data_extraction
        .extract_data(&request.file_content, kind)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "extracted_data": extracted })))
}

async fn analyze_data(
    state: web::Data<AppState>,
    data: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let analysis = state.data_extraction.analyze_data(&data).await?;
    Ok(HttpResponse::Ok().json(json!({ "analysis": analysis })))
}

async fn visualize_data(
    state: web::Data<AppState>,
    request: web::Json<VisualizationRequest>,
) -> Result<HttpResponse, AppError> {
    let visualization = state
        .data_extraction
        .generate_visualization(&request.data, &request.chart_type);
    Ok(HttpResponse::Ok().json(json!({ "visualization": visualization })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/data/extract").route(web::post().to(extract_data)))
        .service(web::resource("/data/analyze").route(web::post().to(analyze_data)))
        .service(web::resource("/data/visualize").route(web::post().to(visualize_data)));
}
