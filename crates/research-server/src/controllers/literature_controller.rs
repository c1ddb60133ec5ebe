use actix_web::{web, HttpResponse};
use research_agents::Paper;
use serde_json::json;

use crate::dto::{LiteratureRequest, SummaryRequest};
use crate::error::AppError;
use crate::state::AppState;

async fn search_literature(
    state: web::Data<AppState>,
    request: web::Json<LiteratureRequest>,
) -> Result<HttpResponse, AppError> {
    let papers = state
        .literature
        .search_papers(&request.topic, request.max_results)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "papers": papers, "topic": request.topic })))
}

async fn categorize_papers(
    state: web::Data<AppState>,
    papers: web::Json<Vec<Paper>>,
) -> Result<HttpResponse, AppError> {
    let categorized = state.literature.categorize_papers(&papers).await;
    Ok(HttpResponse::Ok().json(json!({ "categorized_papers": categorized })))
}

async fn summarize_literature(
    state: web::Data<AppState>,
    request: web::Json<SummaryRequest>,
) -> Result<HttpResponse, AppError> {
    let summary = state
        .literature
        .generate_literature_summary(&request.papers)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "summary": summary })))
}

async fn review_literature(
    state: web::Data<AppState>,
    request: web::Json<LiteratureRequest>,
) -> Result<HttpResponse, AppError> {
    let review = state
        .literature
        .review(&request.topic, request.max_results)
        .await?;
    Ok(HttpResponse::Ok().json(review))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/literature/search").route(web::post().to(search_literature)))
        .service(web::resource("/literature/categorize").route(web::post().to(categorize_papers)))
        .service(web::resource("/literature/summary").route(web::post().to(summarize_literature)))
        .service(web::resource("/literature/review").route(web::post().to(review_literature)));
}
