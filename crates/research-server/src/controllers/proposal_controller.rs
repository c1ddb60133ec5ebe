use actix_web::{web, HttpResponse};
use research_agents::ProposalRequest;
use serde_json::json;

use crate::dto::{FundingRequest, ImproveRequest, SectionRequest, ValidateRequest};
use crate::error::AppError;
use crate::state::AppState;

async fn generate_proposal(
    state: web::Data<AppState>,
    request: web::Json<ProposalRequest>,
) -> Result<HttpResponse, AppError> {
    let proposal = state.proposal.generate_proposal(&request).await?;
    Ok(HttpResponse::Ok().json(json!({ "proposal": proposal })))
}

async fn improve_proposal(
    state: web::Data<AppState>,
    request: web::Json<ImproveRequest>,
) -> Result<HttpResponse, AppError> {
    let improved = state
        .proposal
        .improve_proposal(&request.proposal_text, &request.feedback)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "improved_proposal": improved })))
}

async fn generate_section(
    state: web::Data<AppState>,
    request: web::Json<SectionRequest>,
) -> Result<HttpResponse, AppError> {
    let content = state
        .proposal
        .generate_section(&request.section, &request.context)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "section": request.section, "content": content })))
}

async fn validate_proposal(
    state: web::Data<AppState>,
    request: web::Json<ValidateRequest>,
) -> Result<HttpResponse, AppError> {
    let validation = state.proposal.validate_proposal(&request.proposal).await?;
    Ok(HttpResponse::Ok().json(validation))
}

async fn funding_justification(
    state: web::Data<AppState>,
    request: web::Json<FundingRequest>,
) -> Result<HttpResponse, AppError> {
    let justification = state
        .proposal
        .generate_funding_justification(&request.proposal, request.funding_amount.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "funding_justification": justification })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/proposal/generate").route(web::post().to(generate_proposal)))
        .service(web::resource("/proposal/improve").route(web::post().to(improve_proposal)))
        .service(web::resource("/proposal/section").route(web::post().to(generate_section)))
        .service(web::resource("/proposal/validate").route(web::post().to(validate_proposal)))
        .service(
            web::resource("/proposal/funding-justification")
                .route(web::post().to(funding_justification)),
        );
}
