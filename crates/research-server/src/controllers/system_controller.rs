use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::state::AppState;

async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "Agentic Research Assistant Suite API" }))
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let agents: Vec<&str> = state.agents().iter().map(|a| a.key()).collect();
    HttpResponse::Ok().json(json!({ "status": "healthy", "agents": agents }))
}

async fn list_agents(state: web::Data<AppState>) -> impl Responder {
    let agents: Vec<_> = state.agents().iter().map(|a| a.info()).collect();
    HttpResponse::Ok().json(json!({ "agents": agents }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(root)))
        .service(web::resource("/health").route(web::get().to(health_check)))
        .service(web::resource("/api/agents").route(web::get().to(list_agents)));
}
