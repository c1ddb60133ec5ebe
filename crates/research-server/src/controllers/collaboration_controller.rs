use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::dto::{CollaboratorRequest, CommentRequest, TaskRequest, TaskStatusRequest, VersionRequest};
use crate::error::AppError;
use crate::state::AppState;

async fn add_comment(
    state: web::Data<AppState>,
    request: web::Json<CommentRequest>,
) -> Result<HttpResponse, AppError> {
    let comment_id = state
        .collaboration
        .add_comment(
            &request.paper_id,
            &request.comment,
            &request.user_id,
            request.section.as_deref(),
            request.line_number,
        )
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "comment_id": comment_id })))
}

async fn get_comments(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let comments = state.collaboration.get_comments(&path).await?;
    Ok(HttpResponse::Ok().json(json!({ "comments": comments })))
}

async fn create_task(
    state: web::Data<AppState>,
    request: web::Json<TaskRequest>,
) -> Result<HttpResponse, AppError> {
    let task_id = state
        .collaboration
        .create_task(
            &request.paper_id,
            &request.title,
            &request.description,
            &request.assigned_to,
            request.priority,
        )
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "task_id": task_id })))
}

async fn update_task_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<TaskStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let updated = state
        .collaboration
        .update_task_status(&path, request.status)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": updated })))
}

async fn get_tasks(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let tasks = state.collaboration.get_tasks(&path).await?;
    Ok(HttpResponse::Ok().json(json!({ "tasks": tasks })))
}

async fn add_collaborator(
    state: web::Data<AppState>,
    request: web::Json<CollaboratorRequest>,
) -> Result<HttpResponse, AppError> {
    let added = state
        .collaboration
        .add_collaborator(&request.paper_id, &request.user_id, request.role.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": added })))
}

async fn get_collaborators(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let collaborators = state.collaboration.get_collaborators(&path).await?;
    Ok(HttpResponse::Ok().json(json!({ "collaborators": collaborators })))
}

async fn create_version(
    state: web::Data<AppState>,
    request: web::Json<VersionRequest>,
) -> Result<HttpResponse, AppError> {
    let version = state
        .collaboration
        .create_paper_version(&request.paper_id, &request.content, &request.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "version_id": version.id,
        "version_number": version.version_number,
    })))
}

async fn get_versions(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let versions = state.collaboration.get_paper_versions(&path).await?;
    Ok(HttpResponse::Ok().json(json!({ "versions": versions })))
}

async fn get_latest_version(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let version = state.collaboration.get_latest_version(&path).await?;
    Ok(HttpResponse::Ok().json(json!({ "version": version })))
}

async fn get_summary(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let summary = state
        .collaboration
        .generate_collaboration_summary(&path)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "summary": summary })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/collaboration/comment").route(web::post().to(add_comment)))
        .service(
            web::resource("/collaboration/comments/{paper_id}").route(web::get().to(get_comments)),
        )
        .service(web::resource("/collaboration/task").route(web::post().to(create_task)))
        .service(
            web::resource("/collaboration/task/{task_id}/status")
                .route(web::post().to(update_task_status)),
        )
        .service(web::resource("/collaboration/tasks/{paper_id}").route(web::get().to(get_tasks)))
        .service(
            web::resource("/collaboration/collaborator").route(web::post().to(add_collaborator)),
        )
        .service(
            web::resource("/collaboration/collaborators/{paper_id}")
                .route(web::get().to(get_collaborators)),
        )
        .service(web::resource("/collaboration/version").route(web::post().to(create_version)))
        .service(
            web::resource("/collaboration/versions/{paper_id}").route(web::get().to(get_versions)),
        )
        .service(
            web::resource("/collaboration/versions/{paper_id}/latest")
                .route(web::get().to(get_latest_version)),
        )
        .service(
            web::resource("/collaboration/summary/{paper_id}").route(web::get().to(get_summary)),
        );
}
