use actix_web::{get, post, put, web, HttpResponse};
use futures::StreamExt;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::{
        domain::ParsedQuiz,
        dto::{
            request::{SelectSourceRequest, TopicRequest, UploadQuery},
            response::{QuizResponseDto, SessionResponseDto},
        },
    },
};

#[post("/api/sessions")]
pub async fn create_session(state: web::Data<AppState>) -> HttpResponse {
    let session = state.session_service.create_session().await;
    HttpResponse::Created().json(SessionResponseDto::from(session))
}

#[get("/api/sessions/{id}")]
pub async fn get_session(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let session = state.session_service.get_session(&id).await?;
    Ok(HttpResponse::Ok().json(SessionResponseDto::from(session)))
}

#[put("/api/sessions/{id}/source")]
pub async fn select_source(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    request: web::Json<SelectSourceRequest>,
) -> Result<HttpResponse, AppError> {
    let session = state
        .session_service
        .select_source(id.into_inner(), request.source)
        .await?;
    Ok(HttpResponse::Ok().json(SessionResponseDto::from(session)))
}

#[post("/api/sessions/{id}/upload")]
pub async fn upload_file(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    query.validate()?;
    let session = state
        .session_service
        .upload_file(id.into_inner(), &query.file_name, body.to_vec())
        .await?;
    Ok(HttpResponse::Ok().json(SessionResponseDto::from(session)))
}

#[post("/api/sessions/{id}/topic")]
pub async fn submit_topic(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    request: web::Json<TopicRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let session = state
        .session_service
        .submit_topic(id.into_inner(), request.into_inner().topic)
        .await?;
    Ok(HttpResponse::Ok().json(SessionResponseDto::from(session)))
}

/// Streams the quiz as plain text, or returns the session view when there is
/// nothing to quiz on.
#[post("/api/sessions/{id}/generate")]
pub async fn generate_quiz(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    match state.session_service.generate(id).await? {
        Some(tokens) => Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .streaming(tokens.map(|token| token.map(web::Bytes::from)))),
        None => {
            let session = state.session_service.get_session(&id).await?;
            Ok(HttpResponse::Ok().json(SessionResponseDto::from(session)))
        }
    }
}

#[get("/api/sessions/{id}/quiz")]
pub async fn get_quiz(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let session = state.session_service.get_session(&id).await?;
    let raw = session
        .quiz
        .ok_or_else(|| AppError::NotFound(format!("No quiz generated yet for session {}", session.id)))?;

    Ok(HttpResponse::Ok().json(QuizResponseDto::new(session.id, ParsedQuiz::parse(&raw))))
}

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
