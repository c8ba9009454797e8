use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};

use crate::{
    error::ProxyError,
    models::{ApiResponse, GenerateRequest, HealthReport},
    server::{static_files, AppState},
};

fn failure_response(context: &str, err: &ProxyError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    log::error!("{}: {}", context, err);
    HttpResponse::build(status).json(ApiResponse::<()>::failure(context, err.to_string()))
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(HealthReport::now(&state.service)))
}

pub async fn generate(
    state: web::Data<AppState>,
    body: web::Json<GenerateRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    log::info!("Generate request for template {}", request.template_uuid);

    match state.api.submit(&request).await {
        Ok(handle) => HttpResponse::Ok().json(ApiResponse::ok(handle)),
        Err(e) => failure_response("Image generation failed", &e),
    }
}

pub async fn status(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let generate_uuid = path.into_inner();
    log::info!("Status request for {}", generate_uuid);

    match state.api.poll(&generate_uuid).await {
        Ok(snapshot) => HttpResponse::Ok().json(ApiResponse::ok(snapshot)),
        Err(e) => failure_response("Status query failed", &e),
    }
}

pub async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Everything outside `/api`: preflight for any path, static files otherwise.
pub async fn fallback(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if *req.method() == actix_web::http::Method::OPTIONS {
        return preflight().await;
    }
    static_files::serve(&state.static_dir, req.path()).await
}

pub fn invalid_body(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let details = err.to_string();
    log::warn!("Rejected request body: {}", details);
    let response =
        HttpResponse::BadRequest().json(ApiResponse::<()>::failure("Invalid request body", details));
    actix_web::error::InternalError::from_response(err, response).into()
}
