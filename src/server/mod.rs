pub mod handlers;
pub mod static_files;

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{
    http::Method,
    middleware::{DefaultHeaders, Logger},
    web, App, HttpServer,
};

use crate::{
    client::GenerationApi,
    config::ServerConfig,
    error::{ProxyError, Result},
};

pub const SERVICE_NAME: &str = "imagegen-proxy";

pub struct AppState {
    pub api: Arc<dyn GenerationApi>,
    pub static_dir: PathBuf,
    pub service: String,
}

impl AppState {
    pub fn new(api: Arc<dyn GenerationApi>, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            static_dir: static_dir.into(),
            service: SERVICE_NAME.to_string(),
        }
    }
}

/// Permissive CORS headers, added to every response.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add((
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ))
        .add(("Access-Control-Allow-Headers", "Content-Type, Authorization"))
}

/// The `/api` routes. Static files are served by [`handlers::fallback`] as the default service.
pub fn routes(cfg: &mut web::ServiceConfig) {
    let preflight = || web::method(Method::OPTIONS).to(handlers::preflight);

    cfg.app_data(web::JsonConfig::default().error_handler(handlers::invalid_body))
        .service(
            web::scope("/api")
                .service(
                    web::resource("/health")
                        .route(web::get().to(handlers::health))
                        .route(preflight()),
                )
                .service(
                    web::resource("/generate")
                        .route(web::post().to(handlers::generate))
                        .route(preflight()),
                )
                .service(
                    web::resource("/status/{uuid}")
                        .route(web::get().to(handlers::status))
                        .route(preflight()),
                ),
        );
}

pub async fn run(config: &ServerConfig, api: Arc<dyn GenerationApi>) -> Result<()> {
    let state = web::Data::new(AppState::new(api, config.static_dir.clone()));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors_headers())
            .wrap(Logger::new("%r %s %Dms"))
            .configure(routes)
            .default_service(web::to(handlers::fallback))
    })
    .bind((config.host.as_str(), config.port))
    .map_err(|e| match e.kind() {
        ErrorKind::AddrInUse => {
            ProxyError::ConfigError(format!("Port {} is already in use", config.port))
        }
        ErrorKind::PermissionDenied => ProxyError::ConfigError(format!(
            "Port {} requires elevated privileges",
            config.port
        )),
        _ => ProxyError::IoError(e),
    })?;

    log::info!("✅ Server bound to http://{}:{}", config.host, config.port);
    server.run().await?;
    log::info!("👋 Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ApiResponse, GenerateRequest, GenerateResponse, GeneratedImage, HealthReport,
        StatusSnapshot, TaskStatus,
    };
    use actix_web::{http::StatusCode, test};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        submitted: Mutex<Vec<GenerateRequest>>,
        fail_with: Option<u16>,
    }

    #[async_trait]
    impl GenerationApi for FakeApi {
        async fn submit(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
            if let Some(status) = self.fail_with {
                return Err(ProxyError::Downstream {
                    status,
                    message: "upstream said no".into(),
                });
            }
            self.submitted.lock().unwrap().push(request.clone());
            Ok(GenerateResponse {
                generate_uuid: "task-42".into(),
            })
        }

        async fn poll(&self, generate_uuid: &str) -> Result<StatusSnapshot> {
            if generate_uuid == "broken" {
                return Err(ProxyError::RequestError("connection refused".into()));
            }
            Ok(StatusSnapshot {
                generate_uuid: generate_uuid.to_string(),
                generate_status: TaskStatus::Reviewed,
                percent_completed: 1.0,
                generate_msg: String::new(),
                points_cost: 10,
                account_balance: 90,
                images: vec![GeneratedImage {
                    image_url: "https://cdn.example.com/out.png".into(),
                    seed: 1,
                    audit_status: 3,
                }],
            })
        }
    }

    macro_rules! test_app {
        ($api:expr, $dir:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState::new($api, $dir)))
                    .wrap(cors_headers())
                    .configure(routes)
                    .default_service(web::to(handlers::fallback)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test_app!(Arc::new(FakeApi::default()), ".");
        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
        let body: ApiResponse<HealthReport> = test::read_body_json(resp).await;
        let report = body.data.unwrap();
        assert!(body.success);
        assert_eq!(report.status, "ok");
        assert_eq!(report.service, SERVICE_NAME);
    }

    #[actix_web::test]
    async fn test_generate_forwards_body() {
        let api = Arc::new(FakeApi::default());
        let app = test_app!(api.clone(), ".");

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({
                "templateUuid": "tpl",
                "generateParams": {"prompt": "a cat", "imgCount": 1, "steps": 20},
                "extraFlag": true
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body, json!({"success": true, "data": {"generateUuid": "task-42"}}));
        let submitted = api.submitted.lock().unwrap();
        assert_eq!(submitted[0].template_uuid, "tpl");
        assert_eq!(submitted[0].extra["extraFlag"], json!(true));
    }

    #[actix_web::test]
    async fn test_generate_accepts_prompt_only_params() {
        let api = Arc::new(FakeApi::default());
        let app = test_app!(api.clone(), ".");

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({
                "templateUuid": "tpl",
                "generateParams": {"prompt": "a cat", "negativePrompt": "dogs"}
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let submitted = api.submitted.lock().unwrap();
        let params = submitted[0].generate_params.as_ref().unwrap();
        assert_eq!(params.img_count, None);
        assert_eq!(params.extra["negativePrompt"], json!("dogs"));
    }

    #[actix_web::test]
    async fn test_generate_propagates_downstream_status() {
        let api = Arc::new(FakeApi {
            fail_with: Some(429),
            ..Default::default()
        });
        let app = test_app!(api, ".");

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({"templateUuid": "tpl"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Image generation failed"));
        assert!(body["details"].as_str().unwrap().contains("upstream said no"));
    }

    #[actix_web::test]
    async fn test_invalid_body_uses_envelope() {
        let app = test_app!(Arc::new(FakeApi::default()), ".");

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], json!("Invalid request body"));
    }

    #[actix_web::test]
    async fn test_status() {
        let app = test_app!(Arc::new(FakeApi::default()), ".");

        let req = test::TestRequest::get().uri("/api/status/task-42").to_request();
        let body: ApiResponse<StatusSnapshot> = test::call_and_read_body_json(&app, req).await;
        let snapshot = body.data.unwrap();
        assert_eq!(snapshot.generate_uuid, "task-42");
        assert_eq!(snapshot.images.len(), 1);

        let req = test::TestRequest::get().uri("/api/status/broken").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], json!("Status query failed"));
    }

    #[actix_web::test]
    async fn test_preflight() {
        let app = test_app!(Arc::new(FakeApi::default()), ".");

        for uri in ["/api/generate", "/anything/else"] {
            let req = test::TestRequest::default()
                .method(Method::OPTIONS)
                .uri(uri)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NO_CONTENT);
            assert_eq!(
                resp.headers().get("Access-Control-Allow-Methods").unwrap(),
                "GET, POST, PUT, DELETE, OPTIONS"
            );
        }
    }

    #[actix_web::test]
    async fn test_static_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1);").unwrap();
        let app = test_app!(Arc::new(FakeApi::default()), dir.path());

        let resp = test::call_service(&app, test::TestRequest::get().uri("/app.js").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("Content-Type").unwrap(), "text/javascript");
        assert_eq!(
            test::read_body(resp).await,
            web::Bytes::from_static(b"console.log(1);")
        );

        let resp = test::call_service(&app, test::TestRequest::get().uri("/missing.png").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));

        // No index.html in the directory, so the root falls back to the welcome page.
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
