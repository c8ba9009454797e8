use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use actix_web::HttpResponse;

use crate::models::ApiResponse;

const WELCOME_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>imagegen-proxy</title>
</head>
<body>
  <h1>imagegen-proxy is running</h1>
  <p>Try <a href="/api/health">/api/health</a>.</p>
</body>
</html>
"#;

pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html") => "text/html",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") => "image/jpg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("wav") => "audio/wav",
        Some("mp4") => "video/mp4",
        Some("woff") => "application/font-woff",
        Some("ttf") => "application/font-ttf",
        Some("eot") => "application/vnd.ms-fontobject",
        Some("otf") => "application/font-otf",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

/// Maps a request path onto `root`, refusing anything that could leave it.
fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');
    let relative = if relative.is_empty() {
        "index.html"
    } else {
        relative
    };

    let relative = Path::new(relative);
    if relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        Some(root.join(relative))
    } else {
        None
    }
}

fn not_found(request_path: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::<()>::failure(
        "File not found",
        format!("Requested file does not exist: {}", request_path),
    ))
}

pub async fn serve(root: &Path, request_path: &str) -> HttpResponse {
    let Some(file_path) = resolve(root, request_path) else {
        log::warn!("Rejected static path {}", request_path);
        return not_found(request_path);
    };

    match tokio::fs::read(&file_path).await {
        Ok(content) => HttpResponse::Ok()
            .content_type(content_type_for(&file_path))
            .body(content),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if request_path == "/" {
                HttpResponse::Ok()
                    .content_type("text/html")
                    .body(WELCOME_PAGE)
            } else {
                not_found(request_path)
            }
        }
        Err(e) => {
            log::error!("Failed to read {}: {}", file_path.display(), e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::failure("Server error", e.kind().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("app.JS")), "text/javascript");
        assert_eq!(content_type_for(Path::new("module.wasm")), "application/wasm");
        assert_eq!(content_type_for(Path::new("README")), "application/octet-stream");
    }

    #[test]
    fn test_resolve() {
        let root = Path::new("/srv/www");
        assert_eq!(resolve(root, "/"), Some(PathBuf::from("/srv/www/index.html")));
        assert_eq!(
            resolve(root, "/assets/app.css"),
            Some(PathBuf::from("/srv/www/assets/app.css"))
        );
        assert_eq!(resolve(root, "/../etc/passwd"), None);
        assert_eq!(resolve(root, "/assets/../../secret"), None);
    }
}
