//! Routes for the built front-end

use super::status::{count_requests, status_page, StatusCounters};
use super::ServerError;
use crate::config::ServerSettings;
use axum::{
    http::{header, HeaderName, HeaderValue},
    middleware,
    response::Redirect,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
};

/// Headers added to every response
pub fn security_headers(
    settings: &ServerSettings,
) -> Result<Vec<(HeaderName, HeaderValue)>, ServerError> {
    let csp = HeaderValue::from_str(&settings.content_security_policy).map_err(|_| {
        ServerError::InvalidHeader {
            name: header::CONTENT_SECURITY_POLICY.as_str().to_string(),
            value: settings.content_security_policy.clone(),
        }
    })?;
    let hsts = HeaderValue::from_str(&format!(
        "max-age={}; includeSubDomains",
        settings.hsts_max_age
    ))
    .map_err(|_| ServerError::InvalidHeader {
        name: header::STRICT_TRANSPORT_SECURITY.as_str().to_string(),
        value: settings.hsts_max_age.to_string(),
    })?;

    Ok(vec![
        (header::STRICT_TRANSPORT_SECURITY, hsts),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (header::CONTENT_SECURITY_POLICY, csp),
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        (
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ),
        (
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ),
        (header::PRAGMA, HeaderValue::from_static("no-cache")),
        (header::EXPIRES, HeaderValue::from_static("0")),
    ])
}

/// Build the application router.
///
/// Files under the static dir are served at the path prefix. Paths with
/// no matching file get the entry document so client-side routes load.
pub fn build_router(
    settings: &ServerSettings,
    counters: Arc<StatusCounters>,
) -> Result<Router, ServerError> {
    let entry = settings.static_dir.join(&settings.entry_document);
    let assets = ServeDir::new(&settings.static_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(entry));

    let mut router = Router::new()
        .route("/status", get(status_page))
        .with_state(Arc::clone(&counters));

    if settings.path_prefix.is_empty() {
        router = router.fallback_service(assets);
    } else {
        let target = format!("{}/", settings.path_prefix);
        router = router
            .route(
                "/",
                get(move || {
                    let target = target.clone();
                    async move { Redirect::permanent(&target) }
                }),
            )
            .nest_service(&settings.path_prefix, assets);
    }

    for (name, value) in security_headers(settings)? {
        router = router.layer(SetResponseHeaderLayer::overriding(name, value));
    }

    Ok(router
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn_with_state(counters, count_requests)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const INDEX: &str = "<!doctype html><html><body><div id=\"app\"></div></body></html>";

    struct Fixture {
        _dir: TempDir,
        settings: ServerSettings,
        counters: Arc<StatusCounters>,
        app: Router,
    }

    fn fixture(config: ServerConfig) -> Fixture {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), INDEX).unwrap();
        fs::create_dir_all(dir.path().join("js")).unwrap();
        fs::write(
            dir.path().join("js").join("app.js"),
            "console.log('name request');\n".repeat(64),
        )
        .unwrap();

        let settings = ServerConfig {
            static_dir: Some(dir.path().to_path_buf()),
            ..config
        }
        .resolve()
        .unwrap();
        let counters = Arc::new(StatusCounters::default());
        let app = build_router(&settings, Arc::clone(&counters)).unwrap();
        Fixture {
            _dir: dir,
            settings,
            counters,
            app,
        }
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    mod assets {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_serves_file_under_prefix() {
            let fx = fixture(ServerConfig::default());
            let response = fx
                .app
                .oneshot(get_request("/namerequest/js/app.js"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(body_text(response).await.starts_with("console.log"));
        }

        #[tokio::test]
        async fn test_unknown_route_gets_entry_document() {
            let fx = fixture(ServerConfig::default());
            let response = fx
                .app
                .oneshot(get_request("/namerequest/existing/NR%201234567"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_text(response).await, INDEX);
        }

        #[tokio::test]
        async fn test_root_redirects_to_prefix() {
            let fx = fixture(ServerConfig::default());
            let response = fx.app.oneshot(get_request("/")).await.unwrap();
            assert!(response.status().is_redirection());
            assert_eq!(
                response.headers().get(header::LOCATION).unwrap(),
                "/namerequest/"
            );
        }

        #[tokio::test]
        async fn test_outside_prefix_is_not_found() {
            let fx = fixture(ServerConfig::default());
            let response = fx.app.oneshot(get_request("/other/page")).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        #[tokio::test]
        async fn test_empty_prefix_serves_from_root() {
            let fx = fixture(ServerConfig {
                path_prefix: Some("/".to_string()),
                ..Default::default()
            });
            assert_eq!(fx.settings.path_prefix, "");
            let response = fx
                .app
                .clone()
                .oneshot(get_request("/js/app.js"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let response = fx.app.oneshot(get_request("/anything")).await.unwrap();
            assert_eq!(body_text(response).await, INDEX);
        }

        #[tokio::test]
        async fn test_gzip_when_accepted() {
            let fx = fixture(ServerConfig::default());
            let request = Request::builder()
                .uri("/namerequest/js/app.js")
                .header(header::ACCEPT_ENCODING, "gzip")
                .body(Body::empty())
                .unwrap();
            let response = fx.app.oneshot(request).await.unwrap();
            assert_eq!(
                response.headers().get(header::CONTENT_ENCODING).unwrap(),
                "gzip"
            );
        }
    }

    mod headers {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_security_headers_on_assets() {
            let fx = fixture(ServerConfig {
                hsts_max_age: Some(600),
                ..Default::default()
            });
            let response = fx
                .app
                .oneshot(get_request("/namerequest/js/app.js"))
                .await
                .unwrap();
            let headers = response.headers();
            assert_eq!(
                headers.get(header::STRICT_TRANSPORT_SECURITY).unwrap(),
                "max-age=600; includeSubDomains"
            );
            assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
            assert_eq!(
                headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
                "nosniff"
            );
            assert_eq!(
                headers.get(header::X_XSS_PROTECTION).unwrap(),
                "1; mode=block"
            );
            assert_eq!(
                headers.get(header::CACHE_CONTROL).unwrap(),
                "no-cache, no-store, must-revalidate"
            );
            assert_eq!(headers.get(header::PRAGMA).unwrap(), "no-cache");
            assert_eq!(headers.get(header::EXPIRES).unwrap(), "0");
            assert_eq!(
                headers.get(header::CONTENT_SECURITY_POLICY).unwrap(),
                crate::config::DEFAULT_CONTENT_SECURITY_POLICY
            );
        }

        #[tokio::test]
        async fn test_security_headers_on_status() {
            let fx = fixture(ServerConfig {
                content_security_policy: Some("default-src 'none'".to_string()),
                ..Default::default()
            });
            let response = fx.app.oneshot(get_request("/status")).await.unwrap();
            assert_eq!(
                response
                    .headers()
                    .get(header::CONTENT_SECURITY_POLICY)
                    .unwrap(),
                "default-src 'none'"
            );
        }

        #[test]
        fn test_invalid_policy_is_rejected() {
            let settings = ServerConfig {
                content_security_policy: Some("default-src\n'self'".to_string()),
                ..Default::default()
            }
            .resolve()
            .unwrap();
            let result = build_router(&settings, Arc::new(StatusCounters::default()));
            assert!(matches!(result, Err(ServerError::InvalidHeader { .. })));
        }
    }

    mod status {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_status_counts_requests() {
            let fx = fixture(ServerConfig::default());
            fx.app
                .clone()
                .oneshot(get_request("/namerequest/js/app.js"))
                .await
                .unwrap();

            let response = fx.app.oneshot(get_request("/status")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let text = body_text(response).await;
            assert!(text.starts_with("Active connections: 0 \n"));
            assert!(text.contains("server accepts handled requests\n 0 0 2 \n"));
            assert!(text.contains("Writing: 1"));

            let snapshot = fx.counters.snapshot();
            assert_eq!(snapshot.requests, 2);
            assert_eq!(snapshot.writing, 0);
        }
    }
}
