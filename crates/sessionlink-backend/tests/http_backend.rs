//! Integration tests for the HTTP user backend.
//!
//! A throwaway axum server plays the application's user directory: it
//! accepts exactly one bearer token and answers everything else with 401.

#[cfg(feature = "http")]
mod http {
    use std::sync::{Arc, Mutex};

    use axum::{
        Router,
        http::{HeaderMap, StatusCode, header::AUTHORIZATION},
        routing::post,
    };
    use sessionlink_backend::{BackendConfig, BackendError, HttpUserBackend, UserBackend};
    use sessionlink_protocol::{AccessToken, UserId};

    const USER_JSON: &str = r#"{"user":{"id":"42","firstName":"Ada","lastName":"Lovelace","email":"ada@example.com"}}"#;

    type SeenTokens = Arc<Mutex<Vec<String>>>;

    /// Starts a backend whose `/auth/login` accepts `Bearer good-token`.
    /// Returns its base URL and the list of Authorization headers it saw.
    async fn start_backend(ok_body: &'static str) -> (String, SeenTokens) {
        let seen: SeenTokens = Arc::default();
        let recorder = Arc::clone(&seen);
        let app = Router::new()
            .route(
                "/auth/login",
                post(move |headers: HeaderMap| {
                    let recorder = Arc::clone(&recorder);
                    async move {
                        let auth = headers
                            .get(AUTHORIZATION)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        recorder.lock().unwrap().push(auth.clone());
                        if auth == "Bearer good-token" {
                            (StatusCode::OK, ok_body)
                        } else {
                            (StatusCode::UNAUTHORIZED, "")
                        }
                    }
                }),
            )
            .route(
                "/broken/login",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = listener.local_addr().expect("should have local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        (format!("http://{addr}"), seen)
    }

    #[tokio::test]
    async fn test_authenticate_valid_token_returns_user() {
        let (base, _) = start_backend(USER_JSON).await;
        let backend = HttpUserBackend::new(BackendConfig::new(base)).unwrap();
        backend.provide_token(AccessToken::new("good-token"));

        let user = backend.authenticate().await.expect("should authenticate");

        assert_eq!(user.id, UserId("42".into()));
        assert_eq!(user.display_name(), "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_authenticate_rejected_token_is_unauthorized() {
        let (base, _) = start_backend(USER_JSON).await;
        let backend = HttpUserBackend::new(BackendConfig::new(base)).unwrap();
        backend.provide_token(AccessToken::new("stale-token"));

        let result = backend.authenticate().await;

        assert!(matches!(result, Err(BackendError::Unauthorized)), "got {result:?}");
    }

    #[tokio::test]
    async fn test_authenticate_uses_most_recent_token_only() {
        let (base, seen) = start_backend(USER_JSON).await;
        let backend = HttpUserBackend::new(BackendConfig::new(base)).unwrap();

        backend.provide_token(AccessToken::new("stale-token"));
        backend.provide_token(AccessToken::new("good-token"));
        backend.authenticate().await.expect("latest token is valid");
        backend.authenticate().await.expect("still the latest token");

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec!["Bearer good-token", "Bearer good-token"]);
    }

    #[tokio::test]
    async fn test_authenticate_malformed_body_is_decoding_error() {
        let (base, _) = start_backend(r#"{"user":{"id":"42"}}"#).await;
        let backend = HttpUserBackend::new(BackendConfig::new(base)).unwrap();
        backend.provide_token(AccessToken::new("good-token"));

        let result = backend.authenticate().await;

        assert!(matches!(result, Err(BackendError::Decoding(_))), "got {result:?}");
    }

    #[tokio::test]
    async fn test_authenticate_server_error_is_unexpected_status() {
        let (base, _) = start_backend(USER_JSON).await;
        let config = BackendConfig::new(base).with_login_path("/broken/login");
        let backend = HttpUserBackend::new(config).unwrap();
        backend.provide_token(AccessToken::new("good-token"));

        let result = backend.authenticate().await;

        assert!(matches!(result, Err(BackendError::UnexpectedStatus(500))), "got {result:?}");
    }

    #[tokio::test]
    async fn test_authenticate_unreachable_backend_is_network_error() {
        let backend = HttpUserBackend::new(BackendConfig::new("http://127.0.0.1:9")).unwrap();
        backend.provide_token(AccessToken::new("good-token"));

        let result = backend.authenticate().await;

        assert!(matches!(result, Err(BackendError::Network(_))), "got {result:?}");
    }
}
