/*
 * Responsibility
 * - load Config -> build dependencies (pool, stores, auth services) -> assemble Router
 * - apply middleware (auth per API, transport for the whole app)
 * - start with axum::serve()
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    repos::{task_repo::PgTaskStore, user_repo::PgUserStore},
    services::{auth::build_auth_services, id_codec::IdCodec},
    state::AppState,
};

fn init_tracing() {
    // RUST_LOG wins if set, e.g.
    // RUST_LOG=info,task_tracker=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr may be hidden depending on how the process is launched
        tracing::error!(?info, "panic");

        // development: crash the whole process so it gets noticed
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = with_transport(router(state), &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!().run(&pool).await?;

    let users = Arc::new(PgUserStore::new(pool.clone()));
    let tasks = Arc::new(PgTaskStore::new(pool));
    let (auth, authenticator) = build_auth_services(config, users.clone());

    auth.ensure_roles().await?;
    if let Some(email) = &config.bootstrap_admin_email
        && auth.bootstrap_admin(email).await?
    {
        tracing::info!("bootstrap admin role granted");
    }

    let id_codec = IdCodec::new(config.sqids_min_length, &config.sqids_alphabet)?;

    Ok(AppState::new(id_codec, auth, authenticator, users, tasks))
}

/// API routes with the auth middleware; no transport layers (tests drive this directly).
pub fn router(state: AppState) -> Router {
    let api = Router::new().nest("/api/v1", api::v1::routes());
    middleware::auth::apply(api, state.clone()).with_state(state)
}

fn with_transport(router: Router, config: &Config) -> Router {
    let router = middleware::security_headers::apply(router, config.app_env);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::services::auth::Role;

    struct TestApp {
        state: AppState,
        router: Router,
    }

    impl TestApp {
        fn new() -> Self {
            let state = AppState::for_tests();
            let router = router(state.clone());
            Self { state, router }
        }

        async fn send(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Vec<u8>) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let req = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let res = self.router.clone().oneshot(req).await.unwrap();
            let status = res.status();
            let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
            (status, bytes.to_vec())
        }

        async fn send_json(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let (status, bytes) = self.send(method, uri, token, body).await;
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }

        async fn register(&self, email: &str, password: &str) -> StatusCode {
            let body = json!({"email": email, "password": password});
            self.send("POST", "/api/v1/register", None, Some(body)).await.0
        }

        async fn login(&self, email: &str, password: &str) -> String {
            let body = json!({"email": email, "password": password});
            let (status, value) = self
                .send_json("POST", "/api/v1/authenticate", None, Some(body))
                .await;
            assert_eq!(status, StatusCode::OK);
            value["jwt"].as_str().unwrap().to_string()
        }

        async fn user_token(&self, email: &str) -> String {
            assert_eq!(self.register(email, "pw1").await, StatusCode::OK);
            self.login(email, "pw1").await
        }

        async fn admin_token(&self, email: &str) -> String {
            let token = self.user_token(email).await;
            let user = self.state.users.find_by_email(email).await.unwrap().unwrap();
            self.state.auth.grant_role(user.id, Role::Admin).await.unwrap();
            token
        }

        async fn user_id(&self, email: &str) -> String {
            let user = self.state.users.find_by_email(email).await.unwrap().unwrap();
            user.id.to_string()
        }
    }

    fn new_task(assignee_id: Option<&str>) -> Value {
        json!({
            "title": "write report",
            "description": "quarterly numbers",
            "status": "PENDING",
            "priority": "MEDIUM",
            "assignee_id": assignee_id,
        })
    }

    #[tokio::test]
    async fn register_login_and_resolve_identity() {
        let app = TestApp::new();

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/register",
                None,
                Some(json!({"email": "a@x.com", "password": "pw1"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"User registered successfully");

        let token = app.login("a@x.com", "pw1").await;
        let (status, me) = app.send_json("GET", "/api/v1/users/me", Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "a@x.com");
        assert_eq!(me["roles"], json!(["USER"]));
        assert!(me.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn missing_or_truncated_token_is_rejected_by_admin_route() {
        let app = TestApp::new();
        let token = app.user_token("a@x.com").await;
        let truncated = &token[..token.len() - 1];

        let (status, body) = app
            .send_json("POST", "/api/v1/tasks", None, Some(new_task(None)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, _) = app
            .send_json("POST", "/api/v1/tasks", Some(truncated), Some(new_task(None)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app.send_json("GET", "/api/v1/users/me", Some(truncated), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn user_role_cannot_pass_admin_gate() {
        let app = TestApp::new();
        let token = app.user_token("a@x.com").await;

        let (status, body) = app
            .send_json("POST", "/api/v1/tasks", Some(&token), Some(new_task(None)))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "ACCESS_DENIED");
    }

    #[tokio::test]
    async fn role_changes_apply_to_the_next_request() {
        let app = TestApp::new();
        // token minted while the account was still a plain USER
        let token = app.admin_token("boss@x.com").await;

        let (status, task) = app
            .send_json("POST", "/api/v1/tasks", Some(&token), Some(new_task(None)))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task["status"], "PENDING");
        assert!(task["id"].as_str().unwrap().len() >= 10);
    }

    #[tokio::test]
    async fn task_visibility_follows_ownership() {
        let app = TestApp::new();
        let admin = app.admin_token("boss@x.com").await;
        let assignee = app.user_token("worker@x.com").await;
        let stranger = app.user_token("stranger@x.com").await;
        let assignee_id = app.user_id("worker@x.com").await;

        let (_, task) = app
            .send_json(
                "POST",
                "/api/v1/tasks",
                Some(&admin),
                Some(new_task(Some(&assignee_id))),
            )
            .await;
        let uri = format!("/api/v1/tasks/{}", task["id"].as_str().unwrap());

        let (status, _) = app.send_json("GET", &uri, Some(&assignee), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.send_json("GET", &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "ACCESS_DENIED");

        let (status, updated) = app
            .send_json("PATCH", &format!("{uri}/status?status=IN_PROGRESS"), Some(&assignee), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "IN_PROGRESS");

        let (status, _) = app
            .send_json("PATCH", &format!("{uri}/priority?priority=HIGH"), Some(&stranger), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn listing_is_widened_for_admin_only() {
        let app = TestApp::new();
        let admin = app.admin_token("boss@x.com").await;
        let user = app.user_token("a@x.com").await;

        app.send_json("POST", "/api/v1/tasks", Some(&admin), Some(new_task(None)))
            .await;

        let (_, all) = app.send_json("GET", "/api/v1/tasks", Some(&admin), None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);

        let (status, mine) = app.send_json("GET", "/api/v1/tasks", Some(&user), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(mine.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn comments_follow_task_visibility() {
        let app = TestApp::new();
        let admin = app.admin_token("boss@x.com").await;
        let assignee = app.user_token("worker@x.com").await;
        let stranger = app.user_token("stranger@x.com").await;
        let assignee_id = app.user_id("worker@x.com").await;

        let (_, task) = app
            .send_json(
                "POST",
                "/api/v1/tasks",
                Some(&admin),
                Some(new_task(Some(&assignee_id))),
            )
            .await;
        let uri = format!("/api/v1/tasks/{}/comments", task["id"].as_str().unwrap());

        let (status, comment) = app
            .send_json("POST", &uri, Some(&assignee), Some(json!({"text": "on it"})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(comment["text"], "on it");

        let (status, _) = app
            .send_json("POST", &uri, Some(&stranger), Some(json!({"text": "me too"})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, comments) = app.send_json("GET", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(comments.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_registration_and_bad_login_are_client_errors() {
        let app = TestApp::new();
        assert_eq!(app.register("a@x.com", "pw1").await, StatusCode::OK);

        let (status, body) = app
            .send_json(
                "POST",
                "/api/v1/register",
                None,
                Some(json!({"email": "a@x.com", "password": "pw2"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "DUPLICATE_EMAIL");

        let (status, body) = app
            .send_json(
                "POST",
                "/api/v1/authenticate",
                None,
                Some(json!({"email": "a@x.com", "password": "pw2"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_CREDENTIALS");
    }

    #[tokio::test]
    async fn admin_can_promote_a_user() {
        let app = TestApp::new();
        let admin = app.admin_token("boss@x.com").await;
        let user = app.user_token("a@x.com").await;
        let user_id = app.user_id("a@x.com").await;
        let uri = format!("/api/v1/users/{user_id}/add-admin-role");

        let (status, _) = app.send_json("POST", &uri, Some(&user), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.send_json("POST", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["granted"], true);

        // same token, fresh roles
        let (status, _) = app
            .send_json("POST", "/api/v1/tasks", Some(&user), Some(new_task(None)))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn invalid_public_id_is_a_bad_request() {
        let app = TestApp::new();
        let admin = app.admin_token("boss@x.com").await;

        let (status, body) = app
            .send_json("GET", "/api/v1/tasks/!!!", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_PUBLIC_ID");
    }

    #[tokio::test]
    async fn incomplete_body_gets_the_error_body() {
        let app = TestApp::new();

        let (status, body) = app
            .send_json(
                "POST",
                "/api/v1/authenticate",
                None,
                Some(json!({"email": "a@x.com"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn head_is_gated_like_get() {
        use crate::repos::user_repo::NewIdentity;
        use crate::services::auth::hasher::{CredentialHasher, cheap_hasher};

        let app = TestApp::new();
        // same snapshot as a user whose stored role names are all unknown
        app.state
            .users
            .save(NewIdentity {
                email: "nobody@x.com".to_string(),
                password_hash: cheap_hasher().hash("pw1").unwrap(),
                roles: vec![],
            })
            .await
            .unwrap();
        let nobody = app.login("nobody@x.com", "pw1").await;
        let user = app.user_token("a@x.com").await;

        let (status, _) = app.send("GET", "/api/v1/tasks", Some(&nobody), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.send("HEAD", "/api/v1/tasks", Some(&nobody), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.send("HEAD", "/api/v1/tasks", Some(&user), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = TestApp::new();
        let (status, body) = app.send_json("GET", "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
