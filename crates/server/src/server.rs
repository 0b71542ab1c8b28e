use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, Error as AxumError, Header, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{api_user, catalog, profile, purchases};
use engine::Engine;

static TELEGRAM_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("telegram-user-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// The Telegram user the request acts for, taken from the request header by
/// the auth middleware. Routes that touch an account require it.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TelegramUser(pub i64);

/// `TypedHeader` for custom telegram header
///
/// Telegram requests must contain "telegram-user-id" entry in the header.
#[derive(Debug)]
struct TelegramHeader(i64);

impl Header for TelegramHeader {
    fn name() -> &'static axum::http::HeaderName {
        &TELEGRAM_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let Ok(value) = value.parse() else {
            return Err(AxumError::invalid());
        };

        Ok(TelegramHeader(value))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        let as_string = self.0.to_string();
        match axum::http::HeaderValue::from_str(&as_string) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode telegram-user-id header"),
        }
    }
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    telegram_header: Option<TypedHeader<TelegramHeader>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<api_user::Model> = api_user::Entity::find()
        .filter(api_user::Column::Username.eq(auth_header.username()))
        .filter(api_user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    if let Some(header) = telegram_header {
        request.extensions_mut().insert(TelegramUser(header.0.0));
    }

    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/catalog/departments",
            get(catalog::list_departments).post(catalog::branch_new),
        )
        .route("/catalog/semesters", get(catalog::list_semesters))
        .route("/catalog/years", get(catalog::list_years))
        .route(
            "/catalog/papers",
            get(catalog::list_papers).post(catalog::paper_new),
        )
        .route(
            "/catalog/papers/{id}/price",
            axum::routing::patch(catalog::set_price),
        )
        .route("/catalog/prune", post(catalog::prune))
        .route("/purchase", post(purchases::purchase))
        .route("/purchaseBulk", post(purchases::purchase_bulk))
        .route("/topup", post(purchases::topup))
        .route("/payments/reconcile", post(purchases::reconcile))
        .route("/profile", get(profile::get_profile))
        .route("/accounts/telegramIds", get(profile::telegram_ids))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::catalog::DepartmentList;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode, header};
    use base64::Engine as _;
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ActiveValue, Database};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();

        let credentials = api_user::ActiveModel {
            username: ActiveValue::Set("bot".to_string()),
            password: ActiveValue::Set("secret".to_string()),
        };
        api_user::Entity::insert(credentials).exec(&db).await.unwrap();

        let engine = Engine::builder().database(db.clone()).build().await.unwrap();
        router(ServerState {
            engine: Arc::new(engine),
            db,
        })
    }

    fn basic_auth(username: &str, password: &str) -> String {
        format!(
            "Basic {}",
            base64::prelude::BASE64_STANDARD.encode(format!("{username}:{password}"))
        )
    }

    #[tokio::test]
    async fn rejects_bad_credentials() {
        let app = test_router().await;

        let response = app
            .oneshot(
                HttpRequest::get("/catalog/departments")
                    .header(header::AUTHORIZATION, basic_auth("bot", "wrong"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn lists_created_departments() {
        let app = test_router().await;

        let response = app
            .clone()
            .oneshot(
                HttpRequest::post("/catalog/departments")
                    .header(header::AUTHORIZATION, basic_auth("bot", "secret"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"department":"CSE"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(
                HttpRequest::get("/catalog/departments")
                    .header(header::AUTHORIZATION, basic_auth("bot", "secret"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let list: DepartmentList = serde_json::from_slice(&body).unwrap();
        assert_eq!(list.departments, vec!["CSE".to_string()]);
    }

    #[tokio::test]
    async fn purchase_requires_telegram_header() {
        let app = test_router().await;

        let response = app
            .oneshot(
                HttpRequest::post("/purchase")
                    .header(header::AUTHORIZATION, basic_auth("bot", "secret"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"paper_id":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn profile_starts_empty() {
        let app = test_router().await;

        let response = app
            .oneshot(
                HttpRequest::get("/profile")
                    .header(header::AUTHORIZATION, basic_auth("bot", "secret"))
                    .header("telegram-user-id", "12345")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let profile: api_types::wallet::ProfileView = serde_json::from_slice(&body).unwrap();
        assert_eq!(profile.stars, 0);
        assert!(profile.owned.is_empty());
    }
}
