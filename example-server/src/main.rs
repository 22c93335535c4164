use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use component_slugs::{SlugResolver, SlugResolverLayer, SlugTable, SqliteOracle, UniquenessOracle};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

mod database;

/// Insert attempts before giving up when a concurrent writer keeps taking the resolved slug
const MAX_INSERT_ATTEMPTS: u32 = 3;

const INSERT_COMPONENT: &str =
    "INSERT INTO components (user_id, name, component_slug) VALUES (?, ?, ?)";
const INSERT_DEMO: &str = "INSERT INTO demos (component_id, name, demo_slug) VALUES (?, ?, ?)";

#[derive(Clone)]
struct ApplicationState {
    pool: SqlitePool,
    components: Arc<SlugResolver<SqliteOracle>>,
    demos: Arc<SlugResolver<SqliteOracle>>,
}

#[derive(Debug, Error)]
enum ApplicationError {
    #[error(transparent)]
    Slug(#[from] component_slugs::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Slug kept being taken by concurrent inserts")]
    Contended,

    #[error("Owner {0} not found")]
    NotFound(i64),
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApplicationError::Slug(error) => component_slugs::api::status_for(error),
            ApplicationError::Contended => StatusCode::CONFLICT,
            ApplicationError::NotFound(_) => StatusCode::NOT_FOUND,
            ApplicationError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        tracing::warn!(error = %self, "request failed");
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct CreateRequest {
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Created {
    id: i64,
    name: String,
    slug: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Use path relative to example-server crate unless overridden
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:./data/example.db?mode=rwc".to_string());
    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:3000".to_string());

    let pool = SqlitePool::connect(&database_url).await?;

    // Run database setup and seed sample data
    database::setup(&pool).await?;

    let application_state = ApplicationState {
        pool: pool.clone(),
        components: Arc::new(SlugResolver::new(SqliteOracle::new(
            pool.clone(),
            SlugTable::components(),
        ))),
        demos: Arc::new(SlugResolver::new(SqliteOracle::new(
            pool.clone(),
            SlugTable::demos(),
        ))),
    };

    // SlugResolverLayer returns a stateless Router, so merge after with_state()
    let app = Router::new()
        .route("/", get(root_handler))
        .route("/api/health", get(health_handler))
        .route("/api/users/{user_id}/components", post(create_component_handler))
        .route("/api/components/{component_id}/demos", post(create_demo_handler))
        .with_state(application_state)
        .merge(
            SlugResolverLayer::sqlite("/slugs/components", pool.clone(), SlugTable::components())
                .into_router(),
        )
        .merge(SlugResolverLayer::sqlite("/slugs/demos", pool, SlugTable::demos()).into_router())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    tracing::info!("server running at http://{}", bind_address);
    tracing::info!(
        "resolve a component slug at http://{}/slugs/components/api/namespaces/1/resolve?name=My%20Button",
        bind_address
    );

    axum::serve(listener, app).await?;
    Ok(())
}

async fn root_handler() -> &'static str {
    "Welcome to the component-slugs example server"
}

async fn health_handler(
    State(state): State<ApplicationState>,
) -> Result<(StatusCode, &'static str), StatusCode> {
    // Try to verify database connectivity
    sqlx::query("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    Ok((StatusCode::OK, "Server is healthy"))
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(database_error) if database_error.is_unique_violation())
}

fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(database_error) if database_error.is_foreign_key_violation())
}

/// Resolve a slug and insert with it, re-resolving if a concurrent insert won the race
async fn insert_with_slug<O: UniquenessOracle>(
    pool: &SqlitePool,
    resolver: &SlugResolver<O>,
    namespace: i64,
    name: &str,
    insert_sql: &str,
) -> Result<Created, ApplicationError> {
    for _ in 0..MAX_INSERT_ATTEMPTS {
        let resolved = resolver.resolve(&namespace.to_string(), name).await?;

        let result = sqlx::query(insert_sql)
            .bind(namespace)
            .bind(name)
            .bind(&resolved.slug)
            .execute(pool)
            .await;

        match result {
            Ok(done) => {
                return Ok(Created {
                    id: done.last_insert_rowid(),
                    name: name.to_string(),
                    slug: resolved.slug,
                })
            }
            Err(error) if is_unique_violation(&error) => {
                tracing::info!(slug = %resolved.slug, "slug taken at insert, resolving again");
            }
            Err(error) if is_foreign_key_violation(&error) => {
                return Err(ApplicationError::NotFound(namespace))
            }
            Err(error) => return Err(error.into()),
        }
    }

    Err(ApplicationError::Contended)
}

async fn create_component_handler(
    State(state): State<ApplicationState>,
    Path(user_id): Path<i64>,
    Json(request): Json<CreateRequest>,
) -> Result<(StatusCode, Json<Created>), ApplicationError> {
    let created = insert_with_slug(
        &state.pool,
        &state.components,
        user_id,
        &request.name,
        INSERT_COMPONENT,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn create_demo_handler(
    State(state): State<ApplicationState>,
    Path(component_id): Path<i64>,
    Json(request): Json<CreateRequest>,
) -> Result<(StatusCode, Json<Created>), ApplicationError> {
    let created = insert_with_slug(
        &state.pool,
        &state.demos,
        component_id,
        &request.name,
        INSERT_DEMO,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}
