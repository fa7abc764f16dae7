// ./api/src/main.rs
use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json as JsonResponse, Response},
    routing::{get, put},
};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use application::{
    ApplicationError, CreatePostRequest, ErrorResponse, ListPostsQuery, NO_POST_SUBMITTED,
    PostService, SearchPostsQuery, UpdatePostRequest,
};
use domain::{Post, PostId};
use infrastructure::InMemoryPostRepository;

#[derive(Clone)]
struct AppState {
    post_service: Arc<PostService>,
}

const DEFAULT_PORT: u16 = 5002;

/// Settings read from the environment at start-up.
#[derive(Debug, Clone, PartialEq)]
struct ServerConfig {
    port: u16,
    seed_posts: bool,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self::from_vars(env::var("PORT").ok(), env::var("SEED_POSTS").ok())
    }

    fn from_vars(port: Option<String>, seed_posts: Option<String>) -> Self {
        let port = match port {
            Some(port_str) => match u16::from_str(&port_str) {
                Ok(port_num) => {
                    info!("Using port {} from environment variable PORT.", port_num);
                    port_num
                }
                Err(_) => {
                    warn!(
                        "Invalid PORT value '{}' in environment variable. Using default port {}.",
                        port_str, DEFAULT_PORT
                    );
                    DEFAULT_PORT
                }
            },
            None => {
                info!(
                    "PORT environment variable not set. Using default port {}.",
                    DEFAULT_PORT
                );
                DEFAULT_PORT
            }
        };
        let seed_posts = !matches!(
            seed_posts.as_deref().map(str::trim),
            Some("0") | Some("false") | Some("FALSE") | Some("no")
        );
        Self { port, seed_posts }
    }
}

/// Demo posts the service starts with.
fn seed_posts() -> Vec<Post> {
    vec![
        Post {
            id: PostId::new(1),
            title: "First post".to_string(),
            content: "This is the first post.".to_string(),
        },
        Post {
            id: PostId::new(2),
            title: "Second post".to_string(),
            content: "This is the second post.".to_string(),
        },
    ]
}

// Application entry point
#[tokio::main]
async fn main() {
    // --- Logger Initialization ---
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    let config = ServerConfig::from_env();

    // --- Dependency Injection ---
    let repository = if config.seed_posts {
        Arc::new(InMemoryPostRepository::with_posts(seed_posts()))
    } else {
        Arc::new(InMemoryPostRepository::new())
    };
    info!(seeded = config.seed_posts, "In-memory post repository initialized.");

    let app_state = AppState {
        post_service: Arc::new(PostService::new(repository)),
    };
    let app = build_router(app_state);
    info!("API routes configured.");

    // --- Server Startup ---
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
    info!("Server stopped.");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received.");
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/posts",
            get(list_posts_handler).post(create_post_handler),
        )
        .route("/api/posts/search", get(search_posts_handler))
        .route(
            "/api/posts/:id",
            put(update_post_handler).delete(delete_post_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// --- API Handlers ---

async fn health_check() -> impl IntoResponse {
    info!("Health check endpoint called");
    (StatusCode::OK, "OK")
}

/// GET /api/posts?sort=title|content&direction=asc|desc
async fn list_posts_handler(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Response {
    match state.post_service.list_posts(query).await {
        Ok(posts) => (StatusCode::OK, JsonResponse(posts)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// POST /api/posts
async fn create_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return reject_body(rejection),
    };
    match state.post_service.create_post(request).await {
        Ok(post) => (StatusCode::CREATED, JsonResponse(post)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// PUT /api/posts/:id
async fn update_post_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return reject_body(rejection),
    };
    match state.post_service.update_post(PostId::new(id), request).await {
        Ok(post) => (StatusCode::OK, JsonResponse(post)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// DELETE /api/posts/:id
async fn delete_post_handler(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.post_service.delete_post(PostId::new(id)).await {
        Ok(response) => (StatusCode::OK, JsonResponse(response)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// GET /api/posts/search?title=..&content=..
async fn search_posts_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchPostsQuery>,
) -> Response {
    match state.post_service.search_posts(query).await {
        Ok(posts) => (StatusCode::OK, JsonResponse(posts)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Any body the JSON extractor refuses (missing, wrong content type, malformed) is a 400.
fn reject_body(rejection: JsonRejection) -> Response {
    warn!("Rejected request body: {}", rejection.body_text());
    map_application_error_to_response(ApplicationError::InvalidInput(
        NO_POST_SUBMITTED.to_string(),
    ))
}

/// Maps ApplicationError to an HTTP status and a `{"error": ...}` body.
fn map_application_error_to_response(err: ApplicationError) -> Response {
    let status = match &err {
        ApplicationError::InvalidInput(_) | ApplicationError::DomainError(_) => {
            StatusCode::BAD_REQUEST
        }
        ApplicationError::PostNotFound(_) => StatusCode::NOT_FOUND,
    };
    (
        status,
        JsonResponse(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}
