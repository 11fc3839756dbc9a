//! REST API for the stone sorting service.
//!
//! Provides a stateless distribution endpoint, session endpoints mirroring
//! the interactive workflow (add, remove, sort, clear, generate) and the
//! embedded web UI. Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Json, Path, State};
use axum::{
    Router,
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, DistributorConfig};
use crate::distributor::{
    AssignedContainer, DistributionConfig, DistributionOutcome, DistributionResult,
    SearchStatistics, distribute_with_config,
};
use crate::generator::{FixtureParams, GeneratorError, generate_fixture};
use crate::model::{Container, Stone, StoneColor, ValidationError, ensure_unique_stones};
use crate::session::{SessionError, SessionLimits, SessionStore, SortingSession};

#[derive(Clone)]
struct ApiState {
    store: SessionStore,
    distribution: DistributionConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>stone-sorter API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Embedded Web Assets (HTML, CSS, JS)
#[derive(RustEmbed)]
#[folder = "web/"]
struct WebAssets;

/// A container as supplied by clients.
#[derive(Deserialize, Clone, ToSchema)]
#[schema(example = json!({ "name": "Ring set", "target_mass": 4.5, "tolerance": 0.05 }))]
pub struct ContainerRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub target_mass: f64,
    pub tolerance: f64,
}

/// A stone for the stateless endpoint; `id` defaults to the 1-based position.
#[derive(Deserialize, Clone, ToSchema)]
pub struct StoneRequest {
    #[serde(default)]
    pub id: Option<usize>,
    pub mass: f64,
}

#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "containers": [
            { "name": "Ring set", "target_mass": 10.0, "tolerance": 1.0 }
        ],
        "stones": [
            { "id": 1, "mass": 5.0 },
            { "id": 2, "mass": 5.5 }
        ]
    })
)]
pub struct DistributeRequest {
    pub containers: Vec<ContainerRequest>,
    pub stones: Vec<StoneRequest>,
}

impl DistributeRequest {
    fn into_validated(self) -> Result<(Vec<Stone>, Vec<Container>), ValidationError> {
        let containers = self
            .containers
            .into_iter()
            .enumerate()
            .map(|(idx, item)| Container::new(idx + 1, item.name, item.target_mass, item.tolerance))
            .collect::<Result<Vec<_>, _>>()?;

        let stones = self
            .stones
            .into_iter()
            .enumerate()
            .map(|(idx, item)| Stone::new(item.id.unwrap_or(idx + 1), item.mass))
            .collect::<Result<Vec<_>, _>>()?;
        ensure_unique_stones(&stones)?;

        Ok((stones, containers))
    }
}

#[derive(Deserialize, ToSchema)]
#[schema(example = json!({ "mass": 1.25 }))]
pub struct AddStoneRequest {
    pub mass: f64,
}

/// Fixture parameters; omitted fields use the generator defaults.
#[derive(Deserialize, Default, ToSchema)]
#[schema(example = json!({ "num_containers": 2, "mass_range": [3.0, 8.0], "max_stones_per_container": 4 }))]
pub struct GenerateRequest {
    #[serde(default)]
    pub num_containers: Option<usize>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<f64>>)]
    pub mass_range: Option<(f64, f64)>,
    #[serde(default)]
    pub max_stones_per_container: Option<usize>,
    /// Fixed seed for reproducible fixtures
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GenerateRequest {
    fn params(&self) -> FixtureParams {
        let defaults = FixtureParams::default();
        FixtureParams {
            num_containers: self.num_containers.unwrap_or(defaults.num_containers),
            mass_range: self.mass_range.unwrap_or(defaults.mass_range),
            max_stones_per_container: self
                .max_stones_per_container
                .unwrap_or(defaults.max_stones_per_container),
        }
    }
}

/// Stones and totals chosen for one container.
#[derive(Serialize, ToSchema)]
pub struct AssignedContainerResponse {
    pub container_id: usize,
    pub container_name: String,
    pub target_mass: f64,
    pub tolerance: f64,
    pub min_mass: f64,
    pub max_mass: f64,
    pub stones: Vec<Stone>,
    pub total_mass: f64,
    pub deviation: f64,
}

impl From<&AssignedContainer> for AssignedContainerResponse {
    fn from(entry: &AssignedContainer) -> Self {
        let container = &entry.container;
        Self {
            container_id: container.id,
            container_name: container.name.clone(),
            target_mass: container.target_mass,
            tolerance: container.tolerance,
            min_mass: container.min_mass,
            max_mass: container.max_mass,
            stones: entry.stones.clone(),
            total_mass: entry.total_mass,
            deviation: entry.deviation,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StatisticsResponse {
    pub nodes_explored: u64,
    pub subsets_examined: u64,
    pub backtracks: u64,
    pub max_depth: usize,
    pub elapsed_ms: f64,
}

impl From<&SearchStatistics> for StatisticsResponse {
    fn from(stats: &SearchStatistics) -> Self {
        Self {
            nodes_explored: stats.nodes_explored,
            subsets_examined: stats.subsets_examined,
            backtracks: stats.backtracks,
            max_depth: stats.max_depth,
            elapsed_ms: stats.elapsed.as_secs_f64() * 1000.0,
        }
    }
}

/// Result of a distribution run.
///
/// On success `distribution` holds one entry per container in processing
/// order (largest target first). On failure it is empty and `reason_code`
/// is one of `nothing_to_do`, `infeasible` or `search_limit_reached`.
#[derive(Serialize, ToSchema)]
pub struct DistributionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub distribution: Vec<AssignedContainerResponse>,
    pub statistics: StatisticsResponse,
}

impl DistributionResponse {
    pub fn from_outcome(outcome: &DistributionOutcome) -> Self {
        let statistics = StatisticsResponse::from(&outcome.statistics);
        match &outcome.result {
            DistributionResult::Success(assignment) => Self {
                success: true,
                reason_code: None,
                message: None,
                distribution: assignment
                    .entries()
                    .iter()
                    .map(AssignedContainerResponse::from)
                    .collect(),
                statistics,
            },
            DistributionResult::Failure(reason) => Self {
                success: false,
                reason_code: Some(reason.code().to_string()),
                message: Some(reason.to_string()),
                distribution: Vec::new(),
                statistics,
            },
        }
    }
}

/// Full state of a session.
#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: u64,
    pub containers: Vec<Container>,
    pub stones: Vec<Stone>,
    pub result: Option<DistributionResponse>,
}

impl SessionResponse {
    fn from_session(id: u64, session: &SortingSession) -> Self {
        Self {
            id,
            containers: session.containers().to_vec(),
            stones: session.stones().to_vec(),
            result: session.result().map(DistributionResponse::from_outcome),
        }
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

/// Errors returned by the handlers.
#[derive(Debug, Error)]
enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error(transparent)]
    Path(#[from] PathRejection),
    #[error("Background task failed: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Session(
                SessionError::NotFound(_)
                | SessionError::ContainerNotFound(_)
                | SessionError::StoneNotFound(_),
            ) => StatusCode::NOT_FOUND,
            ApiError::Session(SessionError::Validation(_))
            | ApiError::Validation(_)
            | ApiError::Generator(_)
            | ApiError::Json(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Path(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ApiError::Session(SessionError::Validation(_)) | ApiError::Validation(_) => {
                "Invalid input data"
            }
            ApiError::Session(_) => "Not found",
            ApiError::Generator(_) => "Invalid generator parameters",
            ApiError::Json(_) => "Invalid JSON data",
            ApiError::Path(_) => "Invalid path parameter",
            ApiError::Internal(_) => "Internal error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(details) = &self {
            error!("{details}");
        }
        let status = self.status();
        let body = ErrorResponse::new(self.title(), self.to_string());
        (status, Json(body)).into_response()
    }
}

fn parse_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(value)| value).map_err(ApiError::from)
}

fn parse_path<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    path.map(|Path(value)| value).map_err(ApiError::from)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handle_distribute,
        create_session,
        get_session,
        delete_session,
        add_container,
        remove_container,
        add_stone,
        remove_stone,
        sort_session,
        clear_session,
        generate_session
    ),
    components(
        schemas(
            DistributeRequest,
            ContainerRequest,
            StoneRequest,
            AddStoneRequest,
            GenerateRequest,
            DistributionResponse,
            AssignedContainerResponse,
            StatisticsResponse,
            SessionResponse,
            ErrorResponse,
            Container,
            Stone,
            StoneColor
        )
    ),
    tags(
        (name = "distribution", description = "Stateless stone distribution"),
        (name = "sessions", description = "Interactive sorting sessions")
    )
)]
struct ApiDoc;

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        // API endpoints
        .route("/distribute", post(handle_distribute))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/containers", post(add_container))
        .route(
            "/sessions/{id}/containers/{container_id}",
            delete(remove_container),
        )
        .route("/sessions/{id}/stones", post(add_stone))
        .route("/sessions/{id}/stones/{number}", delete(remove_stone))
        .route("/sessions/{id}/sort", post(sort_session))
        .route("/sessions/{id}/clear", post(clear_session))
        .route("/sessions/{id}/generate", post(generate_session))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        // Web-UI (embedded)
        .route("/", get(serve_index))
        .route("/{*path}", get(serve_static))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
///
/// Blocks until the server is terminated.
pub async fn start_api_server(
    config: ApiConfig,
    distributor_config: DistributorConfig,
    session_limits: SessionLimits,
) {
    let state = ApiState {
        store: SessionStore::with_limits(session_limits),
        distribution: distributor_config.distribution_config(),
    };
    let app = router(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    info!(
        "Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        info!("Local access: http://localhost:{}", config.port());
    }
    info!("API: POST /distribute, /sessions/...; docs at /docs");

    if let Err(err) = axum::serve(listener, app).await {
        error!("API server terminated with an error: {err}");
    }
}

/// Runs CPU-bound work (search, fixture generation) off the async runtime.
async fn run_blocking<T, F>(job: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))
}

/// Handler for POST /distribute.
///
/// Distributes the given stones across the given containers without touching any session.
#[utoipa::path(
    post,
    path = "/distribute",
    request_body = DistributeRequest,
    responses(
        (status = 200, description = "Distribution result (success or failure reason)", body = DistributionResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "distribution"
)]
async fn handle_distribute(
    State(state): State<ApiState>,
    payload: Result<Json<DistributeRequest>, JsonRejection>,
) -> Result<Json<DistributionResponse>, ApiError> {
    let (stones, containers) = parse_json(payload)?.into_validated()?;
    info!(
        stones = stones.len(),
        containers = containers.len(),
        "distribution request"
    );

    let config = state.distribution;
    let outcome = run_blocking(move || distribute_with_config(&stones, &containers, config)).await?;
    Ok(Json(DistributionResponse::from_outcome(&outcome)))
}

fn session_response(state: &ApiState, id: u64) -> Result<Json<SessionResponse>, ApiError> {
    let response = state
        .store
        .with_session(id, |session| SessionResponse::from_session(id, session))?;
    Ok(Json(response))
}

/// Handler for POST /sessions.
#[utoipa::path(
    post,
    path = "/sessions",
    responses((status = 201, description = "Session created", body = SessionResponse)),
    tag = "sessions"
)]
async fn create_session(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let id = state.store.create();
    let response = session_response(&state, id)?;
    Ok((StatusCode::CREATED, response).into_response())
}

/// Handler for GET /sessions/{id}.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = u64, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session state", body = SessionResponse),
        (status = NOT_FOUND, description = "Unknown session", body = ErrorResponse)
    ),
    tag = "sessions"
)]
async fn get_session(
    State(state): State<ApiState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let id = parse_path(path)?;
    session_response(&state, id)
}

/// Handler for DELETE /sessions/{id}.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(("id" = u64, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session dropped"),
        (status = NOT_FOUND, description = "Unknown session", body = ErrorResponse)
    ),
    tag = "sessions"
)]
async fn delete_session(
    State(state): State<ApiState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_path(path)?;
    state.store.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /sessions/{id}/containers.
#[utoipa::path(
    post,
    path = "/sessions/{id}/containers",
    params(("id" = u64, Path, description = "Session id")),
    request_body = ContainerRequest,
    responses(
        (status = 200, description = "Updated session", body = SessionResponse),
        (status = NOT_FOUND, description = "Unknown session", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid container", body = ErrorResponse)
    ),
    tag = "sessions"
)]
async fn add_container(
    State(state): State<ApiState>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<ContainerRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let id = parse_path(path)?;
    let request = parse_json(payload)?;
    state.store.with_session(id, |session| {
        session
            .add_container(request.name, request.target_mass, request.tolerance)
            .map(|_| ())
    })??;
    session_response(&state, id)
}

/// Handler for DELETE /sessions/{id}/containers/{container_id}.
#[utoipa::path(
    delete,
    path = "/sessions/{id}/containers/{container_id}",
    params(
        ("id" = u64, Path, description = "Session id"),
        ("container_id" = usize, Path, description = "Container id")
    ),
    responses(
        (status = 200, description = "Updated session", body = SessionResponse),
        (status = NOT_FOUND, description = "Unknown session or container", body = ErrorResponse)
    ),
    tag = "sessions"
)]
async fn remove_container(
    State(state): State<ApiState>,
    path: Result<Path<(u64, usize)>, PathRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (id, container_id) = parse_path(path)?;
    state
        .store
        .with_session(id, |session| session.remove_container(container_id).map(|_| ()))??;
    session_response(&state, id)
}

/// Handler for POST /sessions/{id}/stones.
///
/// The stone number and color are assigned by the session.
#[utoipa::path(
    post,
    path = "/sessions/{id}/stones",
    params(("id" = u64, Path, description = "Session id")),
    request_body = AddStoneRequest,
    responses(
        (status = 200, description = "Updated session", body = SessionResponse),
        (status = NOT_FOUND, description = "Unknown session", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid mass", body = ErrorResponse)
    ),
    tag = "sessions"
)]
async fn add_stone(
    State(state): State<ApiState>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<AddStoneRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let id = parse_path(path)?;
    let request = parse_json(payload)?;
    state
        .store
        .with_session(id, |session| session.add_stone(request.mass).map(|_| ()))??;
    session_response(&state, id)
}

/// Handler for DELETE /sessions/{id}/stones/{number}.
#[utoipa::path(
    delete,
    path = "/sessions/{id}/stones/{number}",
    params(
        ("id" = u64, Path, description = "Session id"),
        ("number" = usize, Path, description = "Stone number")
    ),
    responses(
        (status = 200, description = "Updated session", body = SessionResponse),
        (status = NOT_FOUND, description = "Unknown session or stone", body = ErrorResponse)
    ),
    tag = "sessions"
)]
async fn remove_stone(
    State(state): State<ApiState>,
    path: Result<Path<(u64, usize)>, PathRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (id, number) = parse_path(path)?;
    state
        .store
        .with_session(id, |session| session.remove_stone(number).map(|_| ()))??;
    session_response(&state, id)
}

/// Handler for POST /sessions/{id}/sort.
///
/// Runs the distribution on a copy of the session data and stores the result
/// unless the session changed while the search was running.
#[utoipa::path(
    post,
    path = "/sessions/{id}/sort",
    params(("id" = u64, Path, description = "Session id")),
    responses(
        (status = 200, description = "Distribution result", body = DistributionResponse),
        (status = NOT_FOUND, description = "Unknown session", body = ErrorResponse)
    ),
    tag = "sessions"
)]
async fn sort_session(
    State(state): State<ApiState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<DistributionResponse>, ApiError> {
    let id = parse_path(path)?;
    let input = state.store.with_session(id, |session| session.snapshot())?;
    let revision = input.revision;
    info!(
        session = id,
        stones = input.stones.len(),
        containers = input.containers.len(),
        "sorting session"
    );

    let config = state.distribution;
    let outcome = run_blocking(move || input.run(config)).await?;
    let response = DistributionResponse::from_outcome(&outcome);
    state
        .store
        .with_session(id, |session| session.store_result(revision, outcome))?;
    Ok(Json(response))
}

/// Handler for POST /sessions/{id}/clear.
#[utoipa::path(
    post,
    path = "/sessions/{id}/clear",
    params(("id" = u64, Path, description = "Session id")),
    responses(
        (status = 200, description = "Emptied session", body = SessionResponse),
        (status = NOT_FOUND, description = "Unknown session", body = ErrorResponse)
    ),
    tag = "sessions"
)]
async fn clear_session(
    State(state): State<ApiState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let id = parse_path(path)?;
    state.store.with_session(id, SortingSession::clear)?;
    session_response(&state, id)
}

/// Handler for POST /sessions/{id}/generate.
///
/// Replaces the session data with generated containers and a shuffled stone pool.
#[utoipa::path(
    post,
    path = "/sessions/{id}/generate",
    params(("id" = u64, Path, description = "Session id")),
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Session with generated data", body = SessionResponse),
        (status = NOT_FOUND, description = "Unknown session", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid parameters", body = ErrorResponse)
    ),
    tag = "sessions"
)]
async fn generate_session(
    State(state): State<ApiState>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let id = parse_path(path)?;
    let request = parse_json(payload)?;
    let params = request.params();
    let seed = request.seed;
    let fixture = run_blocking(move || {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        generate_fixture(&params, &mut rng)
    })
    .await??;
    info!(
        session = id,
        containers = fixture.containers.len(),
        stones = fixture.stones.len(),
        "generated fixture"
    );
    state
        .store
        .with_session(id, |session| session.load_fixture(fixture))?;
    session_response(&state, id)
}

/// Serves the index.html main page
async fn serve_index() -> Response {
    match WebAssets::get("index.html") {
        Some(content) => Html(content.data).into_response(),
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Serves static assets (JS, CSS, etc.)
async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    match WebAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
