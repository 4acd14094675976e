use crate::api::{TcBackend, TcClient, TcConfig};
use crate::config::AppConfig;
use crate::error::{ConsoleError, ErrorReport};
use crate::model::{self, Filter, Interface, PageVariant};
use crate::prefs::{PreferenceStore, Preferences, StoreError};
use crate::scan::ScanRequest;
use crate::submit::{SetupForm, SubmitFlow, SubmitOutcome, validate_reset};
use crate::ui::{self, PageProps};
use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: TcClient,
    pub store: Arc<dyn PreferenceStore>,
    pub simple_flow: Arc<SubmitFlow>,
    pub combined_flow: Arc<SubmitFlow>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, client: TcClient, store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            config,
            client,
            store,
            simple_flow: Arc::new(SubmitFlow::new()),
            combined_flow: Arc::new(SubmitFlow::new()),
        }
    }

    fn flow(&self, variant: PageVariant) -> &SubmitFlow {
        match variant {
            PageVariant::Simple => &self.simple_flow,
            PageVariant::Combined => &self.combined_flow,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(PageVariant::Simple.route(), get(simple_page))
        .route(PageVariant::Combined.route(), get(combined_page))
        .route("/tc/console/ifaces", get(interfaces))
        .route("/tc/console/query", get(query_config))
        .route("/tc/console/scan", post(scan))
        .route("/tc/console/setup/:variant", post(setup))
        .route("/tc/console/reset/:variant", post(reset))
        .route(
            "/tc/console/preferences/:variant",
            get(preferences).delete(forget_preferences),
        )
        .fallback(redirect_home)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState) -> Result<()> {
    let addr: SocketAddr = state.config.http_bind.parse()?;
    let router = router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Console listening on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(graceful_shutdown())
        .await?;

    Ok(())
}

async fn graceful_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutting down http server");
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!("Request handler panicked: {message}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorReport::fault(message)),
    )
        .into_response()
}

async fn redirect_home(RawQuery(query): RawQuery) -> Redirect {
    let home = PageVariant::Simple.route();
    match query.filter(|q| !q.is_empty()) {
        Some(q) => Redirect::to(&format!("{home}?{q}")),
        None => Redirect::to(home),
    }
}

async fn simple_page(State(state): State<AppState>) -> Html<String> {
    render_page(&state, PageVariant::Simple).await
}

async fn combined_page(State(state): State<AppState>) -> Html<String> {
    render_page(&state, PageVariant::Combined).await
}

// A failed init still renders the page, with the error panel open.
async fn render_page(state: &AppState, variant: PageVariant) -> Html<String> {
    let (ifaces, init_error) = match state.client.init().await {
        Ok(ifaces) => (ifaces, None),
        Err(err) => {
            tracing::warn!("Unable to list interfaces: {err}");
            (Vec::new(), Some(ErrorReport::from(&err)))
        }
    };
    let props = PageProps::load(variant, state.store.as_ref(), ifaces, init_error);
    Html(ui::render_page(props))
}

#[derive(Serialize)]
struct InterfacesResponse {
    ifaces: Vec<Interface>,
    ifbs: Vec<String>,
}

// Called again after each setup/reset: the backend may have added or removed
// ifb devices, each of which gets its own config panel.
async fn interfaces(State(state): State<AppState>) -> Result<Json<InterfacesResponse>, ConsoleError> {
    let ifaces = state.client.init().await?;
    let ifbs = model::ifb_devices(&ifaces)
        .into_iter()
        .map(|i| i.name)
        .collect();
    Ok(Json(InterfacesResponse { ifaces, ifbs }))
}

#[derive(Deserialize)]
struct ConfigQuery {
    iface: Option<String>,
}

async fn query_config(
    State(state): State<AppState>,
    Query(params): Query<ConfigQuery>,
) -> Result<Json<TcConfig>, ConsoleError> {
    let iface = validate_reset(params.iface.as_deref())
        .map_err(|err| ConsoleError::Validation(err.to_string()))?;
    Ok(Json(state.client.query(iface).await?))
}

async fn scan(
    State(state): State<AppState>,
    Json(body): Json<ScanRequest>,
) -> Result<Html<String>, ConsoleError> {
    let report = state.client.scan(&body).await?;
    tracing::info!(
        "Scan of {} captured {} endpoints",
        body.ifaces_param(),
        report.endpoint_count()
    );
    Ok(Html(ui::render_scan(&report)))
}

#[derive(Serialize)]
struct SubmitResponse {
    refresh: u64,
    data: Value,
}

impl TryFrom<SubmitOutcome> for SubmitResponse {
    type Error = ConsoleError;

    fn try_from(outcome: SubmitOutcome) -> Result<Self, Self::Error> {
        Ok(Self {
            refresh: outcome.refresh,
            data: outcome.result?,
        })
    }
}

async fn setup(
    State(state): State<AppState>,
    Path(variant): Path<PageVariant>,
    Json(body): Json<Value>,
) -> Result<Json<SubmitResponse>, ConsoleError> {
    let form = SetupForm::from_json(variant, body)
        .map_err(|err| ConsoleError::Validation(format!("Malformed form: {err}")))?;
    let outcome = state
        .flow(variant)
        .setup(
            &state.client,
            state.store.clone(),
            &form,
            state.config.api_port(),
        )
        .await?;
    Ok(Json(SubmitResponse::try_from(outcome)?))
}

#[derive(Deserialize)]
struct ResetRequest {
    #[serde(default)]
    iface: Option<String>,
}

async fn reset(
    State(state): State<AppState>,
    Path(variant): Path<PageVariant>,
    Json(body): Json<ResetRequest>,
) -> Result<Json<SubmitResponse>, ConsoleError> {
    let outcome = state
        .flow(variant)
        .reset(&state.client, body.iface.as_deref())
        .await?;
    Ok(Json(SubmitResponse::try_from(outcome)?))
}

#[derive(Serialize)]
struct PreferencesResponse {
    filter: Option<Filter>,
    strategy: Option<Value>,
}

async fn preferences(
    State(state): State<AppState>,
    Path(variant): Path<PageVariant>,
) -> Json<PreferencesResponse> {
    let prefs = Preferences::new(state.store.as_ref(), variant);
    Json(PreferencesResponse {
        filter: prefs.load_filter(),
        strategy: prefs.load_strategy(),
    })
}

async fn forget_preferences(
    State(state): State<AppState>,
    Path(variant): Path<PageVariant>,
) -> Result<StatusCode, ConsoleError> {
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || Preferences::new(store.as_ref(), variant).clear())
        .await
        .map_err(StoreError::from)??;
    tracing::info!("Cleared {} preferences", variant.slug());
    Ok(StatusCode::NO_CONTENT)
}
