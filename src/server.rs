use crate::config::Config;
use crate::data::{Day, GenerationOutput, GenerationRequest, TIME_ROWS, TimeRow};
use crate::store::{SavedTimetable, StoreError, TimetableStore, TimetableVersion, VersionId};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type ApiError = (StatusCode, String);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub version: TimetableVersion,
    pub output: GenerationOutput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub days: [Day; 6],
    pub time_rows: [TimeRow; 8],
}

#[derive(Debug, Deserialize)]
pub struct VersionQuery {
    search: Option<String>,
}

impl From<StoreError> for (StatusCode, String) {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::VersionNotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        }
    }
}

async fn generate_handler(
    State(store): State<Arc<TimetableStore>>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    if request.courses.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "No courses found. Please add courses first.".to_string(),
        ));
    }

    let output = request.generate();
    let version = store
        .record_generated(request.department.as_deref(), output.grid.clone())
        .await;
    Ok(Json(GenerateResponse { version, output }))
}

async fn publish_handler(
    State(store): State<Arc<TimetableStore>>,
    Path(id): Path<VersionId>,
) -> Result<Json<TimetableVersion>, ApiError> {
    Ok(Json(store.publish(id).await?))
}

async fn versions_handler(
    State(store): State<Arc<TimetableStore>>,
    Query(query): Query<VersionQuery>,
) -> Json<Vec<TimetableVersion>> {
    Json(store.versions(query.search.as_deref()).await)
}

async fn current_handler(State(store): State<Arc<TimetableStore>>) -> Json<SavedTimetable> {
    Json(store.current().await)
}

async fn table_handler(
    State(store): State<Arc<TimetableStore>>,
) -> Result<Json<Vec<Vec<String>>>, ApiError> {
    match store.current().await.grid {
        Some(grid) => Ok(Json(grid.table())),
        None => Err((
            StatusCode::NOT_FOUND,
            "No timetable has been generated yet.".to_string(),
        )),
    }
}

async fn layout_handler() -> Json<Layout> {
    Json(Layout {
        days: Day::ALL,
        time_rows: TIME_ROWS,
    })
}

pub fn router(store: Arc<TimetableStore>) -> Router {
    Router::new()
        .route("/v1/timetable", get(current_handler))
        .route("/v1/timetable/generate", post(generate_handler))
        .route("/v1/timetable/layout", get(layout_handler))
        .route("/v1/timetable/table", get(table_handler))
        .route("/v1/timetable/versions", get(versions_handler))
        .route("/v1/timetable/versions/:id/publish", post(publish_handler))
        .with_state(store)
}

pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let app = router(Arc::new(TimetableStore::new()));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
