use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, RawQuery, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, post},
    Json, Router,
};
use log::{debug, info};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_KEY_HEADER: &str = "x-ni-api-key";

pub type Record = Map<String, Value>;

#[derive(Debug, Default)]
pub struct Store {
    pub results: HashMap<String, Record>,
    /// Keyed by `(resultId, stepId)`.
    pub steps: HashMap<(String, String), Record>,
}

impl Store {
    fn remove_result(&mut self, id: &str, delete_steps: bool) -> bool {
        let removed = self.results.remove(id).is_some();
        if removed && delete_steps {
            self.steps.retain(|(result_id, _), _| result_id != id);
        }
        removed
    }

    fn refresh_total_time(&mut self, result_id: &str) {
        let total: f64 = self
            .steps
            .iter()
            .filter(|((rid, _), _)| rid == result_id)
            .filter_map(|(_, step)| step.get("totalTimeInSeconds").and_then(Value::as_f64))
            .sum();
        if let Some(result) = self.results.get_mut(result_id) {
            result.insert("totalTimeInSeconds".to_string(), json!(total));
        }
    }
}

pub struct AppState {
    pub api_key: String,
    pub store: RwLock<Store>,
}

pub type Db = Arc<AppState>;

#[derive(Deserialize)]
pub struct ResultsBody {
    pub results: Vec<Record>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsBody {
    pub steps: Vec<Record>,
    #[serde(default)]
    pub update_result_total_time: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResultsBody {
    pub results: Vec<Record>,
    #[serde(default)]
    pub determine_status_from_steps: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResultsBody {
    pub ids: Vec<String>,
    #[serde(default)]
    pub delete_steps: bool,
}

pub fn app(api_key: &str) -> Router {
    let db: Db = Arc::new(AppState {
        api_key: api_key.to_string(),
        store: RwLock::new(Store::default()),
    });
    Router::new()
        .route("/nitestmonitor/v2/results", post(create_results))
        .route("/nitestmonitor/v2/results/{id}", delete(delete_result))
        .route("/nitestmonitor/v2/steps", post(create_steps))
        .route("/nitestmonitor/v2/update-results", post(update_results))
        .route("/nitestmonitor/v2/update-steps", post(update_steps))
        .route("/nitestmonitor/v2/delete-results", post(delete_results))
        .layer(middleware::from_fn_with_state(db.clone(), require_api_key))
        .with_state(db)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": { "message": message } }))).into_response()
}

fn string_field<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

async fn require_api_key(State(db): State<Db>, request: Request, next: Next) -> Response {
    let supplied = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    if supplied != Some(db.api_key.as_str()) {
        return error_body(StatusCode::UNAUTHORIZED, "invalid API key".to_string());
    }
    next.run(request).await
}

async fn create_results(State(db): State<Db>, Json(input): Json<ResultsBody>) -> Response {
    let mut store = db.store.write().await;
    let mut created = Vec::with_capacity(input.results.len());
    for mut result in input.results {
        let id = match string_field(&result, "id") {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                result.insert("id".to_string(), json!(id));
                id
            }
        };
        debug!("created result {id}");
        store.results.insert(id, result.clone());
        created.push(result);
    }
    (StatusCode::CREATED, Json(json!({ "results": created }))).into_response()
}

async fn create_steps(State(db): State<Db>, Json(input): Json<StepsBody>) -> Response {
    let mut store = db.store.write().await;
    for step in &input.steps {
        match string_field(step, "resultId") {
            Some(rid) if store.results.contains_key(rid) => {}
            other => {
                return error_body(
                    StatusCode::BAD_REQUEST,
                    format!("result {:?} does not exist", other.unwrap_or_default()),
                )
            }
        }
    }
    let mut created = Vec::with_capacity(input.steps.len());
    for mut step in input.steps {
        let result_id = string_field(&step, "resultId").unwrap_or_default().to_string();
        let step_id = match string_field(&step, "stepId") {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                step.insert("stepId".to_string(), json!(id));
                id
            }
        };
        debug!("created step {step_id} on result {result_id}");
        store.steps.insert((result_id.clone(), step_id), step.clone());
        if input.update_result_total_time {
            store.refresh_total_time(&result_id);
        }
        created.push(step);
    }
    (StatusCode::CREATED, Json(json!({ "steps": created }))).into_response()
}

async fn update_results(State(db): State<Db>, Json(input): Json<UpdateResultsBody>) -> Response {
    let mut store = db.store.write().await;
    let mut updated = Vec::with_capacity(input.results.len());
    for patch in input.results {
        let Some(id) = string_field(&patch, "id").map(str::to_string) else {
            return error_body(StatusCode::BAD_REQUEST, "result id is required".to_string());
        };
        let Some(existing) = store.results.get_mut(&id) else {
            return error_body(StatusCode::NOT_FOUND, format!("result {id} does not exist"));
        };
        existing.extend(patch);
        updated.push(existing.clone());
    }
    debug!(
        "updated {} results (status from steps: {})",
        updated.len(),
        input.determine_status_from_steps
    );
    Json(json!({ "results": updated })).into_response()
}

async fn update_steps(State(db): State<Db>, Json(input): Json<StepsBody>) -> Response {
    let mut store = db.store.write().await;
    let mut updated = Vec::with_capacity(input.steps.len());
    for patch in input.steps {
        let key = match (string_field(&patch, "resultId"), string_field(&patch, "stepId")) {
            (Some(rid), Some(sid)) => (rid.to_string(), sid.to_string()),
            _ => {
                return error_body(
                    StatusCode::BAD_REQUEST,
                    "resultId and stepId are required".to_string(),
                )
            }
        };
        let Some(existing) = store.steps.get_mut(&key) else {
            return error_body(StatusCode::NOT_FOUND, format!("step {} does not exist", key.1));
        };
        existing.extend(patch);
        updated.push(existing.clone());
        if input.update_result_total_time {
            store.refresh_total_time(&key.0);
        }
    }
    Json(json!({ "steps": updated })).into_response()
}

/// Answers 204 when every id was removed, otherwise 200 listing the failures.
async fn delete_results(State(db): State<Db>, Json(input): Json<DeleteResultsBody>) -> Response {
    let mut store = db.store.write().await;
    let failed: Vec<String> = input
        .ids
        .into_iter()
        .filter(|id| !store.remove_result(id, input.delete_steps))
        .collect();
    if failed.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }
    info!("delete-results: {} ids not found", failed.len());
    Json(json!({ "failed": failed })).into_response()
}

/// The client sends the flag as a bare query token (`?deleteStepsTrue`).
async fn delete_result(
    State(db): State<Db>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<StatusCode, StatusCode> {
    let delete_steps = query.as_deref() != Some("deleteStepsFalse");
    let mut store = db.store.write().await;
    if store.remove_result(&id, delete_steps) {
        debug!("deleted result {id} (steps: {delete_steps})");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
