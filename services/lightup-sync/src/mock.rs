//! In-memory LightUpPi backend for testing
//!
//! Serves the `/LightUpPi/*` endpoints from a shared in-memory store so the
//! sync service can run end to end without a real alarm clock. Arguments
//! are parsed the way the real server parses them: a missing or malformed
//! argument answers HTTP 200 with an `error` field.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::model::{Alarm, Station, Weekdays};

type Args = HashMap<String, String>;
type Reply = std::result::Result<Value, String>;

/// How the backend misbehaves while a failure is injected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Every endpoint answers 200 with an `error` field
    ApplicationError,
    /// Every endpoint answers HTTP 500
    ServerError,
}

#[derive(Debug, Default)]
struct MockStore {
    alarms: Vec<Alarm>,
    stations: Vec<Station>,
    next_alarm_id: i64,
    next_station_id: i64,
    failure: Option<MockFailure>,
    requests: Vec<String>,
}

/// Handle to the shared backend store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    store: Arc<Mutex<MockStore>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend preloaded with `alarms` and `stations`
    pub fn with_data(alarms: Vec<Alarm>, stations: Vec<Station>) -> Self {
        let store = MockStore {
            next_alarm_id: alarms.iter().map(|a| a.id).max().unwrap_or(0),
            next_station_id: stations.iter().map(|s| s.id).max().unwrap_or(0),
            alarms,
            stations,
            ..MockStore::default()
        };
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Inject a failure, or clear it with `None`
    pub async fn set_failure(&self, failure: Option<MockFailure>) {
        self.store.lock().await.failure = failure;
    }

    pub async fn alarms(&self) -> Vec<Alarm> {
        self.store.lock().await.alarms.clone()
    }

    pub async fn stations(&self) -> Vec<Station> {
        self.store.lock().await.stations.clone()
    }

    /// Endpoint names in the order they were requested
    pub async fn requests(&self) -> Vec<String> {
        self.store.lock().await.requests.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/LightUpPi/{endpoint}", get(endpoint_handler))
            .with_state(self.clone())
    }
}

/// Serve `backend` on `listener` until `cancel` fires
pub async fn serve(
    listener: TcpListener,
    backend: MockBackend,
    cancel: CancellationToken,
) -> crate::Result<()> {
    axum::serve(listener, backend.router())
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}

async fn endpoint_handler(
    State(backend): State<MockBackend>,
    Path(endpoint): Path<String>,
    Query(args): Query<Args>,
) -> Response {
    let mut store = backend.store.lock().await;
    debug!("Mock backend request: {} {:?}", endpoint, args);
    store.requests.push(endpoint.clone());

    match store.failure {
        Some(MockFailure::ServerError) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "mock server error").into_response();
        }
        Some(MockFailure::ApplicationError) if endpoint != "ping" => {
            return Json(json!({ "error": "Mock backend failure" })).into_response();
        }
        _ => {}
    }

    let reply = match endpoint.as_str() {
        "ping" => return StatusCode::OK.into_response(),
        "getAlarm" => get_alarm(&store, &args),
        "addAlarm" => add_alarm(&mut store, &args),
        "editAlarm" => edit_alarm(&mut store, &args),
        "deleteAlarm" => delete_alarm(&mut store, &args),
        "getStation" => get_station(&store, &args),
        "addStation" => add_station(&mut store, &args),
        "deleteStation" => delete_station(&mut store, &args),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    match reply {
        Ok(body) => Json(body).into_response(),
        Err(message) => Json(json!({ "error": message })).into_response(),
    }
}

fn get_alarm(store: &MockStore, args: &Args) -> Reply {
    match args.get("id").map(String::as_str) {
        None => Err("The 'id' argument is required for 'getAlarm'".to_string()),
        Some("all") => Ok(json!({
            "dataType": "All alarms",
            "size": store.alarms.len(),
            "alarms": store.alarms,
        })),
        Some(raw) => {
            let id: i64 = raw
                .parse()
                .map_err(|_| "The 'id' argument has to be an integer".to_string())?;
            let alarm = store
                .alarms
                .iter()
                .find(|a| a.id == id)
                .ok_or_else(|| "This alarm does not exists".to_string())?;
            serde_json::to_value(alarm).map_err(|e| e.to_string())
        }
    }
}

fn add_alarm(store: &mut MockStore, args: &Args) -> Reply {
    let hour = time_field(args, "hour", 23)?
        .ok_or_else(|| "The 'hour' argument is required to add alarm".to_string())?;
    let minute = time_field(args, "minute", 59)?
        .ok_or_else(|| "The 'minute' argument is required to add alarm".to_string())?;

    // Absent day and enabled flags default to true
    let mut days = [true; 7];
    for (day, name) in days.iter_mut().zip(Weekdays::NAMES) {
        if let Some(value) = bool_field(args, name)? {
            *day = value;
        }
    }
    let enabled = bool_field(args, "enabled")?.unwrap_or(true);
    let label = args.get("label").cloned().unwrap_or_default();
    let timestamp = match args.get("timestamp") {
        Some(raw) => raw
            .parse()
            .map_err(|_| "The 'timestamp' argument must be an integer".to_string())?,
        None => epoch_seconds(),
    };

    store.next_alarm_id += 1;
    let id = store.next_alarm_id;
    store.alarms.push(Alarm {
        id,
        hour,
        minute,
        days: Weekdays::from_array(days),
        enabled,
        label,
        timestamp,
        station_id: Some(1),
    });

    Ok(json!({
        "dataType": "Add alarm",
        "id": id,
        "success": true,
        "timestamp": timestamp,
    }))
}

fn edit_alarm(store: &mut MockStore, args: &Args) -> Reply {
    let id = required_id(args, "The 'id' argument is required to edit alarm")?;
    let hour = time_field(args, "hour", 23)?;
    let minute = time_field(args, "minute", 59)?;
    let mut days = Vec::with_capacity(7);
    for name in Weekdays::NAMES {
        days.push(bool_field(args, name)?);
    }
    let enabled = bool_field(args, "enabled")?;
    let label = args.get("label").cloned();

    let Some(alarm) = store.alarms.iter_mut().find(|a| a.id == id) else {
        return Ok(json!({
            "dataType": "Edit alarm",
            "id": id,
            "success": false,
            "error": "This alarm does not exists",
        }));
    };

    if let Some(hour) = hour {
        alarm.hour = hour;
    }
    if let Some(minute) = minute {
        alarm.minute = minute;
    }
    let mut current = alarm.days.as_array();
    for (day, value) in current.iter_mut().zip(days) {
        if let Some(value) = value {
            *day = value;
        }
    }
    alarm.days = Weekdays::from_array(current);
    if let Some(enabled) = enabled {
        alarm.enabled = enabled;
    }
    if let Some(label) = label {
        alarm.label = label;
    }

    Ok(json!({
        "dataType": "Edit alarm",
        "id": id,
        "success": true,
        "timestamp": alarm.timestamp,
    }))
}

fn delete_alarm(store: &mut MockStore, args: &Args) -> Reply {
    let id = required_id(args, "The 'id' argument is required for 'deleteAlarm'")?;
    let before = store.alarms.len();
    store.alarms.retain(|a| a.id != id);
    Ok(json!({
        "dataType": "Deleted alarm",
        "id": id,
        "success": store.alarms.len() < before,
    }))
}

fn get_station(store: &MockStore, args: &Args) -> Reply {
    match args.get("id").map(String::as_str) {
        None => Err("The 'id' argument is required for 'getStation'".to_string()),
        Some("all") => Ok(json!({
            "dataType": "All stations",
            "size": store.stations.len(),
            "stations": store.stations,
        })),
        Some(raw) => {
            let id: i64 = raw
                .parse()
                .map_err(|_| "The 'id' argument has to be an integer".to_string())?;
            let station = store
                .stations
                .iter()
                .find(|s| s.id == id)
                .ok_or_else(|| "This station does not exists".to_string())?;
            serde_json::to_value(station).map_err(|e| e.to_string())
        }
    }
}

fn add_station(store: &mut MockStore, args: &Args) -> Reply {
    let name = args
        .get("name")
        .cloned()
        .ok_or_else(|| "The 'name' argument is required to add station".to_string())?;
    let url = args
        .get("url")
        .cloned()
        .ok_or_else(|| "The 'url' argument is required to add station".to_string())?;

    store.next_station_id += 1;
    let id = store.next_station_id;
    store.stations.push(Station { id, name, url });

    Ok(json!({
        "dataType": "Add station",
        "id": id,
        "success": true,
    }))
}

fn delete_station(store: &mut MockStore, args: &Args) -> Reply {
    let id = required_id(args, "The 'id' argument is required for 'deleteStation'")?;
    let before = store.stations.len();
    store.stations.retain(|s| s.id != id);
    Ok(json!({
        "dataType": "Deleted station",
        "id": id,
        "success": store.stations.len() < before,
    }))
}

fn required_id(args: &Args, missing: &str) -> std::result::Result<i64, String> {
    args.get("id")
        .ok_or_else(|| missing.to_string())?
        .parse()
        .map_err(|_| "The 'id' argument must be an integer".to_string())
}

/// Optional hour or minute argument, bounded by `max`
fn time_field(args: &Args, name: &str, max: u8) -> std::result::Result<Option<u8>, String> {
    let Some(raw) = args.get(name) else {
        return Ok(None);
    };
    let value: u8 = raw
        .parse()
        .map_err(|_| format!("The '{}' argument must be an integer", name))?;
    if value > max {
        return Err(format!(
            "The '{}' argument must be between 0 and {}",
            name, max
        ));
    }
    Ok(Some(value))
}

/// Optional boolean argument: true/yes/enabled or false/no/disabled, any case
fn bool_field(args: &Args, name: &str) -> std::result::Result<Option<bool>, String> {
    let Some(raw) = args.get(name) else {
        return Ok(None);
    };
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "enabled" => Ok(Some(true)),
        "false" | "no" | "disabled" => Ok(Some(false)),
        _ => Err(format!("The '{}' argument has to be a bool", name)),
    }
}

fn epoch_seconds() -> i64 {
    (crate::sync::current_epoch_ms() / 1000) as i64
}
