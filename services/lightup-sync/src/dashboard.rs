//! Web dashboard: JSON view of the synchronized collections, mutation
//! endpoints, and a server-rendered overview page

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::config::Theme;
use crate::dispatcher::MutationDispatcher;
use crate::model::{AlarmPatch, NewAlarm, StationForm};
use crate::sync::{AlarmSync, StationSync};

/// Named stylesheets the overview page can use
#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    themes: Vec<Theme>,
}

impl ThemeRegistry {
    pub fn new(themes: Vec<Theme>) -> Self {
        Self { themes }
    }

    /// Theme called `name`, falling back to the first registered theme
    pub fn resolve(&self, name: Option<&str>) -> Option<&Theme> {
        name.and_then(|name| self.themes.iter().find(|t| t.name == name))
            .or_else(|| self.themes.first())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.iter().map(|t| t.name.as_str())
    }
}

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub alarms: Arc<AlarmSync>,
    pub stations: Arc<StationSync>,
    pub dispatcher: Arc<MutationDispatcher>,
    pub themes: Arc<ThemeRegistry>,
}

/// Build the dashboard axum router
pub fn build_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/alarms", get(alarms_handler).post(add_alarm_handler))
        .route(
            "/api/alarms/{id}",
            delete(delete_alarm_handler).patch(edit_alarm_handler),
        )
        .route("/api/alarms/{id}/toggle", post(toggle_alarm_handler))
        .route(
            "/api/stations",
            get(stations_handler).post(add_station_handler),
        )
        .route("/api/stations/{id}", delete(delete_station_handler))
        .route("/api/refresh", post(refresh_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct IndexQuery {
    theme: Option<String>,
}

async fn index_handler(
    State(dashboard): State<DashboardState>,
    Query(query): Query<IndexQuery>,
) -> impl IntoResponse {
    let alarms = dashboard.alarms.snapshot();
    let stations = dashboard.stations.snapshot();
    let theme = dashboard.themes.resolve(query.theme.as_deref());

    let stylesheet = theme
        .map(|t| format!(r#"<link rel="stylesheet" href="{}">"#, escape_html(&t.stylesheet)))
        .unwrap_or_default();
    let current_theme = theme.map(|t| t.name.as_str()).unwrap_or_default();
    let theme_options: String = dashboard
        .themes
        .names()
        .map(|name| {
            format!(
                r#"<option value="{0}"{1}>{0}</option>"#,
                escape_html(name),
                if name == current_theme { " selected" } else { "" }
            )
        })
        .collect();

    let alarm_banner = error_banner(alarms.error_flag, alarms.last_error.as_deref());
    let station_banner = error_banner(stations.error_flag, stations.last_error.as_deref());

    let alarm_rows: String = alarms
        .items
        .iter()
        .map(|a| {
            format!(
                r#"<tr>
                    <td>{}</td>
                    <td><strong>{}</strong></td>
                    <td><code>{}</code></td>
                    <td>{}</td>
                    <td>{}</td>
                </tr>"#,
                a.id,
                a.time_label(),
                a.days.summary(),
                if a.enabled { "On" } else { "Off" },
                escape_html(&a.label)
            )
        })
        .collect();

    let station_rows: String = stations
        .items
        .iter()
        .map(|s| {
            format!(
                r#"<tr>
                    <td>{}</td>
                    <td>{}</td>
                    <td>{}</td>
                </tr>"#,
                s.id,
                escape_html(&s.name),
                stream_link(&s.url)
            )
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>LightUpPi Alarms</title>
    {stylesheet}
</head>
<body class="container">
    <h1>LightUpPi Alarms</h1>
    <form method="get" action="/">
        <select name="theme" onchange="this.form.submit()">{theme_options}</select>
    </form>
    <section>
        <h2>Alarms</h2>
        {alarm_banner}
        <table class="table">
            <thead>
                <tr><th>ID</th><th>Time</th><th>Repeat</th><th>Enabled</th><th>Label</th></tr>
            </thead>
            <tbody id="alarm-body">{alarm_rows}</tbody>
        </table>
    </section>
    <section>
        <h2>Stations</h2>
        {station_banner}
        <table class="table">
            <thead>
                <tr><th>ID</th><th>Name</th><th>Stream</th></tr>
            </thead>
            <tbody id="station-body">{station_rows}</tbody>
        </table>
    </section>
</body>
</html>"#,
    );

    Html(html)
}

async fn alarms_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.alarms.snapshot())
}

async fn stations_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.stations.snapshot())
}

/// Run a dispatch on its own task and wait for it.
///
/// A client hanging up drops the handler future; the spawned task still
/// finishes the mutation and the refresh that follows it.
async fn detached<F, T>(dispatch: F) -> Result<T, StatusCode>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(dispatch).await.map_err(|e| {
        tracing::error!("Dashboard dispatch task failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

async fn add_alarm_handler(
    State(dashboard): State<DashboardState>,
    Json(alarm): Json<NewAlarm>,
) -> Result<StatusCode, StatusCode> {
    let dispatcher = dashboard.dispatcher;
    detached(async move { dispatcher.add_alarm(&alarm).await }).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn edit_alarm_handler(
    State(dashboard): State<DashboardState>,
    Path(id): Path<i64>,
    Json(patch): Json<AlarmPatch>,
) -> Result<StatusCode, StatusCode> {
    let dispatcher = dashboard.dispatcher;
    detached(async move { dispatcher.edit_alarm(id, &patch).await }).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_alarm_handler(
    State(dashboard): State<DashboardState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let enabled = dashboard
        .alarms
        .snapshot()
        .items
        .iter()
        .find(|a| a.id == id)
        .map(|a| a.enabled)
        .ok_or(StatusCode::NOT_FOUND)?;

    let dispatcher = dashboard.dispatcher;
    detached(async move { dispatcher.toggle_alarm_enabled(id, enabled).await }).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_alarm_handler(
    State(dashboard): State<DashboardState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let dispatcher = dashboard.dispatcher;
    detached(async move { dispatcher.delete_alarm(id).await }).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Responds with the form as it stands afterwards: emptied when the station was added
async fn add_station_handler(
    State(dashboard): State<DashboardState>,
    Json(form): Json<StationForm>,
) -> Result<Json<StationForm>, StatusCode> {
    let dispatcher = dashboard.dispatcher;
    let form = detached(async move {
        let mut form = form;
        dispatcher.add_station(&mut form).await;
        form
    })
    .await?;
    Ok(Json(form))
}

async fn delete_station_handler(
    State(dashboard): State<DashboardState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let dispatcher = dashboard.dispatcher;
    detached(async move { dispatcher.delete_station(id).await }).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn refresh_handler(
    State(dashboard): State<DashboardState>,
) -> Result<StatusCode, StatusCode> {
    let dispatcher = dashboard.dispatcher;
    detached(async move { dispatcher.refresh_all().await }).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

/// Alert shown above a collection whose last request failed
fn error_banner(error_flag: bool, last_error: Option<&str>) -> String {
    if !error_flag {
        return String::new();
    }
    format!(
        r#"<div class="alert alert-danger">The last request to the LightUpPi server failed: {}</div>"#,
        escape_html(last_error.unwrap_or("unknown error"))
    )
}

/// Stream URL as a link, or as plain text unless it is http(s)
fn stream_link(url: &str) -> String {
    let lower = url.trim_start().to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        format!(r#"<a href="{0}">{0}</a>"#, escape_html(url))
    } else {
        escape_html(url)
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
