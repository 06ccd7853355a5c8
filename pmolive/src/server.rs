//! Serveur HTTP de la grille (`pmolive serve`)
//!
//! - `GET /schedule` : grille du jour fusionnée avec celle du lendemain,
//!   restreinte à la fenêtre `[maintenant, maintenant + window_hours]`.
//! - `POST /_task/export` : tâche d'export journalière (génère aujourd'hui
//!   si besoin, puis demain).

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pmoschedule::{
    export, Error as ScheduleError, ExportOutcome, ScheduleGenerator, ScheduleStore, Seconds,
    WallClock, WireSchedule,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

// ============ Gestion des erreurs ============

struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.1 }));
        (self.0, body).into_response()
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

/// État partagé des handlers
#[derive(Clone)]
pub struct ServerState {
    store: Arc<ScheduleStore>,
    generator: Arc<Mutex<ScheduleGenerator>>,
    clock: Arc<dyn WallClock>,
    window_secs: Seconds,
}

impl ServerState {
    pub fn new(
        store: ScheduleStore,
        generator: ScheduleGenerator,
        clock: Arc<dyn WallClock>,
        window_secs: Seconds,
    ) -> Self {
        Self {
            store: Arc::new(store),
            generator: Arc::new(Mutex::new(generator)),
            clock,
            window_secs,
        }
    }
}

/// Crée le router du serveur de grille
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/schedule", get(get_schedule))
        .route("/_task/export", post(run_export))
        .with_state(state)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /schedule
async fn get_schedule(State(state): State<ServerState>) -> Result<Json<WireSchedule>, AppError> {
    let now = state.clock.now();

    let today = state.store.load(now).await?;
    let merged = match state.store.load(now.next_day()).await {
        Ok(tomorrow) => today.merge(&tomorrow),
        Err(ScheduleError::ScheduleNotFound(day)) => {
            debug!(%day, "Tomorrow not exported yet");
            today
        }
        Err(e) => {
            warn!("Failed to read tomorrow's schedule: {}", e);
            today
        }
    };

    let window = merged.window(now, state.window_secs);
    debug!(channels = window.channel_count(), at = %now, "Schedule served");
    Ok(Json(WireSchedule::from_schedule(&window, state.store.zone())))
}

/// POST /_task/export
async fn run_export(State(state): State<ServerState>) -> Result<Json<serde_json::Value>, AppError> {
    let now = state.clock.now();
    info!(day = %now.date_key(), "📦 Export task started");

    let mut generator = state.generator.lock().await;
    let outcome = export(&state.store, &mut *generator, now).await?;

    let body = match outcome {
        ExportOutcome::AlreadyExported => json!({ "status": "already_exported" }),
        ExportOutcome::Exported {
            created_today,
            tomorrow,
        } => {
            info!(%tomorrow, created_today, "✅ Export task finished");
            json!({
                "status": "exported",
                "created_today": created_today,
                "tomorrow": tomorrow,
            })
        }
    };

    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use pmoschedule::{
        zone_from_offset_minutes, Catalog, CatalogVideo, Instant, Item, ManualClock, Schedule,
        Timetable,
    };
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn at(d: u32, h: u32, m: u32) -> Instant {
        Instant::new(2024, 5, d, h, m, 0).unwrap()
    }

    fn state(dir: &TempDir, now: Instant) -> ServerState {
        let zone = zone_from_offset_minutes(540).unwrap();
        let catalog = Catalog::from_videos(
            (0..60)
                .map(|i| CatalogVideo {
                    id: format!("v{i}"),
                    title: String::new(),
                    duration_secs: 1750.0,
                })
                .collect(),
        );
        let generator = ScheduleGenerator::with_rng(catalog, 2, 1800.0, StdRng::seed_from_u64(1));
        ServerState::new(
            ScheduleStore::new(dir.path(), zone),
            generator,
            Arc::new(ManualClock::new(now)),
            3.0 * 3600.0,
        )
    }

    async fn call(router: Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_today_is_500() {
        let dir = TempDir::new().unwrap();
        let (status, body) = call(create_router(state(&dir, at(1, 12, 0))), "GET", "/schedule").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("2024-05-01"));
    }

    #[tokio::test]
    async fn test_schedule_is_windowed_across_midnight() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, at(1, 22, 30));

        let today = Schedule::new(vec![Timetable::new(vec![
            Item::new("early", at(1, 0, 0), 3600.0),
            Item::new("late", at(1, 22, 0), 7200.0),
        ])]);
        let tomorrow = Schedule::new(vec![Timetable::new(vec![
            Item::new("night", at(2, 0, 0), 3600.0),
            Item::new("dawn", at(2, 1, 0), 3600.0),
            Item::new("morning", at(2, 6, 0), 3600.0),
        ])]);
        state.store.save(&today).await.unwrap();
        state.store.save(&tomorrow).await.unwrap();

        let (status, body) = call(create_router(state), "GET", "/schedule").await;
        assert_eq!(status, StatusCode::OK);

        let ids: Vec<&str> = body["Channels"][0]["Items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["VideoID"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["late", "night", "dawn"]);
    }

    #[tokio::test]
    async fn test_export_then_already_exported() {
        let dir = TempDir::new().unwrap();
        let router = create_router(state(&dir, at(1, 12, 0)));

        let (status, body) = call(router.clone(), "POST", "/_task/export").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "exported");
        assert_eq!(body["created_today"], true);
        assert_eq!(body["tomorrow"], "2024-05-02");

        let (_, body) = call(router.clone(), "POST", "/_task/export").await;
        assert_eq!(body["status"], "already_exported");

        let (status, body) = call(router, "GET", "/schedule").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Channels"].as_array().unwrap().len(), 2);
    }
}
