//! Axum router assembly.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use hearth_app::ports::SampleQuery;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<Q>(state: AppState<Q>) -> Router
where
    Q: SampleQuery + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/api/status", get(crate::api::status))
        .route("/api/samples", get(crate::api::samples))
        .route("/api/{group}/state", post(crate::api::set_state))
        .route("/api/bulbs/brightness", post(crate::api::set_brightness))
        .route("/api/timer", post(crate::api::set_timer))
        .route("/api/thresholds", post(crate::api::set_thresholds))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration as StdDuration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use chrono::{Duration, FixedOffset, TimeZone, Utc};
    use tower::ServiceExt;

    use hearth_app::alerting::{AlertingEngine, Thresholds};
    use hearth_app::control_loop::{ControlHandle, ControlLoop, ControlSettings, Engine};
    use hearth_app::ports::{CommandBus, Notifier, SampleSink};
    use hearth_app::registry::DeviceRegistry;
    use hearth_app::scheduler::{GroupSchedule, Location, Scheduler};
    use hearth_domain::device::SetCommand;
    use hearth_domain::error::HearthError;
    use hearth_domain::sample::{Metric, SensorSample};
    use hearth_domain::time::Timestamp;

    struct StubBus;
    struct StubSink;
    struct StubNotifier;
    struct StubQuery;

    impl CommandBus for StubBus {
        async fn publish_set(
            &self,
            _device: &str,
            _command: SetCommand,
        ) -> Result<(), HearthError> {
            Ok(())
        }
    }

    impl SampleSink for StubSink {
        async fn append(&self, _samples: Vec<SensorSample>) -> Result<(), HearthError> {
            Ok(())
        }
        async fn prune_older_than(&self, _cutoff: Timestamp) -> Result<u64, HearthError> {
            Ok(0)
        }
    }

    impl Notifier for StubNotifier {
        async fn send(&self, _subject: &str, _body: &str) -> Result<(), HearthError> {
            Ok(())
        }
    }

    impl hearth_app::ports::SampleQuery for StubQuery {
        async fn recent(&self, limit: u32) -> Result<Vec<SensorSample>, HearthError> {
            let sample = SensorSample {
                device: "basement".to_string(),
                metric: Metric::Temperature,
                value: 18.5,
                timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            };
            Ok(std::iter::repeat_n(sample, limit.min(2) as usize).collect())
        }
    }

    /// A handle whose control loop is not running; commands land in the
    /// channel buffer, which is all these routing tests need.
    fn handle() -> ControlHandle {
        let registry =
            DeviceRegistry::new(&["porch".to_string()], &[], &[], Duration::minutes(2)).unwrap();
        let mut groups = HashMap::new();
        groups.insert(
            hearth_domain::schedule::DeviceGroup::Bulbs,
            GroupSchedule {
                on_mode: "18:00".parse().unwrap(),
                off_mode: "23:00".parse().unwrap(),
                enabled: true,
            },
        );
        let scheduler = Scheduler::new(
            groups,
            Duration::minutes(5),
            Location {
                latitude: 42.33,
                longitude: -83.05,
                utc_offset: FixedOffset::west_opt(5 * 3600).unwrap(),
            },
        );
        let alerts = AlertingEngine::new(Thresholds {
            low_temperature: 10.0,
            high_humidity: 85.0,
            cooldown_secs: 600,
        });
        let settings = ControlSettings {
            tick: StdDuration::from_secs(1),
            retention: Duration::days(365),
            brightness: 254,
        };
        let (_events_tx, events_rx) = hearth_app::control_loop::bus_channel();
        let (control, handle) = ControlLoop::new(
            StubBus,
            StubSink,
            StubNotifier,
            Engine {
                registry,
                scheduler,
                alerts,
            },
            settings,
            events_rx,
        );
        // Dropping the loop would close the command channel and turn every
        // mutation into a 503; keep it alive for the test's lifetime.
        std::mem::forget(control);
        handle
    }

    fn router() -> Router {
        build(AppState::new(handle(), StubQuery))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn should_answer_health_check() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_return_status_snapshot() {
        let response = router()
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json.get("devices").is_some());
        assert!(json.get("bridge_connected").is_some());
    }

    #[tokio::test]
    async fn should_list_recent_samples_with_limit() {
        let response = router()
            .oneshot(
                Request::get("/api/samples?limit=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let samples: Vec<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(samples.len(), 1);
    }

    #[tokio::test]
    async fn should_accept_group_state_change() {
        let response = router()
            .oneshot(post_json("/api/bulbs/state", r#"{"state": "on"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn should_reject_unknown_group() {
        let response = router()
            .oneshot(post_json("/api/fans/state", r#"{"state": "on"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_reject_invalid_power_state() {
        let response = router()
            .oneshot(post_json("/api/bulbs/state", r#"{"state": "dim"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_reject_out_of_range_brightness() {
        let response = router()
            .oneshot(post_json("/api/bulbs/brightness", r#"{"brightness": 300}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_accept_brightness_in_range() {
        let response = router()
            .oneshot(post_json("/api/bulbs/brightness", r#"{"brightness": 200}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn should_accept_timer_update_with_dusk_trigger() {
        let response = router()
            .oneshot(post_json(
                "/api/timer",
                r#"{"group": "bulbs", "on": "dusk", "off": "23:30", "enabled": true}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn should_reject_half_configured_timer_times() {
        let response = router()
            .oneshot(post_json(
                "/api/timer",
                r#"{"group": "bulbs", "on": "dusk"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_accept_threshold_update() {
        let response = router()
            .oneshot(post_json("/api/thresholds", r#"{"low_temperature": 12.5}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
