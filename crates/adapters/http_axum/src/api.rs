//! JSON REST handlers.
//!
//! Handlers only enqueue commands on the control loop and read snapshots or
//! stored samples; no engine state lives here. Mutations return
//! `202 Accepted` because the loop applies them asynchronously.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use hearth_app::control_loop::{Command, StatusSnapshot};
use hearth_app::ports::SampleQuery;
use hearth_domain::device::PowerState;
use hearth_domain::error::{NotFoundError, ValidationError};
use hearth_domain::sample::SensorSample;
use hearth_domain::schedule::{DeviceGroup, TriggerMode};

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_SAMPLE_LIMIT: u32 = 100;
const MAX_SAMPLE_LIMIT: u32 = 1000;

/// Request body for switching a device group.
#[derive(Deserialize)]
pub struct SetStateRequest {
    pub state: String,
}

/// Request body for setting bulb brightness.
#[derive(Deserialize)]
pub struct SetBrightnessRequest {
    pub brightness: u16,
}

/// Request body for timer updates. `on` and `off` must come together.
#[derive(Deserialize)]
pub struct TimerRequest {
    pub group: DeviceGroup,
    pub enabled: Option<bool>,
    pub on: Option<String>,
    pub off: Option<String>,
}

/// Request body for alert threshold updates.
#[derive(Deserialize)]
pub struct ThresholdsRequest {
    pub low_temperature: Option<f64>,
    pub high_humidity: Option<f64>,
}

/// Query parameters for the sample listing.
#[derive(Deserialize)]
pub struct SamplesQuery {
    pub limit: Option<u32>,
}

/// Response for accepted mutations.
pub enum AcceptedResponse {
    Accepted,
}

impl IntoResponse for AcceptedResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted => StatusCode::ACCEPTED.into_response(),
        }
    }
}

/// `GET /api/status`
pub async fn status<Q>(State(state): State<AppState<Q>>) -> Json<StatusSnapshot>
where
    Q: SampleQuery + 'static,
{
    Json(state.handle.status())
}

/// `GET /api/samples?limit=N`
pub async fn samples<Q>(
    State(state): State<AppState<Q>>,
    Query(query): Query<SamplesQuery>,
) -> Result<Json<Vec<SensorSample>>, ApiError>
where
    Q: SampleQuery + 'static,
{
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SAMPLE_LIMIT)
        .min(MAX_SAMPLE_LIMIT);
    let samples = state.samples.recent(limit).await?;
    Ok(Json(samples))
}

/// `POST /api/{group}/state`
pub async fn set_state<Q>(
    State(state): State<AppState<Q>>,
    Path(group): Path<String>,
    Json(req): Json<SetStateRequest>,
) -> Result<AcceptedResponse, ApiError>
where
    Q: SampleQuery + 'static,
{
    let group = parse_group(&group)?;
    let power: PowerState = req
        .state
        .parse()
        .map_err(|()| ValidationError::InvalidPowerState(req.state.clone()))?;
    state
        .handle
        .send(Command::SetGroupPower {
            group,
            state: power,
        })
        .await?;
    Ok(AcceptedResponse::Accepted)
}

/// `POST /api/bulbs/brightness`
pub async fn set_brightness<Q>(
    State(state): State<AppState<Q>>,
    Json(req): Json<SetBrightnessRequest>,
) -> Result<AcceptedResponse, ApiError>
where
    Q: SampleQuery + 'static,
{
    let value = u8::try_from(req.brightness)
        .ok()
        .filter(|value| *value <= 254)
        .ok_or(ValidationError::BrightnessOutOfRange(req.brightness))?;
    state.handle.send(Command::SetBrightness(value)).await?;
    Ok(AcceptedResponse::Accepted)
}

/// `POST /api/timer`
pub async fn set_timer<Q>(
    State(state): State<AppState<Q>>,
    Json(req): Json<TimerRequest>,
) -> Result<AcceptedResponse, ApiError>
where
    Q: SampleQuery + 'static,
{
    match (&req.on, &req.off) {
        (Some(on), Some(off)) => {
            let on_mode: TriggerMode = on.parse::<TriggerMode>().map_err(ApiError::from)?;
            let off_mode: TriggerMode = off.parse::<TriggerMode>().map_err(ApiError::from)?;
            state
                .handle
                .send(Command::SetTimerMode {
                    group: req.group,
                    on_mode,
                    off_mode,
                })
                .await?;
        }
        (None, None) => {}
        _ => {
            return Err(ValidationError::InvalidTriggerMode(
                "on and off times must be set together".to_string(),
            )
            .into());
        }
    }
    if let Some(enabled) = req.enabled {
        state
            .handle
            .send(Command::SetTimerEnabled {
                group: req.group,
                enabled,
            })
            .await?;
    }
    Ok(AcceptedResponse::Accepted)
}

/// `POST /api/thresholds`
pub async fn set_thresholds<Q>(
    State(state): State<AppState<Q>>,
    Json(req): Json<ThresholdsRequest>,
) -> Result<AcceptedResponse, ApiError>
where
    Q: SampleQuery + 'static,
{
    state
        .handle
        .send(Command::SetAlertThresholds {
            low_temperature: req.low_temperature,
            high_humidity: req.high_humidity,
        })
        .await?;
    Ok(AcceptedResponse::Accepted)
}

fn parse_group(segment: &str) -> Result<DeviceGroup, ApiError> {
    match segment {
        "bulbs" => Ok(DeviceGroup::Bulbs),
        "outlets" => Ok(DeviceGroup::Outlets),
        other => Err(NotFoundError {
            entity: "device group",
            name: other.to_string(),
        }
        .into()),
    }
}
