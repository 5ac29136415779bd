use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use hyper::StatusCode;
use serde::Serialize;

use vera::Settings;
use zigate_api::requests::{
    AssociateRequest, DiscoverySelection, ErrorsResponse, InclusionResponse, LearnResponse,
    RefreshSummary, SettingsUpdateRequest, TargetsResponse,
};

use crate::model::discovery::{DiscoveredEquipment, aggregate_selection};
use crate::model::equipment::{Equipment, Mapping};
use crate::model::index::DeviceIndex;
use crate::model::targets;
use crate::routes::{AdminApiError, AdminApiResult};
use crate::server::appstate::AppState;

#[derive(Debug, Serialize)]
struct EquipmentsResponse {
    equipments: Vec<Equipment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DiscoveredResponse {
    discovered_equipments: Vec<DiscoveredEquipment>,
}

#[derive(Debug, Serialize)]
struct DeviceLookupResponse {
    equipment: Equipment,
    mapping: Mapping,
}

async fn get_equipments(State(state): State<AppState>) -> AdminApiResult<Json<EquipmentsResponse>> {
    let snapshot = state.reload().await?;
    Ok(Json(EquipmentsResponse {
        equipments: snapshot.equipments.clone(),
    }))
}

async fn get_discovered(State(state): State<AppState>) -> AdminApiResult<Json<DiscoveredResponse>> {
    let snapshot = state.reload().await?;
    Ok(Json(DiscoveredResponse {
        discovered_equipments: snapshot.discovered.clone(),
    }))
}

/// Reverse lookup: which equipment/mapping does a host device id belong to.
async fn get_device(
    State(state): State<AppState>,
    Path(device_id): Path<u32>,
) -> AdminApiResult<Json<DeviceLookupResponse>> {
    let snapshot = state.snapshot().await;
    let index = DeviceIndex::build(&snapshot.equipments);
    let (equipment, mapping) = index
        .resolve(device_id)
        .ok_or_else(|| AdminApiError(format!("Unknown device {device_id}")))?;

    Ok(Json(DeviceLookupResponse {
        equipment: equipment.clone(),
        mapping: mapping.clone(),
    }))
}

async fn get_association_targets(
    State(state): State<AppState>,
    Path(device_id): Path<u32>,
) -> AdminApiResult<Json<TargetsResponse>> {
    let sdata = state.luup().get_sdata().await?;
    let snapshot = state.snapshot().await;
    let index = DeviceIndex::build(&snapshot.equipments);
    let protocol = index
        .protocol_of(device_id)
        .ok_or_else(|| AdminApiError(format!("Unknown device {device_id}")))?
        .to_string();

    let targets = targets::collect_targets(&sdata, &index, &protocol, device_id);
    Ok(Json(TargetsResponse { targets }))
}

async fn put_device_settings(
    State(state): State<AppState>,
    Path(device_id): Path<u32>,
    Json(request): Json<SettingsUpdateRequest>,
) -> AdminApiResult<Json<Settings>> {
    let mut settings = request.settings;
    // empty-string values must never reach the codec
    settings.retain_persistable();
    state
        .luup()
        .set_device_settings(device_id, &settings)
        .await?;
    Ok(Json(settings))
}

async fn post_associate(
    State(state): State<AppState>,
    Json(request): Json<AssociateRequest>,
) -> AdminApiResult<StatusCode> {
    state
        .luup()
        .associate(
            &request.address,
            request.endpoint.as_deref(),
            &request.feature,
            &request.association,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn post_learn(
    State(state): State<AppState>,
    Json(selection): Json<DiscoverySelection>,
) -> AdminApiResult<Json<LearnResponse>> {
    let snapshot = state.snapshot().await;
    let requests = aggregate_selection(&snapshot.discovered, &selection);
    let requested = requests.len();

    // an empty aggregation is a valid result, not a failure; there is
    // simply nothing to send
    if requests.is_empty() {
        return Ok(Json(LearnResponse {
            requested: 0,
            created: 0,
        }));
    }

    state.luup().create_devices(&requests).await?;
    log::info!("Requested creation of {requested} devices");

    Ok(Json(LearnResponse {
        requested,
        created: requested,
    }))
}

async fn post_refresh(State(state): State<AppState>) -> AdminApiResult<Json<RefreshSummary>> {
    state.luup().refresh().await?;
    let snapshot = state.reload().await?;
    Ok(Json(RefreshSummary {
        equipments: snapshot.equipments.len(),
        discovered: snapshot.discovered.len(),
    }))
}

async fn post_inclusion(State(state): State<AppState>) -> AdminApiResult<Json<InclusionResponse>> {
    state.luup().start_inclusion().await?;
    Ok(Json(InclusionResponse { started: true }))
}

async fn get_errors(State(state): State<AppState>) -> AdminApiResult<Json<ErrorsResponse>> {
    let errors = state.luup().get_errors().await?;
    Ok(Json(ErrorsResponse { errors }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/equipments", get(get_equipments))
        .route("/discovered", get(get_discovered))
        .route("/devices/{device_id}", get(get_device))
        .route(
            "/devices/{device_id}/association-targets",
            get(get_association_targets),
        )
        .route("/devices/{device_id}/settings", put(put_device_settings))
        .route("/associate", post(post_associate))
        .route("/learn", post(post_learn))
        .route("/refresh", post(post_refresh))
        .route("/inclusion", post(post_inclusion))
        .route("/errors", get(get_errors))
}
