/// Mixer API routes
use crate::{error::Result, state::AppState};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct MixerResponse {
    pub volume: Option<u8>,
    pub mute: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMixer {
    pub volume: Option<u8>,
    pub mute: Option<bool>,
}

/// GET /api/mixer - Volume and mute state
pub async fn get_mixer(State(app_state): State<AppState>) -> Result<Json<MixerResponse>> {
    let (volume, mute) = app_state.core.mixer().await?;
    Ok(Json(MixerResponse { volume, mute }))
}

/// PUT /api/mixer - Change volume and/or mute
pub async fn update_mixer(
    State(app_state): State<AppState>,
    Json(update): Json<UpdateMixer>,
) -> Result<Json<MixerResponse>> {
    if let Some(volume) = update.volume {
        if !app_state.core.set_volume(volume).await? {
            tracing::warn!("Mixer refused volume {}", volume);
        }
    }
    if let Some(mute) = update.mute {
        if !app_state.core.set_mute(mute).await? {
            tracing::warn!("Mixer refused mute={}", mute);
        }
    }

    get_mixer(State(app_state)).await
}
