//! Voice capability endpoint

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;
use crate::assistant::Classifier;

/// Build voice router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/capabilities", get(capabilities))
        .with_state(state)
}

/// What a front end needs to drive a voice session against this server
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceCapabilities {
    pub wake_word: String,
    pub locale: String,
    pub stt_available: bool,
    pub tts_available: bool,
    /// Classifier rules in precedence order
    pub rules: Vec<&'static str>,
}

/// Get voice capabilities
async fn capabilities(State(state): State<Arc<ApiState>>) -> Json<VoiceCapabilities> {
    Json(VoiceCapabilities {
        wake_word: state.wake_word.clone(),
        locale: state.locale.clone(),
        stt_available: state.cloud_speech,
        tts_available: state.cloud_speech,
        rules: Classifier::rule_names().collect(),
    })
}
