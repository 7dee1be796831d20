//! Leads wizard endpoints
//!
//! Step saves are best-effort autosaves: a storage hiccup reports
//! `success: false` in the body rather than an error status, so the client
//! keeps moving through the form. Submission is the strict path with full
//! re-validation.

use axum::extract::{Path, State};
use axum::Json;
use feria_common::{Error, FlowType};
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::wizard::{AnswerMap, WizardEngine};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct InitLeadRequest {
    pub flow_type: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "web".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SaveStepRequest {
    pub step_key: String,
    #[serde(default)]
    pub value: String,
}

/// POST /leads/init
///
/// Create a draft lead shell for the given flow and return its id.
pub async fn init_lead(
    State(state): State<AppState>,
    Json(req): Json<InitLeadRequest>,
) -> ApiResult<Json<Value>> {
    let flow = FlowType::from_str(&req.flow_type)
        .map_err(|_| ApiError::BadRequest(format!("Unknown flow type '{}'", req.flow_type)))?;

    let engine = WizardEngine::new(state.db.clone());
    let lead = engine
        .init_session(
            flow,
            req.tenant_id.as_deref(),
            req.property_id.as_deref(),
            &req.source,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "lead": {
            "id": lead.id,
            "flow_type": lead.flow_type,
            "status": lead.status,
        }
    })))
}

/// GET /leads/:id/resume
///
/// Rebuild session state for a returning client: the lead, the merged
/// answer map, and the step index to land on.
pub async fn resume_lead(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let engine = WizardEngine::new(state.db.clone());
    let resumed = engine.resume(&lead_id).await?;

    Ok(Json(json!({
        "success": true,
        "lead": resumed.lead,
        "steps": resumed.answers,
        "resume_index": resumed.resume_index,
    })))
}

/// PATCH /leads/:id/step
///
/// Autosave one step value. Unknown leads and already-submitted leads are
/// real errors; anything else (a transient storage failure) degrades to
/// `success: false` so the client is never blocked mid-form.
pub async fn save_step(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
    Json(req): Json<SaveStepRequest>,
) -> ApiResult<Json<Value>> {
    if req.step_key.trim().is_empty() {
        return Err(ApiError::BadRequest("step_key must not be empty".to_string()));
    }

    let engine = WizardEngine::new(state.db.clone());
    match engine.save_step(&lead_id, &req.step_key, &req.value).await {
        Ok(()) => Ok(Json(json!({ "success": true }))),
        Err(Error::NotFound(msg)) => Err(ApiError::NotFound(msg)),
        Err(Error::AlreadySubmitted(msg)) => Err(ApiError::AlreadySubmitted(msg)),
        Err(e) => {
            warn!(lead_id = %lead_id, step = %req.step_key, "Step autosave failed: {}", e);
            Ok(Json(json!({ "success": false })))
        }
    }
}

/// POST /leads/:id/submit
///
/// Finalize the wizard with the client's full answer map. Validation
/// failures come back as 422 with the offending step named; a repeat
/// submit is 409.
pub async fn submit_lead(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
    Json(body): Json<serde_json::Map<String, Value>>,
) -> ApiResult<Json<Value>> {
    let mut answers = AnswerMap::new();
    for (key, value) in body {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => continue,
            other => other.to_string(),
        };
        answers.insert(key, text);
    }

    let engine = WizardEngine::new(state.db.clone());
    let lead = engine.submit(&lead_id, &answers).await.map_err(|e| match e {
        Error::InvalidInput(msg) => ApiError::Validation(msg),
        other => ApiError::from(other),
    })?;

    Ok(Json(json!({
        "success": true,
        "lead": lead,
    })))
}
