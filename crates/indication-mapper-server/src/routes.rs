//! HTTP routes.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use indication_mapper_core::{IndicationLookup, LabelData, MapperCore, MappingRecord};
use indication_mapper_llm::{generate_with_pull, ProgramInference, ProgramOutput, TextGenerator};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::error::ApiError;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub core: Arc<MapperCore>,
    pub programs: Arc<ProgramInference>,
    pub generator: Arc<dyn TextGenerator>,
}

#[derive(Debug, Serialize)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SetIdQuery {
    pub setid: Option<String>,
    #[serde(rename = "drugName")]
    pub drug_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DrugNameQuery {
    #[serde(rename = "drugName")]
    pub drug_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IndicationQuery {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LabelRes {
    pub data: LabelData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetIdRes {
    pub set_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateReq {
    pub model: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateRes {
    pub response: String,
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/mapping", get(map_label))
        .route("/mapping/stored", get(stored_mapping))
        .route("/mapping/indication", get(lookup_indication))
        .route("/structured-product-labeling", get(label_by_set_id))
        .route("/structured-product-labeling/setid", get(set_id_by_drug_name))
        .route("/structured-product-labeling/generate", post(generate))
        .route("/drug-indications", get(drug_indications))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run blocking work (SQLite, blocking HTTP) off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// Trimmed non-empty parameter, or a 400 naming it.
fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", name)))
}

#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: format!(
            "Indication mapper is alive (policy: {})",
            state.core.policy_name()
        ),
    })
}

/// Fetch, map and persist a label.
#[axum::debug_handler]
async fn map_label(
    State(state): State<AppState>,
    Query(query): Query<SetIdQuery>,
) -> Result<Json<MappingRecord>, ApiError> {
    let set_id = required(query.setid, "setid")?;
    let drug_name = query.drug_name;

    let record = blocking(move || Ok(state.core.map_label(&set_id, drug_name.as_deref())?)).await?;
    Ok(Json(record))
}

#[axum::debug_handler]
async fn stored_mapping(
    State(state): State<AppState>,
    Query(query): Query<SetIdQuery>,
) -> Result<Json<MappingRecord>, ApiError> {
    let set_id = required(query.setid, "setid")?;
    let record = blocking(move || Ok(state.core.stored_mapping(&set_id)?)).await?;
    Ok(Json(record))
}

#[axum::debug_handler]
async fn lookup_indication(
    State(state): State<AppState>,
    Query(query): Query<IndicationQuery>,
) -> Result<Json<IndicationLookup>, ApiError> {
    let text = required(query.text, "text")?;
    Ok(Json(state.core.lookup_indication(&text)?))
}

#[axum::debug_handler]
async fn label_by_set_id(
    State(state): State<AppState>,
    Query(query): Query<SetIdQuery>,
) -> Result<Json<LabelRes>, ApiError> {
    let set_id = required(query.setid, "setid")?;
    let data = blocking(move || Ok(state.core.fetch_label(&set_id)?)).await?;
    Ok(Json(LabelRes { data }))
}

#[axum::debug_handler]
async fn set_id_by_drug_name(
    State(state): State<AppState>,
    Query(query): Query<DrugNameQuery>,
) -> Result<Json<SetIdRes>, ApiError> {
    let drug_name = required(query.drug_name, "drugName")?;
    let set_id = blocking(move || Ok(state.core.resolve_set_id(&drug_name)?)).await?;
    Ok(Json(SetIdRes { set_id }))
}

/// Pull the model when missing, then generate.
#[axum::debug_handler]
async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateReq>,
) -> Result<Json<GenerateRes>, ApiError> {
    let (Some(model), Some(prompt)) = (
        req.model.filter(|m| !m.trim().is_empty()),
        req.prompt.filter(|p| !p.trim().is_empty()),
    ) else {
        return Err(ApiError::BadRequest("Model and prompt are required".into()));
    };

    let generated = blocking(move || {
        Ok(generate_with_pull(state.generator.as_ref(), &model, &prompt)?)
    })
    .await?;
    Ok(Json(GenerateRes {
        response: generated.response,
    }))
}

#[axum::debug_handler]
async fn drug_indications(
    State(state): State<AppState>,
    Query(query): Query<DrugNameQuery>,
) -> Result<Json<ProgramOutput>, ApiError> {
    let drug_name = required(query.drug_name, "drugName")?;
    let program = blocking(move || Ok(state.programs.infer_program(&drug_name)?)).await?;
    Ok(Json(program))
}
