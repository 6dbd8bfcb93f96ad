//! Handlers for `/strains` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/strains` | Every strain, by reference id |
//! | `POST` | `/strains` | Strict create; 409 if the id is taken |
//! | `GET`  | `/strains/id/{id}` | 404 if not found |
//! | `PUT`  | `/strains/id/{id}` | Reconcile; body `id` must be 0 or match |
//! | `GET`  | `/strains/name/{name}` | 404 if not found |
//! | `GET`  | `/strains/race/{race}` | |
//! | `GET`  | `/strains/flavor/{flavor}` | |
//! | `GET`  | `/strains/effect/{effect}` | Optional `?category=positive\|negative\|medical` |
//!
//! Bodies and responses use the wire representation, [`StrainRepr`].

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use strains_core::{
  repr::StrainRepr,
  store::StrainStore,
  strain::{EffectCategory, Strain},
};

use crate::{AppState, error::ApiError};

type ReprList = Json<Vec<StrainRepr>>;

fn project(strains: Vec<Strain>) -> ReprList {
  Json(strains.iter().map(StrainRepr::from).collect())
}

// ─── Writes ───────────────────────────────────────────────────────────────────

/// `POST /strains`
pub async fn create<S: StrainStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<StrainRepr>,
) -> Result<impl IntoResponse, ApiError> {
  let strain = state
    .store
    .create(body, state.create_retries)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(StrainRepr::from(&strain))))
}

/// `PUT /strains/id/{id}`
pub async fn reconcile<S: StrainStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<u64>,
  Json(mut body): Json<StrainRepr>,
) -> Result<Json<StrainRepr>, ApiError> {
  if body.id != 0 && body.id != id {
    return Err(ApiError::BadRequest(format!(
      "body id {} does not match path id {id}",
      body.id
    )));
  }
  body.id = id;

  let strain = state.store.reconcile(body).await.map_err(ApiError::store)?;
  Ok(Json(StrainRepr::from(&strain)))
}

// ─── Single lookups ───────────────────────────────────────────────────────────

/// `GET /strains/id/{id}`
pub async fn by_id<S: StrainStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<u64>,
) -> Result<Json<StrainRepr>, ApiError> {
  let strain = state
    .store
    .by_reference_id(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(StrainRepr::from(&strain)))
}

/// `GET /strains/name/{name}`
pub async fn by_name<S: StrainStore>(
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
) -> Result<Json<StrainRepr>, ApiError> {
  let strain = state.store.by_name(&name).await.map_err(ApiError::store)?;
  Ok(Json(StrainRepr::from(&strain)))
}

// ─── Lists ────────────────────────────────────────────────────────────────────

/// `GET /strains`
pub async fn list<S: StrainStore>(
  State(state): State<AppState<S>>,
) -> Result<ReprList, ApiError> {
  let strains = state.store.list().await.map_err(ApiError::store)?;
  Ok(project(strains))
}

/// `GET /strains/race/{race}`
pub async fn by_race<S: StrainStore>(
  State(state): State<AppState<S>>,
  Path(race): Path<String>,
) -> Result<ReprList, ApiError> {
  let strains = state.store.by_race(&race).await.map_err(ApiError::store)?;
  Ok(project(strains))
}

/// `GET /strains/flavor/{flavor}`
pub async fn by_flavor<S: StrainStore>(
  State(state): State<AppState<S>>,
  Path(flavor): Path<String>,
) -> Result<ReprList, ApiError> {
  let strains = state
    .store
    .by_flavor(&flavor)
    .await
    .map_err(ApiError::store)?;
  Ok(project(strains))
}

#[derive(Debug, Deserialize)]
pub struct EffectParams {
  pub category: Option<String>,
}

/// `GET /strains/effect/{effect}[?category=<category>]`
pub async fn by_effect<S: StrainStore>(
  State(state): State<AppState<S>>,
  Path(effect): Path<String>,
  Query(params): Query<EffectParams>,
) -> Result<ReprList, ApiError> {
  let category = params
    .category
    .as_deref()
    .map(str::parse::<EffectCategory>)
    .transpose()
    .map_err(ApiError::store)?;

  let strains = state
    .store
    .by_effect(&effect, category)
    .await
    .map_err(ApiError::store)?;
  Ok(project(strains))
}
