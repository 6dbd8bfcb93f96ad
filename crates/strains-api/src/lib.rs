//! JSON REST API for the strain catalog.
//!
//! Exposes an axum [`Router`] backed by any [`StrainStore`]. The schema must
//! already be in place before the router serves traffic.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", strains_api::api_router(store.clone(), 3))
//! ```

pub mod error;
pub mod strains;

use std::sync::Arc;

use axum::{Router, routing::get};
use strains_core::store::StrainStore;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Shared state threaded through every handler.
pub struct AppState<S> {
  pub store:          Arc<S>,
  /// Extra attempts allowed for `POST /strains` on transient failure.
  pub create_retries: u32,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), create_retries: self.create_retries }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, create_retries: u32) -> Router<()>
where
  S: StrainStore + 'static,
{
  Router::new()
    .route("/strains", get(strains::list::<S>).post(strains::create::<S>))
    .route(
      "/strains/id/{id}",
      get(strains::by_id::<S>).put(strains::reconcile::<S>),
    )
    .route("/strains/name/{name}", get(strains::by_name::<S>))
    .route("/strains/race/{race}", get(strains::by_race::<S>))
    .route("/strains/flavor/{flavor}", get(strains::by_flavor::<S>))
    .route("/strains/effect/{effect}", get(strains::by_effect::<S>))
    .with_state(AppState { store, create_retries })
    .layer(TraceLayer::new_for_http())
}
