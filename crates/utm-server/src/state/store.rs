//! Application state shared by every request handler.

use std::sync::Arc;

use anyhow::Result;
use utm_core::{AirspaceEvaluator, ZoneStore};

use crate::api::auth::{IdentityProvider, JwtIdentityProvider};
use crate::config::Config;
use crate::persistence::{self, SqliteZoneStore};

/// Handles to the zone store, the evaluator over it, and the identity
/// provider. Holds no mutable zone data of its own.
pub struct AppState {
    zones: Arc<dyn ZoneStore>,
    evaluator: AirspaceEvaluator<dyn ZoneStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(zones: Arc<dyn ZoneStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            evaluator: AirspaceEvaluator::new(zones.clone()),
            zones,
            identity,
        }
    }

    /// Open the database named by `config` and wire the JWT identity provider.
    pub async fn from_config(config: Config) -> Result<Self> {
        let db = persistence::init_database(&config.database_path, config.database_max_connections)
            .await?;
        if db.has_spatial_index() {
            tracing::info!("Zone lookups use the zone_rtree spatial index");
        }
        let zones: Arc<dyn ZoneStore> = Arc::new(SqliteZoneStore::new(&db));
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(JwtIdentityProvider::new(&config.jwt_secret));
        Ok(Self::new(zones, identity))
    }

    pub fn zones(&self) -> &dyn ZoneStore {
        self.zones.as_ref()
    }

    pub fn evaluator(&self) -> &AirspaceEvaluator<dyn ZoneStore> {
        &self.evaluator
    }

    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        self.identity.clone()
    }
}
