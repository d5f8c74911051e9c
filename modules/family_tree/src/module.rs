use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use runtime::AppConfig;
use tracing::{debug, info};

use crate::config::FamilyTreeConfig;
use crate::contract::client::FamilyTreeApi;
use crate::domain::service::{Service, ServiceConfig};
use crate::domain::store::DocumentStore;
use crate::gateways::{FamilyTreeCompatClient, FamilyTreeLocalClient};
use crate::infra::storage::build_store;

pub const MODULE_NAME: &str = "family_tree";

/// Wired module: store → domain service → clients.
#[derive(Clone)]
pub struct FamilyTreeModule {
    service: Arc<Service>,
    api: Arc<dyn FamilyTreeApi>,
}

impl FamilyTreeModule {
    /// Load configuration, initialize logging, and wire the module.
    pub fn bootstrap(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let app = AppConfig::load_or_default(config_path)?;
        let logging = app.logging.clone().unwrap_or_default();
        runtime::init_logging_from_config(&logging, &app.home_dir_path());
        Self::from_app_config(&app)
    }

    /// Read `modules.family_tree` (defaults when absent) and wire the module.
    pub fn from_app_config(app: &AppConfig) -> anyhow::Result<Self> {
        let cfg: FamilyTreeConfig = if app.modules.contains_key(MODULE_NAME) {
            app.module_config_required(MODULE_NAME)?
        } else {
            FamilyTreeConfig::default()
        };
        Self::from_config(&cfg)
    }

    pub fn from_config(cfg: &FamilyTreeConfig) -> anyhow::Result<Self> {
        info!("Initializing family_tree module");
        debug!(
            "Loaded family_tree config: store={:?}, max_fields_per_document={}, verify_tree_exists={}",
            cfg.store, cfg.max_fields_per_document, cfg.verify_tree_exists
        );

        let store = build_store(&cfg.store).context("failed to build document store")?;
        Ok(Self::with_store(store, cfg))
    }

    /// Wire the module over an already-built store.
    pub fn with_store(store: Arc<dyn DocumentStore>, cfg: &FamilyTreeConfig) -> Self {
        let service_config = ServiceConfig {
            max_fields_per_document: cfg.max_fields_per_document,
            verify_tree_exists: cfg.verify_tree_exists,
        };
        let service = Arc::new(Service::new(store, service_config));
        let api: Arc<dyn FamilyTreeApi> = Arc::new(FamilyTreeLocalClient::new(service.clone()));
        Self { service, api }
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn client(&self) -> Arc<dyn FamilyTreeApi> {
        self.api.clone()
    }

    pub fn compat_client(&self) -> FamilyTreeCompatClient {
        FamilyTreeCompatClient::new(self.api.clone())
    }
}
