use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use crate::authn::factory::AuthnFactory;
use crate::authn::Authenticator;
use crate::authz::hierarchy::StaticHierarchy;
use crate::authz::store::factory::StoreFactory;
use crate::authz::RoleResolver;
use crate::config::GateConfig;
use crate::gate::Gate;

/// Builds a [`Gate`] from a completed [`GateConfig`].
pub struct GateFactory {
    authn: AuthnFactory,
    store: StoreFactory,
}

impl GateFactory {
    pub fn new() -> Self {
        Self {
            authn: AuthnFactory::new(),
            store: StoreFactory::new(),
        }
    }

    pub fn build_gate(&self, cfg: &GateConfig) -> Result<Gate> {
        self.build_gate_with(cfg, vec![])
    }

    /// Like [`GateFactory::build_gate`], with `extra` authenticators tried
    /// after the header one.
    pub fn build_gate_with(
        &self,
        cfg: &GateConfig,
        extra: Vec<Arc<dyn Authenticator>>,
    ) -> Result<Gate> {
        let store = self.store.build_store(&cfg.authz.store).context("build role store")?;
        let hierarchy =
            StaticHierarchy::parse(&cfg.authz.hierarchy).context("parse role hierarchy")?;
        if !hierarchy.is_empty() {
            info!("Loaded {} role hierarchy rules", cfg.authz.hierarchy.len());
        }

        let resolver = RoleResolver::new(store, Arc::new(hierarchy))
            .with_store_timeout(Duration::from_secs(cfg.authz.store_timeout_secs));

        let authenticator = self.authn.build_authenticator(&cfg.authn, extra);
        let gate = Gate::new(authenticator, resolver)
            .with_authn_timeout(Duration::from_secs(cfg.authn.timeout_secs));

        Ok(gate)
    }
}
