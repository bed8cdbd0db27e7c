use std::sync::Arc;

use log::{info, warn};

use super::config::AuthnConfig;
use super::{Authenticator, ChainAuthenticator, HeaderAuthenticator};

/// Factory for building the authenticator of a gate.
pub struct AuthnFactory;

impl AuthnFactory {
    pub fn new() -> Self {
        Self
    }

    /// Builds the authentication chain, or `None` when live authentication
    /// is disabled.
    ///
    /// `extra` authenticators are tried after the trusted-header one, in
    /// order.
    pub fn build_authenticator(
        &self,
        cfg: &AuthnConfig,
        extra: Vec<Arc<dyn Authenticator>>,
    ) -> Option<Arc<dyn Authenticator>> {
        if !cfg.enable {
            info!("Header authentication disabled, only pre-authenticated principals are accepted");
            return None;
        }

        let mut authenticators: Vec<Arc<dyn Authenticator>> = Vec::with_capacity(extra.len() + 1);

        warn!(
            "Trusting identity headers '{}' and '{}', make sure they are set by your proxy only",
            cfg.user_header, cfg.authorities_header
        );
        let header = HeaderAuthenticator::new(&cfg.user_header, &cfg.authorities_header);
        authenticators.push(Arc::new(header));
        authenticators.extend(extra);

        Some(Arc::new(ChainAuthenticator::new(authenticators)))
    }
}
