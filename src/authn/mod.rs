mod chain;
mod header;

pub mod config;
pub mod factory;

use actix_web::HttpRequest;
use anyhow::Result;
use async_trait::async_trait;

use crate::principal::Principal;

pub use chain::ChainAuthenticator;
pub use header::HeaderAuthenticator;

/// Trait for request authenticators.
///
/// This is the seam to the authentication provider: the gate never checks
/// credentials itself, it only asks an authenticator for a principal.
#[async_trait(?Send)]
pub trait Authenticator: Send + Sync {
    /// Attempts to authenticate a request.
    ///
    /// # Returns
    ///
    /// * `Ok(AuthnResponse::Ok(principal))` - Authentication successful
    /// * `Ok(AuthnResponse::Continue)` - Authentication declined, no principal
    /// * `Ok(AuthnResponse::Unauthenticated)` - Credentials were rejected
    /// * `Err(_)` - The provider failed; the gate answers 401
    async fn authenticate(&self, req: &HttpRequest) -> Result<AuthnResponse>;
}

/// Response from an authentication attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthnResponse {
    Ok(Principal),
    Continue,
    Unauthenticated,
}
