use std::sync::Arc;

use actix_web::HttpRequest;
use anyhow::Result;
use async_trait::async_trait;

use super::{Authenticator, AuthnResponse};

/// Chain of authenticators that processes authentication requests sequentially.
///
/// Each authenticator in the chain can:
/// - Pass through (Continue) to the next authenticator
/// - Authenticate the request (Ok), which ends the chain
/// - Reject the request (Unauthenticated), which ends the chain
///
/// If every authenticator passes, the chain itself declines with Continue.
pub struct ChainAuthenticator {
    pub(super) authenticators: Vec<Arc<dyn Authenticator>>,
}

impl ChainAuthenticator {
    pub fn new(authenticators: Vec<Arc<dyn Authenticator>>) -> Self {
        Self { authenticators }
    }

    pub fn len(&self) -> usize {
        self.authenticators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authenticators.is_empty()
    }
}

#[async_trait(?Send)]
impl Authenticator for ChainAuthenticator {
    async fn authenticate(&self, req: &HttpRequest) -> Result<AuthnResponse> {
        for authenticator in self.authenticators.iter() {
            match authenticator.authenticate(req).await? {
                AuthnResponse::Continue => continue,
                resp => return Ok(resp),
            }
        }

        Ok(AuthnResponse::Continue)
    }
}
