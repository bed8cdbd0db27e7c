use std::sync::Arc;
use std::time::Duration;

use actix_web::http::Method;
use actix_web::HttpRequest;
use anyhow::Result;
use log::{debug, warn};

use crate::authn::{Authenticator, AuthnResponse};
use crate::authz::{is_sentinel, AuthzResponse, RoleResolver};
use crate::error::Error;
use crate::principal::Principal;

/// Outcome of passing a request through a [`RoleGuard`].
#[derive(Debug, Clone, PartialEq)]
pub enum GateResponse {
    /// CORS preflight, answered with 200 without calling the next handler.
    Preflight,
    /// Access is granted, the next handler runs. The principal is absent
    /// when an unrestricted route is accessed anonymously.
    Allow(Option<Principal>),
    /// No usable principal, answered with 401.
    Unauthenticated,
    /// The principal lacks the required role, answered with 403.
    Unauthorized,
}

impl GateResponse {
    /// Status code written when the request is short-circuited.
    pub fn status(&self) -> Option<u16> {
        match self {
            GateResponse::Preflight => Some(200),
            GateResponse::Allow(_) => None,
            GateResponse::Unauthenticated => Some(401),
            GateResponse::Unauthorized => Some(403),
        }
    }
}

/// Builds role guards that share one authenticator and one resolver.
#[derive(Clone)]
pub struct Gate {
    authenticator: Option<Arc<dyn Authenticator>>,
    resolver: RoleResolver,
    authn_timeout: Option<Duration>,
}

impl Gate {
    /// Creates a gate. Without an authenticator, requests are only checked
    /// against principals that are already attached to them.
    pub fn new(authenticator: Option<Arc<dyn Authenticator>>, resolver: RoleResolver) -> Self {
        Self {
            authenticator,
            resolver,
            authn_timeout: None,
        }
    }

    pub fn with_authn_timeout(mut self, timeout: Duration) -> Self {
        self.authn_timeout = Some(timeout);
        self
    }

    /// Creates a guard requiring `role`. An empty role is a configuration
    /// error and is reported immediately.
    pub fn require(&self, role: impl Into<String>) -> Result<RoleGuard> {
        let role = role.into();
        if role.trim().is_empty() {
            return Err(Error::MissingRole.into());
        }

        Ok(RoleGuard {
            inner: Arc::new(GuardInner {
                role,
                gate: self.clone(),
            }),
        })
    }
}

/// Checks requests against one required role. Cheap to clone, and usable as
/// actix-web middleware through `App::wrap`.
#[derive(Clone)]
pub struct RoleGuard {
    pub(crate) inner: Arc<GuardInner>,
}

pub(crate) struct GuardInner {
    role: String,
    gate: Gate,
}

impl RoleGuard {
    pub fn role(&self) -> &str {
        &self.inner.role
    }

    /// Runs authentication (when needed) and role resolution for `req`.
    ///
    /// Authentication failures and denials are answered through the
    /// returned [`GateResponse`]; role store failures are returned as
    /// errors.
    pub async fn check(&self, req: &HttpRequest) -> Result<GateResponse> {
        let role = self.inner.role.as_str();
        let gate = &self.inner.gate;

        if *req.method() == Method::OPTIONS {
            debug!("Preflight {} passes without authentication", req.path());
            return Ok(GateResponse::Preflight);
        }

        let principal = match Principal::from_extensions(req) {
            Some(principal) => Some(principal),
            None => match gate.authenticator.as_ref() {
                Some(authenticator) => {
                    match self.authenticate(authenticator.as_ref(), req).await {
                        AuthnResponse::Ok(principal) => Some(principal),
                        AuthnResponse::Continue => None,
                        AuthnResponse::Unauthenticated => {
                            return Ok(GateResponse::Unauthenticated)
                        }
                    }
                }
                None => None,
            },
        };

        let principal = match principal {
            Some(principal) => principal,
            None if is_sentinel(role) => {
                debug!("Anonymous {} {} allowed by '{role}'", req.method(), req.path());
                return Ok(GateResponse::Allow(None));
            }
            None => {
                debug!("Anonymous {} {} requires '{role}'", req.method(), req.path());
                return Ok(GateResponse::Unauthenticated);
            }
        };

        match gate.resolver.resolve(&principal, role).await? {
            AuthzResponse::Ok => Ok(GateResponse::Allow(Some(principal))),
            AuthzResponse::Unauthorized => {
                warn!(
                    "Principal '{}' denied {} {}, requires '{role}'",
                    principal.name,
                    req.method(),
                    req.path()
                );
                Ok(GateResponse::Unauthorized)
            }
        }
    }

    /// Calls the authenticator, folding provider errors and timeouts into
    /// a rejection.
    async fn authenticate(
        &self,
        authenticator: &dyn Authenticator,
        req: &HttpRequest,
    ) -> AuthnResponse {
        let result = match self.inner.gate.authn_timeout {
            Some(timeout) => {
                match tokio::time::timeout(timeout, authenticator.authenticate(req)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            "Authentication for {} {} timed out after {timeout:?}",
                            req.method(),
                            req.path()
                        );
                        return AuthnResponse::Unauthenticated;
                    }
                }
            }
            None => authenticator.authenticate(req).await,
        };

        match result {
            Ok(resp) => resp,
            Err(e) => {
                warn!(
                    "Authentication for {} {} failed: {e:#}",
                    req.method(),
                    req.path()
                );
                AuthnResponse::Unauthenticated
            }
        }
    }
}
