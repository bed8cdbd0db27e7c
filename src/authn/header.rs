use actix_web::HttpRequest;
use anyhow::Result;
use async_trait::async_trait;

use crate::principal::{Authority, Principal};

use super::{Authenticator, AuthnResponse};

/// Authenticator that trusts identity headers set by an upstream proxy.
///
/// The proxy is expected to have verified the credentials already; this
/// authenticator only turns its headers into a principal. Authorities are a
/// comma-separated list, entries written as `id:<id>` are references to role
/// documents.
pub struct HeaderAuthenticator {
    user_header: String,
    authorities_header: String,
}

impl HeaderAuthenticator {
    const REFERENCE_PREFIX: &'static str = "id:";

    pub fn new(user_header: impl Into<String>, authorities_header: impl Into<String>) -> Self {
        Self {
            user_header: user_header.into(),
            authorities_header: authorities_header.into(),
        }
    }

    fn parse_authorities(value: &str) -> Vec<Authority> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(Self::REFERENCE_PREFIX) {
                Some(id) => Authority::reference(id.trim()),
                None => Authority::name(s),
            })
            .collect()
    }
}

#[async_trait(?Send)]
impl Authenticator for HeaderAuthenticator {
    async fn authenticate(&self, req: &HttpRequest) -> Result<AuthnResponse> {
        let name = match req.headers().get(self.user_header.as_str()) {
            Some(name) => match name.to_str() {
                Ok(name) => name.trim().to_string(),
                Err(_) => return Ok(AuthnResponse::Unauthenticated),
            },
            None => return Ok(AuthnResponse::Continue),
        };
        if name.is_empty() {
            return Ok(AuthnResponse::Unauthenticated);
        }

        let authorities = match req.headers().get(self.authorities_header.as_str()) {
            Some(value) => match value.to_str() {
                Ok(value) => Self::parse_authorities(value),
                Err(_) => return Ok(AuthnResponse::Unauthenticated),
            },
            None => vec![],
        };

        Ok(AuthnResponse::Ok(Principal::new(name, authorities)))
    }
}
