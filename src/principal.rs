use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use serde::{Deserialize, Serialize};

use crate::response::{Response, AUTHN_ERROR};

/// The identity attached to a request once it is authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,

    #[serde(default)]
    pub authorities: Vec<Authority>,
}

/// An authority held by a principal.
///
/// A plain string is used as a role name directly, a reference carries the
/// id of a role document that has to be resolved through the role store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Authority {
    Name(String),
    Reference { id: String },
}

impl Principal {
    pub fn new(name: impl Into<String>, authorities: Vec<Authority>) -> Self {
        Self {
            name: name.into(),
            authorities,
        }
    }

    /// Builds a principal holding plain role names.
    pub fn with_roles<I, S>(name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let authorities = roles.into_iter().map(Authority::name).collect();
        Self::new(name, authorities)
    }

    /// Returns the principal previously stored in the request extensions,
    /// either by an upstream middleware or by a role guard.
    pub fn from_extensions(req: &HttpRequest) -> Option<Principal> {
        req.extensions().get::<Principal>().cloned()
    }
}

impl Authority {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn reference(id: impl Into<String>) -> Self {
        Self::Reference { id: id.into() }
    }
}

impl FromRequest for Principal {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match Self::from_extensions(req) {
            Some(principal) => Ok(principal),
            None => {
                let resp = Response::unauthenticated("no principal on request");
                Err(actix_web::error::InternalError::from_response(AUTHN_ERROR, resp.into()).into())
            }
        };
        ready(result)
    }
}
