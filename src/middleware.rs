use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::ErrorInternalServerError;
use actix_web::{Error, HttpMessage, HttpResponse};
use log::error;

use crate::gate::{GateResponse, RoleGuard};
use crate::response::{Response, AUTHN_ERROR, AUTHZ_ERROR, DATABASE_ERROR};

impl<S, B> Transform<S, ServiceRequest> for RoleGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RoleGuardMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RoleGuardMiddleware {
            service: Rc::new(service),
            guard: self.clone(),
        }))
    }
}

/// The service produced by wrapping an app or scope with a [`RoleGuard`].
pub struct RoleGuardMiddleware<S> {
    service: Rc<S>,
    guard: RoleGuard,
}

impl<S, B> Service<ServiceRequest> for RoleGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    #[allow(clippy::type_complexity)]
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let guard = self.guard.clone();

        Box::pin(async move {
            let outcome = match guard.check(req.request()).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        "Role check '{}' for {} {} failed: {e:#}",
                        guard.role(),
                        req.method(),
                        req.path()
                    );
                    return Err(ErrorInternalServerError(DATABASE_ERROR));
                }
            };

            let resp: HttpResponse = match outcome {
                GateResponse::Allow(principal) => {
                    if let Some(principal) = principal {
                        req.extensions_mut().insert(principal);
                    }
                    let resp = service.call(req).await?;
                    return Ok(resp.map_into_left_body());
                }
                GateResponse::Preflight => Response::preflight().into(),
                GateResponse::Unauthenticated => Response::unauthenticated(AUTHN_ERROR).into(),
                GateResponse::Unauthorized => {
                    let message = format!("{AUTHZ_ERROR}, role '{}' is required", guard.role());
                    Response::unauthorized(message).into()
                }
            };

            Ok(req.into_response(resp).map_into_right_body())
        })
    }
}
