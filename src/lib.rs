pub mod authn;
pub mod authz;
pub mod config;
pub mod error;
pub mod factory;
pub mod gate;
pub mod logs;
pub mod middleware;
pub mod principal;
pub mod response;

pub use authz::{IS_AUTHENTICATED_ANONYMOUSLY, PERMIT_ALL};
pub use error::Error;
pub use factory::GateFactory;
pub use gate::{Gate, GateResponse, RoleGuard};
pub use principal::{Authority, Principal};
