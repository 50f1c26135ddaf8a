//! Ingress-agnostic request intake (§4.F): validates inbound jobs and
//! dispatches each to a handler on its own task.

mod dispatch;
mod error;
mod ingress;
mod request;

pub use dispatch::{start, RequestHandler, Stopper};
pub use error::{IngressError, RequestError};
pub use ingress::Ingress;
pub use request::Request;
