//! Admin HTTP surface.

mod admin;
mod middleware;

pub use admin::{AdminState, DatabaseHealth, build_admin_router};
pub use middleware::{REQUEST_ID_HEADER, RequestContext};
