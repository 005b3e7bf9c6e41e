//! HTTP middleware
//!
//! Request correlation lives in depot-infra so other services can share it.

pub use depot_infra::{request_id_middleware, RequestId};
