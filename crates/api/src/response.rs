//! Shared response envelope types for API handlers.
//!
//! The `/api/jobs` resource wraps payloads in a `{ "data": ... }` envelope.
//! The animation endpoints keep their flat legacy bodies.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
