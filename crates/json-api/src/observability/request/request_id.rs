//! Request correlation ids.

use std::fmt;

use salvo::{http::header::HeaderValue, prelude::Response};
use uuid::Uuid;

pub(super) const HEADER: &str = "x-request-id";

/// Longest client-supplied id that is echoed back unchanged.
const MAX_LEN: usize = 128;

/// Correlation id for one request, stored in the depot and echoed in the
/// response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RequestId(String);

impl RequestId {
    /// Reuse the caller's id when it is short printable ASCII, otherwise
    /// mint a fresh v7 uuid.
    pub(super) fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(id) if Self::acceptable(id) => Self(id.to_owned()),
            _ => Self(Uuid::now_v7().to_string()),
        }
    }

    fn acceptable(id: &str) -> bool {
        !id.is_empty() && id.len() <= MAX_LEN && id.bytes().all(|b| b.is_ascii_graphic())
    }

    pub(super) fn write_to(&self, res: &mut Response) {
        // Only printable ASCII is accepted, so encoding cannot fail.
        if let Ok(value) = HeaderValue::from_str(&self.0) {
            res.headers_mut().insert(HEADER, value);
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
