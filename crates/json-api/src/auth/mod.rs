//! Request identity
//!
//! Shoppers are identified upstream; the trusted user id arrives in the
//! `X-User-Id` header. Operator routes are guarded by a static bearer token.

pub(crate) mod middleware;
pub(crate) mod operator;

pub(crate) use middleware::USER_ID_HEADER;
