//! Users
//!
//! Identity is resolved upstream; the core only ever sees a trusted user
//! identifier attached to each request.

use crate::uuids::TypedUuid;

/// Marker for identifiers issued by the identity provider.
#[derive(Debug)]
pub struct User;

/// User UUID
pub type UserUuid = TypedUuid<User>;
