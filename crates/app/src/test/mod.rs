//! Service-level test support.


pub(crate) use context::TestContext;
