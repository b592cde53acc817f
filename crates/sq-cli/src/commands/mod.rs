//! CLI command implementations

pub(crate) mod guidance;
pub(crate) mod squash;
