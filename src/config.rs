//! Default tuning constants for index construction.
//!
//! Runtime configuration is the [`Config`](crate::Config) struct; these are
//! the values it starts from.

/// Default number of established connections per node during construction.
///
/// Higher values improve recall but increase memory and build time.
/// Typical range: 8–64.
pub const DEFAULT_M: usize = 16;

/// Default cap on connections per node for layers above zero.
pub const DEFAULT_M_MAX: usize = 32;

/// Default cap on connections per node at layer 0 (typically `2 * M_MAX`).
pub const DEFAULT_M_MAX0: usize = 64;

/// Default beam width during insertion.
///
/// Controls the size of the dynamic candidate list while connecting a new
/// node. Higher values produce a better graph at the cost of build time.
pub const DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default cap on any node's top level.
pub const DEFAULT_MAX_LEVEL: usize = 16;

/// Hard upper bound on `max_level`. Node levels are stored as `u8`.
pub const MAX_LEVEL_LIMIT: usize = 255;
