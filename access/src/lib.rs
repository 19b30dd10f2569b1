//! Access control for the Custos ledger.
//!
//! Holds the single administrator identity and the brand-authorization
//! records. Every privileged operation elsewhere in the workspace goes
//! through the guard helpers here (`require_admin`,
//! `require_authorized_brand`) before touching state.

pub mod control;
pub mod error;

pub use control::AccessControl;
pub use error::AccessError;
