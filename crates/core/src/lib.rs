//! `palisade-core` — domain foundation for the auth toolkit.
//!
//! This crate contains **pure domain** primitives (no storage or transport
//! concerns): strongly typed identifiers, the closed permission set, session
//! status, and the clock abstraction used for timer semantics.

pub mod clock;
pub mod id;
pub mod permission;
pub mod status;

pub use clock::{Clock, ManualClock, SystemClock};
pub use id::{PermissionId, ResourceId, RoleId, UserId};
pub use permission::Permission;
pub use status::Status;
