use serde::{Deserialize, Serialize};

/// Lifecycle status of an identity session.
///
/// Transitions: `None → Active` on login, `Active → Suspended` on idleness,
/// `Suspended → Active` on resume, `{Active, Suspended} → Expired` when the
/// session grant lapses, and any state back to `None` on logout. Expiry
/// dominates suspension when both timers have lapsed; an expired session
/// cannot be resumed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// No session has been established.
    #[default]
    None,
    /// A session is established and recently active.
    Active,
    /// The long-lived session grant has lapsed.
    Expired,
    /// The session has been idle too long but the grant is still valid.
    Suspended,
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Status::None => write!(f, "none"),
            Status::Active => write!(f, "active"),
            Status::Expired => write!(f, "expired"),
            Status::Suspended => write!(f, "suspended"),
        }
    }
}
