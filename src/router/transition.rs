use crate::roster::{Member, WhitelistRoles};

/// How a role update moved a member relative to the whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleTransition {
    Gained,
    Lost,
    Unchanged,
}

impl RoleTransition {
    /// Only crossing the whitelist boundary counts. Role churn on either side of it,
    /// including swapping one whitelist role for another, is `Unchanged`.
    pub fn classify(roles: &WhitelistRoles, before: &Member, after: &Member) -> Self {
        match (
            roles.has_whitelist_role(before),
            roles.has_whitelist_role(after),
        ) {
            (false, true) => Self::Gained,
            (true, false) => Self::Lost,
            _ => Self::Unchanged,
        }
    }
}
