//! Platform-neutral member snapshot and the whitelist role predicate.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Numeric member id (a platform snowflake).
///
/// Rendered in canonical decimal form, which is what the row store keys on. On the
/// wire it is accepted as a JSON number or a decimal string, since chat platforms
/// usually ship snowflakes as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(u64);

impl MemberId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MemberId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for MemberId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl Serialize for MemberId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MemberId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(u64),
            Text(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Number(raw) => Ok(Self(raw)),
            Wire::Text(text) => text.parse().map_err(|err| {
                serde::de::Error::custom(format!("invalid member id {text:?}: {err}"))
            }),
        }
    }
}

/// A member as the roster engine sees it: id, current display name, role names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Row-store key for this member.
    pub fn row_id(&self) -> String {
        self.id.to_string()
    }
}

/// Configured set of role names that grant whitelist status.
///
/// Holding any one of them qualifies a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistRoles {
    names: BTreeSet<String>,
}

impl WhitelistRoles {
    /// Returns `None` when no non-blank role name is given.
    pub fn new<I, S>(names: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: BTreeSet<String> = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(Self { names })
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn has_whitelist_role(&self, member: &Member) -> bool {
        member.roles.iter().any(|role| self.names.contains(role))
    }

    /// Whitelisted members of a full snapshot, one entry per id.
    ///
    /// A snapshot that repeats an id keeps the last occurrence, which carries the
    /// freshest display name. The result is ordered by numeric id; the reconciler
    /// re-sorts by row key itself.
    pub fn desired_set<'a, I>(&self, members: I) -> Vec<Member>
    where
        I: IntoIterator<Item = &'a Member>,
    {
        let mut by_id = BTreeMap::new();
        for member in members {
            if self.has_whitelist_role(member) {
                by_id.insert(member.id, member.clone());
            }
        }
        by_id.into_values().collect()
    }
}

impl fmt::Display for WhitelistRoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.names().collect();
        write!(f, "{}", names.join(", "))
    }
}
