//! Team identifiers

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum team id length
pub const MAX_TEAM_ID_LEN: usize = 64;

/// Identifier of one team's dashboard
///
/// Used verbatim as a storage key suffix and a remote document id, so the
/// character set is restricted to ASCII alphanumerics, `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamId(String);

impl TeamId {
    /// Validate and wrap a team id
    ///
    /// # Errors
    /// `ModelError::InvalidTeamId` when empty, too long or containing
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ModelError::InvalidTeamId { id, reason: "empty" });
        }
        if id.len() > MAX_TEAM_ID_LEN {
            return Err(ModelError::InvalidTeamId {
                id,
                reason: "longer than 64 characters",
            });
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ModelError::InvalidTeamId {
                id,
                reason: "only ASCII letters, digits, '-' and '_' are allowed",
            });
        }
        Ok(Self(id))
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TeamId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TeamId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamId> for String {
    fn from(value: TeamId) -> Self {
        value.0
    }
}

impl AsRef<str> for TeamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_teams() {
        for id in ["PUD", "WTH", "SPV", "Team4", "night_shift-2"] {
            assert_eq!(TeamId::new(id).unwrap().as_str(), id);
        }
    }

    #[test]
    fn rejects_unsafe_ids() {
        assert!(TeamId::new("").is_err());
        assert!(TeamId::new("../etc").is_err());
        assert!(TeamId::new("Team 4").is_err());
        assert!(TeamId::new("x".repeat(65)).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: TeamId = serde_json::from_str("\"PUD\"").unwrap();
        assert_eq!(ok.to_string(), "PUD");
        assert!(serde_json::from_str::<TeamId>("\"a/b\"").is_err());
    }
}
