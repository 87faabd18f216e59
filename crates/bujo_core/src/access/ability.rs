use std::error::Error;
use std::fmt::{Display, Formatter};

/// Operation class checked against a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ability {
    /// Read the scope and its bullets.
    View,
    /// Create, edit, move, reorder and remove bullets.
    Update,
    /// Delete the collection itself.
    Delete,
    /// Add or remove shared members.
    Share,
}

impl Ability {
    /// Stable string id used in logs and error payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => ABILITY_VIEW,
            Self::Update => ABILITY_UPDATE,
            Self::Delete => ABILITY_DELETE,
            Self::Share => ABILITY_SHARE,
        }
    }

    /// Whether a shared (non-owner) member holds this ability.
    pub fn granted_to_members(self) -> bool {
        matches!(self, Self::View | Self::Update)
    }
}

pub const ABILITY_VIEW: &str = "view";
pub const ABILITY_UPDATE: &str = "update";
pub const ABILITY_DELETE: &str = "delete";
pub const ABILITY_SHARE: &str = "share";

/// Parses one ability from its string id.
pub fn parse_ability(value: &str) -> Result<Ability, AbilityError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(AbilityError::Empty);
    }

    match normalized {
        ABILITY_VIEW => Ok(Ability::View),
        ABILITY_UPDATE => Ok(Ability::Update),
        ABILITY_DELETE => Ok(Ability::Delete),
        ABILITY_SHARE => Ok(Ability::Share),
        other => Err(AbilityError::Unsupported(other.to_string())),
    }
}

/// Ability parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbilityError {
    Empty,
    Unsupported(String),
}

impl Display for AbilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "ability value must not be empty"),
            Self::Unsupported(value) => write!(f, "ability is unsupported: {value}"),
        }
    }
}

impl Error for AbilityError {}
