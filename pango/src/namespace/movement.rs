use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PangoError;

/// Where a group of rules should end up relative to the rulebase or an
/// anchor rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Movement {
    /// Leave the ordering alone.
    #[default]
    Skip,
    Top,
    Bottom,
    /// Anywhere before the anchor.
    Before,
    DirectlyBefore,
    /// Anywhere after the anchor.
    After,
    DirectlyAfter,
}

impl Movement {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Before => "before",
            Self::DirectlyBefore => "directly-before",
            Self::After => "after",
            Self::DirectlyAfter => "directly-after",
        }
    }

    /// Top or bottom.
    pub fn is_absolute(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }

    /// Positioned relative to an anchor rule.
    pub fn is_relative(self) -> bool {
        matches!(
            self,
            Self::Before | Self::DirectlyBefore | Self::After | Self::DirectlyAfter
        )
    }
}

impl Display for Movement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Movement {
    type Err = PangoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "" | "skip" => Self::Skip,
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            "before" => Self::Before,
            "directly-before" => Self::DirectlyBefore,
            "after" => Self::After,
            "directly-after" => Self::DirectlyAfter,
            other => {
                return Err(PangoError::validation(format!(
                    "unsupported movement {other:?}"
                )))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Movement;

    #[test]
    fn parses_every_constant() {
        for movement in [
            Movement::Skip,
            Movement::Top,
            Movement::Bottom,
            Movement::Before,
            Movement::DirectlyBefore,
            Movement::After,
            Movement::DirectlyAfter,
        ] {
            assert_eq!(movement.as_str().parse::<Movement>().expect("parse"), movement);
        }
        assert!("sideways".parse::<Movement>().is_err());
    }
}
