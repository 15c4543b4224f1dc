//! Reconciliation modes
//!
//! The mode selects which lifecycle column of the category table applies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What the invocation is trying to achieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// First-time installation
    Install,
    /// Incremental upgrade; also used by read-only check/diff
    Upgrade,
    /// Remove tool-owned files, leave managed and shared files
    Uninstall,
    /// Remove tool-owned and managed files plus engine state
    UninstallFull,
}

impl Mode {
    /// All modes, in lifecycle order.
    pub const ALL: [Mode; 4] = [
        Mode::Install,
        Mode::Upgrade,
        Mode::Uninstall,
        Mode::UninstallFull,
    ];

    /// Whether this mode removes files rather than producing them.
    pub fn is_uninstall(self) -> bool {
        matches!(self, Self::Uninstall | Self::UninstallFull)
    }

    /// Whether deprecated entries are removed in this mode.
    pub fn removes_deprecated(self) -> bool {
        !matches!(self, Self::Install)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Upgrade => "upgrade",
            Self::Uninstall => "uninstall",
            Self::UninstallFull => "uninstall-full",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown mode '{s}'"))
    }
}
