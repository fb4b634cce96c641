//! Color themes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A color theme for front ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Default,
    DarkBlue,
    DarkGreen,
    DarkPurple,
}

impl Theme {
    pub const ALL: [Theme; 4] = [
        Self::Default,
        Self::DarkBlue,
        Self::DarkGreen,
        Self::DarkPurple,
    ];

    /// Returns the persisted name of this theme.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::DarkBlue => "dark-blue",
            Self::DarkGreen => "dark-green",
            Self::DarkPurple => "dark-purple",
        }
    }

    /// Returns the CSS class list a front end applies to its root element.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Default => "dark",
            Self::DarkBlue => "dark dark-theme-blue",
            Self::DarkGreen => "dark dark-theme-green",
            Self::DarkPurple => "dark dark-theme-purple",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme '{0}' (expected default, dark-blue, dark-green or dark-purple)")]
pub struct ParseThemeError(String);

impl FromStr for Theme {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseThemeError(s.to_string()))
    }
}
