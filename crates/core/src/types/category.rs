//! Product categories.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of product categories sold by the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Collectible figures (vinyl, resin, ...).
    #[default]
    Figure,
    /// Art pieces (canvases, prints, wall art).
    Art,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 2] = [Self::Figure, Self::Art];

    /// Stable identifier used in URLs and the backend table.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Figure => "figure",
            Self::Art => "art",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Figure => "Figures",
            Self::Art => "Art",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known category.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "figure" | "figures" => Ok(Self::Figure),
            "art" => Ok(Self::Art),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Category selection for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    /// Every category.
    #[default]
    All,
    /// A single category.
    Only(Category),
}

impl CategoryFilter {
    /// Parse a query-string value; empty and `all` mean [`CategoryFilter::All`],
    /// unknown values fall back to `All`.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("" | "all") => Self::All,
            Some(other) => other.parse().map_or(Self::All, Self::Only),
        }
    }

    /// Whether a product in `category` passes this filter.
    #[must_use]
    pub fn matches(&self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == category,
        }
    }

    /// Query-string value (`all`, `figure`, `art`).
    #[must_use]
    pub const fn as_param(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(category) => category.as_str(),
        }
    }
}
