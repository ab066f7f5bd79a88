//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::{Deserialize, Serialize};

/// ISO 3166-1 alpha-2 country code, always stored uppercase.
///
/// Member records imported from the old association database carry the
/// vehicle registration code `D` for Germany; it is mapped to `DE` here so
/// every cache key uses the ISO form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse a country code, returning None for empty input.
    ///
    /// # Examples
    /// ```
    /// use hzd_geo::domain::value_objects::CountryCode;
    ///
    /// assert_eq!(CountryCode::parse(" at ").unwrap().as_str(), "AT");
    /// assert_eq!(CountryCode::parse("D").unwrap().as_str(), "DE");
    /// assert!(CountryCode::parse("  ").is_none());
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        let upper = trimmed.to_uppercase();
        match upper.as_str() {
            "D" => Some(Self("DE".to_string())),
            _ => Some(Self(upper)),
        }
    }

    /// Parse a country code, falling back to `default` when absent or empty.
    pub fn parse_or(s: Option<&str>, default: &CountryCode) -> Self {
        s.and_then(Self::parse).unwrap_or_else(|| default.clone())
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CountryCode {
    fn default() -> Self {
        Self("DE".to_string())
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Document collections that carry geolocation data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Breeder profiles, located by their kennel address.
    Breeders,
    /// Member accounts, located by their home postal code.
    Users,
    /// Dogs, located at their breeder.
    Dogs,
}

impl Collection {
    /// Parse a collection name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "breeders" => Some(Self::Breeders),
            "users" => Some(Self::Users),
            "dogs" => Some(Self::Dogs),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breeders => "breeders",
            Self::Users => "users",
            Self::Dogs => "dogs",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
