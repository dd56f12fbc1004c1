use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Evaluation domain. `Auto` selects the union of every overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    General,
    Legal,
    Media,
    Financial,
    Auto,
}

impl Domain {
    pub fn parse(s: &str) -> Result<Domain, Error> {
        match s.to_lowercase().as_str() {
            "general" => Ok(Domain::General),
            "legal" => Ok(Domain::Legal),
            "media" => Ok(Domain::Media),
            "financial" => Ok(Domain::Financial),
            "auto" => Ok(Domain::Auto),
            other => Err(Error::UnknownDomain(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::General => "general",
            Domain::Legal => "legal",
            Domain::Media => "media",
            Domain::Financial => "financial",
            Domain::Auto => "auto",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
