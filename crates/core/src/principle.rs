use serde::{Deserialize, Serialize};

/// The five frozen principles a structural pattern may be said to violate.
///
/// This set is closed by design: learned patterns extend detection
/// capability but must declare themselves against one of these five,
/// never invent a sixth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Principle {
    Truth,
    Justice,
    Clarity,
    Agency,
    Identity,
}

impl Principle {
    /// Declaration order, used as the tie-break when counting principle
    /// occurrences in the evaluator.
    pub const ALL: [Principle; 5] = [
        Principle::Truth,
        Principle::Justice,
        Principle::Clarity,
        Principle::Agency,
        Principle::Identity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Principle::Truth => "Truth",
            Principle::Justice => "Justice",
            Principle::Clarity => "Clarity",
            Principle::Agency => "Agency",
            Principle::Identity => "Identity",
        }
    }

    pub fn parse(s: &str) -> Option<Principle> {
        Self::ALL.iter().copied().find(|p| p.as_str().eq_ignore_ascii_case(s))
    }
}

impl Default for Principle {
    fn default() -> Self {
        Principle::Truth
    }
}

impl std::fmt::Display for Principle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
