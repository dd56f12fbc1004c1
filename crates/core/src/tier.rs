use serde::{Deserialize, Serialize};

/// Persistent Influence Theory tier: how deep a distortion reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitTier {
    /// Worldview-level, ideological framing.
    Tier1 = 1,
    /// Cognitive levers: urgency, fear, consensus pressure.
    Tier2 = 2,
    /// Authority- and institution-based distortion.
    Tier3 = 3,
}

impl PitTier {
    pub fn from_u8(n: u8) -> Option<PitTier> {
        match n {
            1 => Some(PitTier::Tier1),
            2 => Some(PitTier::Tier2),
            3 => Some(PitTier::Tier3),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    fn name(&self) -> &'static str {
        match self {
            PitTier::Tier1 => "IDEOLOGICAL",
            PitTier::Tier2 => "PSYCHOLOGICAL",
            PitTier::Tier3 => "INSTITUTIONAL",
        }
    }

    /// Renders the dominant-tier label, e.g. `tier_2_psychological`.
    pub fn label(&self) -> String {
        format!("tier_{}_{}", self.as_u8(), self.name()).to_lowercase()
    }
}

impl std::fmt::Display for PitTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
