//! Keyword markers: single weak-evidence phrases that are not, on their
//! own, structural distortion patterns but are worth flagging when they
//! appear with nothing backing them up.

/// One marker literal: `(id, literal phrase, description)`. Matching is
/// case-insensitive substring search, same as structural indicators.
pub const MARKERS: &[(&str, &str, &str)] = &[
    (
        "MARK_STUDIES_SHOW",
        "studies show",
        "appeal to unspecified research",
    ),
    (
        "MARK_EXPERTS_AGREE",
        "experts agree",
        "appeal to unnamed expert consensus",
    ),
    (
        "MARK_RESEARCH_PROVES",
        "research proves",
        "overstated certainty attributed to unspecified research",
    ),
    (
        "MARK_SCIENTISTS_SAY",
        "scientists say",
        "appeal to unnamed scientific authority",
    ),
    (
        "MARK_REPORTS_INDICATE",
        "reports indicate",
        "appeal to unspecified reporting",
    ),
    (
        "MARK_EVERYONE_KNOWS",
        "everyone knows",
        "appeal to assumed common knowledge",
    ),
    (
        "MARK_COMMON_SENSE",
        "common sense dictates",
        "appeal to unexamined common sense",
    ),
    (
        "MARK_MANY_BELIEVE",
        "many believe",
        "vague appeal to unspecified popular belief",
    ),
    (
        "MARK_GOES_WITHOUT_SAYING",
        "it goes without saying",
        "assertion presented as requiring no support",
    ),
    (
        "MARK_WITHOUT_A_DOUBT",
        "without a doubt",
        "overstated certainty marker",
    ),
    (
        "MARK_UNDENIABLY",
        "undeniably",
        "overstated certainty marker",
    ),
    (
        "MARK_CLEARLY_OBVIOUS",
        "it is obvious that",
        "overstated certainty marker",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_ids_are_unique() {
        let mut ids: Vec<&str> = MARKERS.iter().map(|(id, _, _)| *id).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(before, ids.len());
    }

    #[test]
    fn marker_literals_are_lowercase() {
        for &(_, literal, _) in MARKERS {
            assert_eq!(literal, literal.to_lowercase());
        }
    }
}
