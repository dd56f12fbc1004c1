//! Recognizing citation tokens near a candidate match, so that a cited
//! claim is not penalized the same way an uncited one is.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches any of the citation shapes the registry recognizes:
/// parenthetical author-year, bracketed numerics, statute and section
/// references, `Id.`/`Ibid.`/`Supra`/`Infra`, case names, figure/table/page
/// references, report numbers, and institutional abbreviations.
pub static CITATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    regex::RegexBuilder::new(
        r#"(?x)
        \([A-Z][\w.'-]+(?:\s+et\s+al\.?)?,?\s+\d{4}[a-z]?\) |
        \[\d+\] |
        \d+\s+U\.S\.C\.\s*\x{00a7}?\s*\d+ |
        \x{00a7}\s*\d+(\.\d+)? |
        \b(Id\.|Ibid\.|Supra|Infra)\b |
        \b[A-Z][a-zA-Z]+\s+v\.?\s+[A-Z][a-zA-Z]+\b |
        \b(Table|Fig\.?|Figure|Appendix)\s+\d+\b |
        \bpp?\.\s*\d+(-\d+)?\b |
        \bReport\s+No\.\s*[\w-]+\b |
        \b(Nat'l|Fed\.|Dep't|Comm'n|Inst\.|Ass'n|Gov't)\b
        "#,
    )
    .case_insensitive(true)
    .build()
    .expect("citation regex is a compile-time constant")
});

/// Width of the window (in chars, each side) searched for a citation token
/// around a candidate match.
pub const CITATION_WINDOW: usize = 120;

/// True if a citation token appears within `CITATION_WINDOW` characters of
/// `match_start`/`match_end` (byte offsets into `text`, translated to char
/// positions so multi-byte text doesn't panic on slice boundaries).
pub fn has_nearby_citation(text: &str, match_start: usize, match_end: usize) -> bool {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let start_idx = chars
        .iter()
        .position(|(b, _)| *b >= match_start)
        .unwrap_or(chars.len());
    let end_idx = chars
        .iter()
        .position(|(b, _)| *b >= match_end)
        .unwrap_or(chars.len());

    let window_start_idx = start_idx.saturating_sub(CITATION_WINDOW);
    let window_end_idx = (end_idx + CITATION_WINDOW).min(chars.len());

    let window_byte_start = chars.get(window_start_idx).map(|(b, _)| *b).unwrap_or(0);
    let window_byte_end = chars.get(window_end_idx).map(|(b, _)| *b).unwrap_or(text.len());

    let window = &text[window_byte_start..window_byte_end.max(window_byte_start)];
    CITATION_REGEX.is_match(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_author_year_parenthetical() {
        let text = "Studies show (Smith et al., 2024) that sleep improves cognition.";
        let pos = text.find("Studies show").unwrap();
        assert!(has_nearby_citation(text, pos, pos + "Studies show".len()));
    }

    #[test]
    fn rejects_when_nothing_nearby() {
        let text = "Studies show that sleep improves cognition.";
        let pos = text.find("Studies show").unwrap();
        assert!(!has_nearby_citation(text, pos, pos + "Studies show".len()));
    }

    #[test]
    fn recognizes_case_name() {
        let text = "As held in Marbury v. Madison, the claim is well-settled law.";
        let pos = text.find("well-settled law").unwrap();
        assert!(has_nearby_citation(text, pos, pos + "well-settled law".len()));
    }

    #[test]
    fn window_respects_utf8_boundaries() {
        let text = "\u{00e9}\u{00e9}\u{00e9} studies show \u{00e9}\u{00e9}\u{00e9}";
        let pos = text.find("studies show").unwrap();
        assert!(!has_nearby_citation(text, pos, pos + "studies show".len()));
    }
}
