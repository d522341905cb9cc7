//! Band name folding for lookups.
//!
//! Exact display names are tried first; the folded form is only a fallback
//! so that "Motorhead" finds "Motörhead" and "  blind   guardian" finds
//! "Blind Guardian".

use any_ascii::any_ascii;
use unicode_normalization::UnicodeNormalization;

/// Minimum Jaro-Winkler similarity for a name to be offered as a suggestion
pub const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to lowercase ASCII by applying NFKD decomposition,
/// removing combining marks, then transliterating what is left.
/// e.g., "Motörhead" → "motorhead", "Sigur Rós" → "sigur ros"
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    any_ascii(&stripped).to_lowercase()
}

/// Lookup key for a band name: folded, trimmed, whitespace collapsed.
pub fn fold_band_name(name: &str) -> String {
    let folded = fold_to_ascii(name.trim());
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rank `candidates` (already folded) against a folded query and return the
/// best `limit` above [`SUGGESTION_THRESHOLD`], most similar first.
pub fn closest_names<'a, I>(query: &str, candidates: I, limit: usize) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        .map(|c| (strsim::jaro_winkler(query, c), c))
        .filter(|(sim, _)| *sim >= SUGGESTION_THRESHOLD)
        .collect();
    // Ties broken alphabetically so suggestions are stable across runs
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.into_iter().take(limit).map(|(_, c)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_to_ascii() {
        assert_eq!(fold_to_ascii("Motörhead"), "motorhead");
        assert_eq!(fold_to_ascii("Mötley Crüe"), "motley crue");
        assert_eq!(fold_to_ascii("Blue Öyster Cult"), "blue oyster cult");
    }

    #[test]
    fn test_fold_band_name_collapses_whitespace() {
        assert_eq!(fold_band_name("  Blind   Guardian "), "blind guardian");
        assert_eq!(fold_band_name("Emperor"), "emperor");
    }

    #[test]
    fn test_closest_names() {
        let names = ["metallica", "megadeth", "mastodon", "opeth"];
        let found = closest_names("metalica", names.iter().copied(), 3);
        assert_eq!(found.first(), Some(&"metallica"));
        assert!(!found.contains(&"opeth"));
    }

    #[test]
    fn test_closest_names_empty_when_nothing_close() {
        let names = ["burzum", "darkthrone"];
        assert!(closest_names("nightwish", names.iter().copied(), 3).is_empty());
    }
}
