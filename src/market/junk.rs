use crate::core::Listing;

/// Title tokens that mark a listing as not a single authentic card sale
const JUNK_TOKENS: &[&str] = &[
    "reprint", "reprints", "rp", "facsimile", "facsimilie", "digital",
    "lot", "lots", "set", "sets", "box", "boxes", "pack", "packs",
    "case", "cases", "break", "breaks",
];

/// Phrases that tokenizing would split apart
const JUNK_PHRASES: &[&str] = &["re-print", "r/p", "fac-simile"];

/// Does the title carry any negative keyword
pub fn is_junk(title: &str) -> bool {
    let lower = title.to_lowercase();
    if JUNK_PHRASES.iter().any(|p| lower.contains(p)) {
        return true;
    }
    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .any(|t| JUNK_TOKENS.contains(&t))
}

/// Drop junk listings. Returns empty rather than junk when nothing survives.
pub fn filter_junk(listings: Vec<Listing>) -> Vec<Listing> {
    let before = listings.len();
    let kept: Vec<Listing> = listings.into_iter().filter(|l| !is_junk(&l.title)).collect();
    if kept.len() < before {
        tracing::debug!("Junk filter dropped {} of {} listings", before - kept.len(), before);
    }
    kept
}
