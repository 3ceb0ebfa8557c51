use crate::core::Listing;

/// Currency every price is normalized to
pub const REFERENCE_CURRENCY: &str = "USD";

/// Static conversion table (units of reference currency per unit).
/// Approximate; not a live FX feed.
const RATES_TO_REFERENCE: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 1.08),
    ("GBP", 1.27),
    ("CAD", 0.74),
    ("AUD", 0.66),
    ("JPY", 0.0067),
    ("CHF", 1.13),
];

/// Rate for a currency code, if known
pub fn rate_to_reference(currency: &str) -> Option<f64> {
    let code = currency.trim().to_uppercase();
    RATES_TO_REFERENCE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, rate)| *rate)
}

/// Convert an amount; unknown currencies pass through unconverted
pub fn to_reference(amount: f64, currency: &str) -> f64 {
    match rate_to_reference(currency) {
        Some(rate) => amount * rate,
        None => {
            tracing::debug!("No rate for currency {:?}, keeping amount as-is", currency);
            amount
        }
    }
}

/// Rewrite a freshly fetched listing's price into the reference currency.
/// `currency` keeps the currency of record.
pub fn normalize(mut listing: Listing) -> Listing {
    listing.price = to_reference(listing.price, &listing.currency);
    listing.currency = listing.currency.trim().to_uppercase();
    listing
}
