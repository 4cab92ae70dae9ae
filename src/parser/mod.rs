pub mod fields;
pub mod link;

use tracing::{debug, info, warn};

use crate::listing::{Listing, RawCandidate};
use fields::FieldError;

/// Number of lines an accepted card has once the link is appended:
/// price, title, location, mileage, link.
const SEGMENTS: usize = 5;
const PRICE_MARK: char = '$';
const MILEAGE_MARK: char = 'K';

/// Turn collected cards into typed rows, in input order.
///
/// Cards with an unexpected shape are filtered out silently; cards whose title
/// does not tokenize are logged and skipped. Neither aborts the batch.
pub fn parse_candidates(candidates: &[RawCandidate]) -> Vec<Listing> {
    let mut listings = Vec::with_capacity(candidates.len());
    let mut malformed = 0usize;

    for candidate in candidates {
        match parse_candidate(candidate) {
            Ok(Some(listing)) => listings.push(listing),
            Ok(None) => debug!("Skipping card with unexpected shape: {:?}", candidate.text),
            Err(e) => {
                malformed += 1;
                warn!("Skipping card {}: {}", candidate.link, e);
            }
        }
    }

    info!(
        "Parsed {} listings from {} cards ({} malformed titles)",
        listings.len(),
        candidates.len(),
        malformed
    );
    listings
}

/// Parse one card. `Ok(None)` means the card failed the shape gate.
pub fn parse_candidate(candidate: &RawCandidate) -> Result<Option<Listing>, FieldError> {
    let joined = candidate.joined();
    let Some(segments) = accepted_segments(&joined) else {
        return Ok(None);
    };

    let title = segments[1];
    Ok(Some(Listing {
        price: segments[0].to_string(),
        year: fields::year(title)?,
        brand: fields::brand(title)?,
        model: fields::model(title),
        location: segments[2].to_string(),
        mileage: fields::mileage(segments[3])?,
        link: segments[4].to_string(),
        vin: None,
    }))
}

/// Split into lines, drop a duplicated price line (a struck-through original
/// price shown next to the current one), then apply the shape gate.
fn accepted_segments(text: &str) -> Option<Vec<&str>> {
    let mut segments: Vec<&str> = text.split('\n').collect();

    if segments.len() > 1
        && segments[0].contains(PRICE_MARK)
        && segments[1].contains(PRICE_MARK)
    {
        segments.remove(1);
    }

    if segments.len() == SEGMENTS && segments[3].contains(MILEAGE_MARK) {
        Some(segments)
    } else {
        None
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::NO_MODEL;

    const LINK: &str = "https://www.facebook.com/marketplace/item/42/";

    /// Cards in the fixture are separated by a line holding only `---`.
    fn fixture_cards() -> Vec<RawCandidate> {
        let text = std::fs::read_to_string("tests/fixtures/marketplace_cards.txt").unwrap();
        text.split("\n---\n")
            .enumerate()
            .map(|(i, card)| {
                RawCandidate::new(
                    card.trim_end_matches('\n'),
                    format!("https://www.facebook.com/marketplace/item/{}/", i),
                )
            })
            .collect()
    }

    #[test]
    fn well_formed_card() {
        let card = RawCandidate::new("$12,000\n2019 Honda Civic\nOakland, CA\n60K miles", LINK);
        let listing = parse_candidate(&card).unwrap().unwrap();
        assert_eq!(listing.price, "$12,000");
        assert_eq!(listing.year, 2019);
        assert_eq!(listing.brand, "Honda");
        assert_eq!(listing.model, "Civic");
        assert_eq!(listing.location, "Oakland, CA");
        assert_eq!(listing.mileage, 60000.0);
        assert_eq!(listing.link, LINK);
        assert_eq!(listing.vin, None);
    }

    #[test]
    fn four_segments_filtered() {
        let card = RawCandidate::new("$12,000\n2019 Honda Civic\n60K miles", LINK);
        assert_eq!(parse_candidate(&card), Ok(None));
        assert!(parse_candidates(&[card]).is_empty());
    }

    #[test]
    fn duplicate_price_collapsed() {
        let card = RawCandidate::new(
            "$12,000\n$11,500\n2019 Honda Civic\nOakland, CA\n60K miles",
            LINK,
        );
        let listing = parse_candidate(&card).unwrap().unwrap();
        assert_eq!(listing.price, "$12,000");
        assert_eq!(listing.year, 2019);
        assert_eq!(listing.link, LINK);
    }

    #[test]
    fn mileage_marker_required() {
        let card = RawCandidate::new("$12,000\n2019 Honda Civic\nOakland, CA\nDealership", LINK);
        assert_eq!(parse_candidate(&card), Ok(None));
    }

    #[test]
    fn bad_title_is_error_at_card_level() {
        let card = RawCandidate::new("$9,500\nFree Honda Civic\nOakland, CA\n60K miles", LINK);
        assert!(matches!(parse_candidate(&card), Err(FieldError::Year(_))));
    }

    #[test]
    fn bad_title_skipped_in_batch() {
        let cards = vec![
            RawCandidate::new("$9,500\nFree Honda Civic\nOakland, CA\n60K miles", LINK),
            RawCandidate::new("$7,000\n2016 Mazda\nFremont, CA\n88K miles", LINK),
        ];
        let listings = parse_candidates(&cards);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].brand, "Mazda");
        assert_eq!(listings[0].model, NO_MODEL);
    }

    #[test]
    fn fixture_batch() {
        let cards = fixture_cards();
        assert_eq!(cards.len(), 7);
        let listings = parse_candidates(&cards);
        let titles: Vec<String> = listings.iter().map(|l| l.title()).collect();
        assert_eq!(
            titles,
            vec![
                "2019 Honda Civic",
                "2018 Toyota Camry",
                "2020 Tesla Model",
                "2017 BMW No Model Name",
            ]
        );
        assert_eq!(listings[1].price, "$18,900");
        assert_eq!(listings[2].mileage, 3500.0);
        assert!(listings[0].link.ends_with("/item/0/"));
        assert!(listings[3].link.ends_with("/item/5/"));
    }
}
