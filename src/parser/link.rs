/// Build an absolute listing link from a card's inner HTML.
///
/// The card markup opens with `<a class="…" href="/marketplace/item/…" …>`, so
/// the path is the fourth `"`-delimited field.
pub fn from_card_html(html: &str, origin: &str) -> Option<String> {
    let path = html.split('"').nth(3)?;
    if path.is_empty() {
        return None;
    }
    Some(format!("{}{}", origin.trim_end_matches('/'), path))
}
