//! Cell-level extraction rules
//!
//! The wiki's tables are hand-edited and inconsistent, so each field is read
//! by a small rule that works on a single cell. Rules never fail hard; they
//! return `None` or a fallback and leave the decision to skip a row to the
//! extractor.

use scraper::ElementRef;

/// Highest rarity a servant can have
pub const MAX_RARITY: u8 = 5;

/// Attribute the wiki's sortable tables use for machine-readable values
pub const SORT_VALUE_ATTR: &str = "data-sort-value";

fn descendants_named<'a>(
    cell: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> {
    cell.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |element| element.value().name() == name)
}

fn normalize(text: impl Iterator<Item = impl AsRef<str>>) -> String {
    let joined: String = text.map(|s| s.as_ref().to_string()).collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All text in the cell with whitespace runs collapsed and trimmed
pub fn cell_text(cell: ElementRef<'_>) -> String {
    normalize(cell.text())
}

/// Text of the first hyperlink in the cell that has any
pub fn link_text(cell: ElementRef<'_>) -> Option<String> {
    descendants_named(cell, "a")
        .map(|link| normalize(link.text()))
        .find(|text| !text.is_empty())
}

/// Link text if the cell has a labelled link, otherwise the cell's own text
///
/// Returns `None` when both are empty.
pub fn link_or_cell_text(cell: ElementRef<'_>) -> Option<String> {
    link_text(cell).or_else(|| {
        let text = cell_text(cell);
        (!text.is_empty()).then_some(text)
    })
}

/// Positive integer identifier in the cell
///
/// On failure returns the offending text for the row error.
pub fn parse_id(cell: ElementRef<'_>) -> Result<u32, String> {
    let text = cell_text(cell);
    match text.parse::<u32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(text),
    }
}

/// Rarity from the cell's sort-value attribute, if present and in range
pub fn sort_value_rarity(cell: ElementRef<'_>) -> Option<u8> {
    cell.value()
        .attr(SORT_VALUE_ATTR)
        .and_then(|value| value.trim().parse::<u8>().ok())
        .filter(|rarity| *rarity <= MAX_RARITY)
}

/// Number of rating icons in the cell, capped at `MAX_RARITY`
pub fn icon_count(cell: ElementRef<'_>) -> u8 {
    let count = descendants_named(cell, "img").count();
    count.min(MAX_RARITY as usize) as u8
}

/// Rarity from the sort value, falling back to counting icons
pub fn rarity(cell: ElementRef<'_>) -> u8 {
    sort_value_rarity(cell).unwrap_or_else(|| icon_count(cell))
}
