//! Browse view: trending stories filtered by a search term

use hnq_common::ItemRecord;

/// Case-insensitive substring match on titles
///
/// Pure and stable: the input order is kept, and an empty term matches
/// everything. Whitespace in the term is significant.
pub fn filter_items<'a>(items: &'a [ItemRecord], term: &str) -> Vec<&'a ItemRecord> {
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| item.title.to_lowercase().contains(&needle))
        .collect()
}
