//! Property-based test generators using proptest.
//!
//! Provides strategies for generating library contents, including the
//! stray files a real device directory accumulates.

use kosync_protocol::BookId;
use proptest::prelude::*;
use std::collections::BTreeSet;

const UUID_PATTERN: &str = "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

/// Strategy for generating book ids.
pub fn book_id_strategy() -> impl Strategy<Value = BookId> {
    prop::string::string_regex(UUID_PATTERN)
        .expect("Invalid regex")
        .prop_filter_map("hyphenated UUID", |s| BookId::parse(&s))
}

/// Strategy for generating a set of distinct book ids.
pub fn book_set_strategy(max: usize) -> impl Strategy<Value = BTreeSet<BookId>> {
    prop::collection::btree_set(book_id_strategy(), 0..=max)
}

/// Strategy for generating book content (arbitrary bytes).
pub fn book_content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

/// Strategy for generating id-like file names that must not count as books.
///
/// Covers wrong extensions, partial downloads, non-UUID stems and bare ids.
pub fn stray_file_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        book_id_strategy().prop_map(|id| format!("{id}.pdf")),
        book_id_strategy().prop_map(|id| format!("{id}.epub.part")),
        book_id_strategy().prop_map(|id| format!(".{id}.epub.part")),
        book_id_strategy().prop_map(|id| id.to_string()),
        prop::string::string_regex("[a-z][a-z0-9_-]{0,15}\\.(epub|txt|sdr)")
            .expect("Invalid regex"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_ids_are_canonical(id in book_id_strategy()) {
            let text = id.to_string();
            prop_assert_eq!(text.len(), 36);
            prop_assert_eq!(text.to_lowercase(), text);
        }

        #[test]
        fn stray_names_never_decode(name in stray_file_name_strategy()) {
            prop_assert!(BookId::from_file_name(&name).is_none());
        }
    }
}
