//! Joins table rows with images on the name-derived key.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::types::{file_stem, ImageBlob, MatchedRecord, TabularRecord};

/// Result of matching rows against images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Matched records in table row order.
    pub matched: Vec<MatchedRecord>,
    /// Unmatched rows first (row order), then unmatched images (upload order).
    pub missing_items: Vec<String>,
    /// Images whose key was already taken by an earlier image in the batch.
    pub duplicate_images: Vec<String>,
}

impl MatchOutcome {
    /// All non-fatal messages, in reporting order.
    pub fn warnings(&self) -> impl Iterator<Item = &String> {
        self.duplicate_images.iter().chain(self.missing_items.iter())
    }
}

/// Join key of an image: its file name without the last extension, trimmed.
pub fn image_key(filename: &str) -> &str {
    file_stem(filename).trim()
}

/// Match table rows to images by exact key equality after trimming.
///
/// When two images share a key the later one wins and a duplicate warning is
/// recorded. Never fails; an empty `matched` list is left to the caller.
pub fn match_records(rows: &[TabularRecord], images: &[ImageBlob]) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();

    let mut lookup: HashMap<&str, usize> = HashMap::with_capacity(images.len());
    let mut image_keys: Vec<&str> = Vec::with_capacity(images.len());
    for (idx, image) in images.iter().enumerate() {
        let key = image_key(image.name());
        match lookup.insert(key, idx) {
            Some(previous) => {
                let message = format!(
                    "duplicate image for key: {} ({} replaced by {})",
                    key,
                    images[previous].name(),
                    image.name()
                );
                warn!("{}", message);
                outcome.duplicate_images.push(message);
            }
            None => image_keys.push(key),
        }
    }

    info!(
        records = rows.len(),
        images = lookup.len(),
        "Matching CSV records with images"
    );

    let mut referenced: HashSet<&str> = HashSet::new();
    for row in rows {
        let key = row.key.trim();
        match lookup.get(key) {
            Some(&image_index) => {
                referenced.insert(key);
                outcome.matched.push(MatchedRecord {
                    image_name: key.to_string(),
                    description: row.description.trim().to_string(),
                    image_index,
                });
            }
            None => {
                let message = format!("missing image for record: {}", key);
                warn!("{}", message);
                outcome.missing_items.push(message);
            }
        }
    }

    for key in image_keys {
        if !referenced.contains(key) {
            let message = format!("missing record for image: {}", images[lookup[key]].name());
            warn!("{}", message);
            outcome.missing_items.push(message);
        }
    }

    info!(
        matched = outcome.matched.len(),
        missing = outcome.missing_items.len(),
        "Matching completed"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InMemoryFile;

    fn rows(keys: &[&str]) -> Vec<TabularRecord> {
        keys.iter()
            .map(|k| TabularRecord::new(*k, format!("desc {}", k)))
            .collect()
    }

    fn images(names: &[&str]) -> Vec<ImageBlob> {
        names
            .iter()
            .map(|n| InMemoryFile::boxed(*n, n.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn test_symmetric_matching() {
        let outcome = match_records(&rows(&["A", "B", "C"]), &images(&["A.jpg", "B.png", "D.jpg"]));

        let matched: Vec<&str> = outcome.matched.iter().map(|m| m.image_name.as_str()).collect();
        assert_eq!(matched, vec!["A", "B"]);

        let missing: HashSet<&str> = outcome.missing_items.iter().map(|s| s.as_str()).collect();
        let expected: HashSet<&str> =
            ["missing image for record: C", "missing record for image: D.jpg"]
                .into_iter()
                .collect();
        assert_eq!(missing, expected);
        assert!(outcome.duplicate_images.is_empty());
    }

    #[test]
    fn test_unmatched_image_named_by_actual_filename() {
        let outcome = match_records(&rows(&["A"]), &images(&["A.jpg", "7.png"]));
        assert_eq!(outcome.missing_items, vec!["missing record for image: 7.png"]);
    }

    #[test]
    fn test_preserves_row_order_and_indices() {
        let outcome = match_records(&rows(&["3", "1", "2"]), &images(&["1.jpg", "2.jpg", "3.jpeg"]));
        let pairs: Vec<(&str, usize)> = outcome
            .matched
            .iter()
            .map(|m| (m.image_name.as_str(), m.image_index))
            .collect();
        assert_eq!(pairs, vec![("3", 2), ("1", 0), ("2", 1)]);
        assert_eq!(outcome.matched[0].description, "desc 3");
        assert!(outcome.missing_items.is_empty());
    }

    #[test]
    fn test_exact_match_no_case_folding() {
        let outcome = match_records(&rows(&["abc"]), &images(&["ABC.jpg"]));
        assert!(outcome.matched.is_empty());
        assert_eq!(outcome.missing_items.len(), 2);
    }

    #[test]
    fn test_trims_whitespace() {
        let outcome = match_records(&rows(&[" 42 "]), &images(&["42.jpg"]));
        assert_eq!(outcome.matched.len(), 1);
        assert_eq!(outcome.matched[0].image_name, "42");
    }

    #[test]
    fn test_duplicate_rows_share_one_image() {
        let outcome = match_records(&rows(&["1", "1"]), &images(&["1.jpg"]));
        assert_eq!(outcome.matched.len(), 2);
        assert!(outcome.matched.iter().all(|m| m.image_index == 0));
        assert!(outcome.missing_items.is_empty());
    }

    #[test]
    fn test_duplicate_image_keys_last_wins_with_warning() {
        let outcome = match_records(&rows(&["1"]), &images(&["1.jpg", "1.png"]));
        assert_eq!(outcome.matched[0].image_index, 1);
        assert_eq!(
            outcome.duplicate_images,
            vec!["duplicate image for key: 1 (1.jpg replaced by 1.png)"]
        );
        assert!(outcome.missing_items.is_empty());
        assert_eq!(outcome.warnings().count(), 1);
    }

    #[test]
    fn test_empty_inputs() {
        let outcome = match_records(&[], &images(&["1.jpg"]));
        assert!(outcome.matched.is_empty());
        assert_eq!(outcome.missing_items, vec!["missing record for image: 1.jpg"]);

        let outcome = match_records(&rows(&["1"]), &[]);
        assert_eq!(outcome.missing_items, vec!["missing image for record: 1"]);
    }

    #[test]
    fn test_image_key() {
        assert_eq!(image_key("42.jpg"), "42");
        assert_eq!(image_key("shelf.a.png"), "shelf.a");
        assert_eq!(image_key(" 7 .jpeg"), "7");
    }
}
