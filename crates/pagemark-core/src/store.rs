//! Per-page mark collections.

use crate::mark::{Mark, MarkId, PageNumber};
use serde::{Deserialize, Serialize};

/// The marks drawn on one document page, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMarkSet {
    pub page: PageNumber,
    pub marks: Vec<Mark>,
}

impl PageMarkSet {
    pub fn new(page: PageNumber) -> Self {
        Self {
            page,
            marks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }
}

/// All marks of an open document, at most one `PageMarkSet` per page.
///
/// Page sets are created lazily on the first committed mark and dropped
/// once their last mark is removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<PageMarkSet>", into = "Vec<PageMarkSet>")]
pub struct MarkStore {
    pages: Vec<PageMarkSet>,
}

impl MarkStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a page's set, if it has marks.
    pub fn page(&self, page: PageNumber) -> Option<&PageMarkSet> {
        self.pages.iter().find(|set| set.page == page)
    }

    fn page_index(&self, page: PageNumber) -> Option<usize> {
        self.pages.iter().position(|set| set.page == page)
    }

    /// Marks of a page in insertion order (empty if the page has none).
    pub fn marks(&self, page: PageNumber) -> &[Mark] {
        self.page(page).map(|set| set.marks.as_slice()).unwrap_or_default()
    }

    /// Get a mark by ID on a page.
    pub fn get(&self, page: PageNumber, id: MarkId) -> Option<&Mark> {
        self.marks(page).iter().find(|mark| mark.id() == id)
    }

    /// Append a mark to a page, creating the page's set if needed.
    pub fn push(&mut self, page: PageNumber, mark: Mark) {
        match self.page_index(page) {
            Some(idx) => self.pages[idx].marks.push(mark),
            None => self.pages.push(PageMarkSet {
                page,
                marks: vec![mark],
            }),
        }
    }

    /// Remove the most recently appended mark of a page.
    pub fn pop(&mut self, page: PageNumber) -> Option<Mark> {
        let idx = self.page_index(page)?;
        let mark = self.pages[idx].marks.pop();
        self.drop_if_empty(idx);
        mark
    }

    /// Remove a specific mark from a page.
    pub fn remove(&mut self, page: PageNumber, id: MarkId) -> Option<Mark> {
        let idx = self.page_index(page)?;
        let set = &mut self.pages[idx];
        let pos = set.marks.iter().position(|mark| mark.id() == id)?;
        let mark = set.marks.remove(pos);
        self.drop_if_empty(idx);
        Some(mark)
    }

    fn drop_if_empty(&mut self, idx: usize) {
        if self.pages[idx].is_empty() {
            self.pages.remove(idx);
        }
    }

    /// Remove a page's whole set.
    pub fn clear_page(&mut self, page: PageNumber) -> Option<PageMarkSet> {
        let idx = self.page_index(page)?;
        Some(self.pages.remove(idx))
    }

    /// Empty the store, returning the removed sets.
    pub fn clear(&mut self) -> Vec<PageMarkSet> {
        std::mem::take(&mut self.pages)
    }

    /// All page sets in creation order.
    pub fn pages(&self) -> &[PageMarkSet] {
        &self.pages
    }

    /// Total number of marks across pages.
    pub fn len(&self) -> usize {
        self.pages.iter().map(PageMarkSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Serialize the store to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a store from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<Vec<PageMarkSet>> for MarkStore {
    /// Build a store, merging duplicate page entries and skipping empty ones.
    ///
    /// Entries for page 0, marks without a shape kind and marks outside the
    /// page are dropped. Reversed marks are canonicalized.
    fn from(sets: Vec<PageMarkSet>) -> Self {
        let mut store = MarkStore::new();
        for set in sets {
            if set.page == 0 {
                log::warn!("Skipping {} marks on invalid page 0", set.marks.len());
                continue;
            }
            for mut mark in set.marks {
                if mark.shape_kind.is_none() || !mark.is_on_page() {
                    log::warn!("Skipping invalid mark on page {}: {:?}", set.page, mark);
                    continue;
                }
                mark.canonicalize();
                store.push(set.page, mark);
            }
        }
        store
    }
}

impl From<MarkStore> for Vec<PageMarkSet> {
    fn from(store: MarkStore) -> Self {
        store.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::ShapeKind;
    use kurbo::Point;

    fn hline(y: f64) -> Mark {
        Mark::new(
            ShapeKind::HorizontalLine,
            Point::new(0.1, y),
            Point::new(0.4, y),
        )
    }

    #[test]
    fn test_push_creates_page_lazily() {
        let mut store = MarkStore::new();
        assert!(store.page(1).is_none());

        store.push(1, hline(0.1));
        store.push(3, hline(0.2));
        store.push(1, hline(0.3));

        assert_eq!(store.pages().len(), 2);
        assert_eq!(store.marks(1).len(), 2);
        assert_eq!(store.marks(3).len(), 1);
        assert_eq!(store.len(), 3);
        assert!(store.marks(2).is_empty());
    }

    #[test]
    fn test_pop_removes_latest_and_drops_empty_page() {
        let mut store = MarkStore::new();
        let first = hline(0.1);
        let second = hline(0.2);
        store.push(1, first.clone());
        store.push(1, second.clone());
        store.push(2, hline(0.3));

        assert_eq!(store.pop(1).unwrap().id(), second.id());
        assert_eq!(store.marks(1)[0].id(), first.id());
        assert_eq!(store.marks(2).len(), 1);

        assert!(store.pop(1).is_some());
        assert!(store.page(1).is_none());
        assert!(store.pop(1).is_none());
    }

    #[test]
    fn test_remove_by_id() {
        let mut store = MarkStore::new();
        let keep = hline(0.1);
        let gone = hline(0.2);
        store.push(1, keep.clone());
        store.push(1, gone.clone());

        assert!(store.remove(1, gone.id()).is_some());
        assert!(store.get(1, gone.id()).is_none());
        assert!(store.get(1, keep.id()).is_some());
        assert!(store.remove(1, gone.id()).is_none());
        assert!(store.remove(5, keep.id()).is_none());
    }

    #[test]
    fn test_clear_page_and_clear() {
        let mut store = MarkStore::new();
        store.push(1, hline(0.1));
        store.push(2, hline(0.2));

        assert!(store.clear_page(1).is_some());
        assert!(store.clear_page(1).is_none());
        assert_eq!(store.pages().len(), 1);

        let cleared = store.clear();
        assert_eq!(cleared.len(), 1);
        assert_eq!(cleared[0].page, 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_merges_duplicate_pages() {
        let json = r#"[
            {"page": 1, "marks": [{"startX": 0.1, "startY": 0.5, "endX": 0.4, "endY": 0.5, "shapeKind": 0}]},
            {"page": 2, "marks": []},
            {"page": 1, "marks": [{"startX": 0.2, "startY": 0.2, "endX": 0.6, "endY": 0.7, "shapeKind": 2}]}
        ]"#;
        let store = MarkStore::from_json(json).unwrap();
        assert_eq!(store.pages().len(), 1);
        assert_eq!(store.marks(1).len(), 2);
        assert_eq!(store.marks(1)[1].shape_kind, ShapeKind::Rectangle);

        let back = MarkStore::from_json(&store.to_json().unwrap()).unwrap();
        assert_eq!(back.len(), 2);
        assert!(back.marks(1)[0].same_geometry(&store.marks(1)[0]));
    }

    #[test]
    fn test_json_skips_invalid_entries() {
        let json = r#"[
            {"page": 0, "marks": [{"startX": 0.1, "startY": 0.5, "endX": 0.4, "endY": 0.5, "shapeKind": 0}]},
            {"page": 1, "marks": [
                {"startX": 0.1, "startY": 0.1, "endX": 0.3, "endY": 0.3, "shapeKind": -1},
                {"startX": 0.1, "startY": 0.5, "endX": 1.4, "endY": 0.5, "shapeKind": 0},
                {"startX": 0.6, "startY": 0.7, "endX": 0.2, "endY": 0.2, "shapeKind": 2}
            ]}
        ]"#;
        let store = MarkStore::from_json(json).unwrap();
        assert!(store.page(0).is_none());
        assert_eq!(store.len(), 1);

        let rect = &store.marks(1)[0];
        assert_eq!(rect.shape_kind, ShapeKind::Rectangle);
        assert!(rect.is_canonical());
        assert_eq!(
            [rect.start_x, rect.start_y, rect.end_x, rect.end_y],
            [0.2, 0.2, 0.6, 0.7]
        );
    }
}
