//! The site tree: every parsed page, keyed by output path.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::page::PageRecord;

/// How an upsert treats an output path that is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertMode {
    /// Whole-site build. Output paths are expected to be new; a repeat
    /// replaces the earlier page and is logged.
    Full,
    /// Single-file rebuild. A repeat replaces the page in its existing slot.
    Incremental,
}

/// Where an upsert put the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Appended(usize),
    Replaced(usize),
}

/// Pages with the same group, in navigation order.
#[derive(Debug, Clone, Serialize)]
pub struct PageGroup<'a> {
    pub name: Option<&'a str>,
    pub pages: Vec<&'a PageRecord>,
}

/// Ordered collection of page records with unique output paths.
///
/// Records keep their insertion slot; [`SiteTree::list`] applies navigation
/// order on read.
#[derive(Debug, Default, Clone)]
pub struct SiteTree {
    records: Vec<PageRecord>,
    index: HashMap<String, usize>,
}

impl SiteTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }

    /// Insert a record, or replace the one sharing its output path.
    pub fn upsert(&mut self, record: PageRecord, mode: UpsertMode) -> Upserted {
        if let Some(&slot) = self.index.get(&record.output_path) {
            if mode == UpsertMode::Full {
                warn!(
                    "Duplicate output path {} (from {}), replacing earlier page",
                    record.output_path,
                    record.original_path.display()
                );
            }
            self.records[slot] = record;
            return Upserted::Replaced(slot);
        }

        let slot = self.records.len();
        self.index.insert(record.output_path.clone(), slot);
        self.records.push(record);
        Upserted::Appended(slot)
    }

    pub fn get(&self, output_path: &str) -> Option<&PageRecord> {
        self.index.get(output_path).map(|&slot| &self.records[slot])
    }

    pub fn contains(&self, output_path: &str) -> bool {
        self.index.contains_key(output_path)
    }

    /// Remove a page, shifting later records down one slot.
    pub fn remove(&mut self, output_path: &str) -> Option<PageRecord> {
        let slot = self.index.remove(output_path)?;
        let record = self.records.remove(slot);
        for later in &self.records[slot..] {
            if let Some(entry) = self.index.get_mut(&later.output_path) {
                *entry -= 1;
            }
        }
        Some(record)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, PageRecord> {
        self.records.iter()
    }

    /// Records in navigation order: ascending `order`, unordered pages last,
    /// ties in insertion order.
    pub fn list(&self) -> Vec<&PageRecord> {
        let mut pages: Vec<&PageRecord> = self.records.iter().collect();
        pages.sort_by(|a, b| compare_order(a.order, b.order));
        pages
    }

    /// Listed pages split by group, groups in order of first appearance.
    pub fn groups(&self) -> Vec<PageGroup<'_>> {
        let mut groups: Vec<PageGroup<'_>> = Vec::new();

        for page in self.list() {
            let name = page.group.as_deref();
            match groups.iter_mut().find(|g| g.name == name) {
                Some(group) => group.pages.push(page),
                None => groups.push(PageGroup {
                    name,
                    pages: vec![page],
                }),
            }
        }

        groups
    }
}

fn compare_order(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
