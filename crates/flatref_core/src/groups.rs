use std::collections::{BTreeMap, HashSet};

use crate::Reference;

/// Category tags are trimmed and have interior spaces removed, so
/// `"Audio Video"` and `"AudioVideo"` land in the same group. Other interior
/// whitespace is kept.
pub fn normalize_category(raw: &str) -> String {
    raw.trim().replace(' ', "")
}

/// References of one category in first-seen order, unique by app id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryGroup {
    references: Vec<Reference>,
    app_ids: HashSet<String>,
}

impl CategoryGroup {
    /// Returns `false` when the app id is already a member.
    pub fn insert(&mut self, reference: Reference) -> bool {
        if !self.app_ids.insert(reference.app_id().to_string()) {
            return false;
        }
        self.references.push(reference);
        true
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// Category name to group, iterated in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryGroups {
    groups: BTreeMap<String, CategoryGroup>,
}

impl CategoryGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `reference` under the normalized `category`. Empty category names
    /// are ignored. Returns whether the reference was new for that category.
    pub fn insert(&mut self, category: &str, reference: Reference) -> bool {
        let name = normalize_category(category);
        if name.is_empty() {
            return false;
        }
        self.groups.entry(name).or_default().insert(reference)
    }

    pub fn get(&self, category: &str) -> Option<&CategoryGroup> {
        self.groups.get(&normalize_category(category))
    }

    pub fn contains(&self, category: &str) -> bool {
        self.get(category).is_some_and(|group| !group.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryGroup)> {
        self.groups.iter().map(|(name, group)| (name.as_str(), group))
    }

    /// `(category, member count)` sorted by category name.
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.iter().map(|(name, group)| (name, group.len())).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Union of the named categories' references, de-duplicated by the full
    /// reference, in request order and first-seen order within each category.
    /// Unknown categories contribute nothing.
    pub fn merged<'a>(&self, categories: impl IntoIterator<Item = &'a str>) -> Vec<Reference> {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for category in categories {
            let Some(group) = self.get(category) else {
                continue;
            };
            for reference in group.references() {
                if seen.insert(reference.clone()) {
                    merged.push(reference.clone());
                }
            }
        }
        merged
    }
}
