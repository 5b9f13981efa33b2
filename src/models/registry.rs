use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::employee::Condition;
use crate::models::group::Group;

/// How `list_group_names` orders its output. Membership semantics never
/// change with the mode; only iteration order does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// Case-insensitive lexicographic order (the default).
    #[default]
    Sorted,
    /// The order groups were first added.
    InsertionOrder,
    /// Whatever order the backing map yields; not stable between runs.
    Unordered,
}

/// A name-keyed collection of groups.
///
/// At most one group exists per distinct case-insensitive name. Entries are
/// kept in one backing map regardless of mode, so switching the mode
/// trivially preserves every entry.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    /// Lowercased name -> group (the group keeps its display-cased name).
    groups: HashMap<String, Group>,
    /// Lowercased names in first-insertion order.
    insertion_order: Vec<String>,
    mode: StorageMode,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: StorageMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Creates and stores a new empty group.
    ///
    /// If a group with the same case-insensitive name already exists it is
    /// silently replaced, members and all. That matches the historical
    /// behavior of this operation; callers that want a stricter contract
    /// must check with `get` first.
    pub fn add_group(&mut self, name: impl Into<String>, capacity: usize) {
        let name = name.into();
        let key = name.to_lowercase();
        if !self.groups.contains_key(&key) {
            self.insertion_order.push(key.clone());
        }
        self.groups.insert(key, Group::new(name, capacity));
    }

    /// Inserts an already-built group under its own name, replacing any
    /// existing group with the same case-insensitive name.
    pub fn insert(&mut self, group: Group) {
        let key = group.name().to_lowercase();
        if !self.groups.contains_key(&key) {
            self.insertion_order.push(key.clone());
        }
        self.groups.insert(key, group);
    }

    /// Removes a group by name; a no-op when absent.
    pub fn remove_group(&mut self, name: &str) {
        let key = name.to_lowercase();
        if self.groups.remove(&key).is_some() {
            self.insertion_order.retain(|k| k != &key);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.get(&name.to_lowercase())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Group> {
        self.groups.get_mut(&name.to_lowercase())
    }

    /// Group names (display casing) in the order the current mode dictates.
    pub fn list_group_names(&self) -> Vec<String> {
        let name_of = |key: &String| self.groups[key].name().to_string();
        match self.mode {
            StorageMode::Sorted => {
                let mut names: Vec<String> = self.groups.values().map(|g| g.name().to_string()).collect();
                names.sort_by_key(|n| n.to_lowercase());
                names
            }
            StorageMode::InsertionOrder => self.insertion_order.iter().map(name_of).collect(),
            StorageMode::Unordered => self.groups.keys().map(name_of).collect(),
        }
    }

    /// Names of groups whose member total across all four conditions is
    /// zero.
    pub fn find_empty_groups(&self) -> Vec<String> {
        self.list_group_names()
            .into_iter()
            .filter(|name| {
                let group = &self.groups[&name.to_lowercase()];
                Condition::ALL
                    .iter()
                    .map(|&c| group.count_by_condition(c))
                    .sum::<usize>()
                    == 0
            })
            .collect()
    }

    /// (name, member count) for non-empty groups, highest count first.
    /// Ties fall wherever the underlying iteration put them; the tie-break
    /// is unspecified.
    pub fn count_employees_per_group(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .list_group_names()
            .into_iter()
            .map(|name| {
                let len = self.groups[&name.to_lowercase()].len();
                (name, len)
            })
            .filter(|(_, len)| *len > 0)
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Switches the iteration-order policy. Every entry is preserved; only
    /// the order of `list_group_names` changes.
    pub fn change_storage_mode(&mut self, mode: StorageMode) {
        self.mode = mode;
    }
}
