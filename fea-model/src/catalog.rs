//! Insertion-ordered named stores

use std::collections::HashMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::elements::{ElementProperties, Material, Section};
use crate::error::{FEAError, FEAResult};
use crate::loads::{Displacement, Load, Step};
use crate::misc::{Constraint, Interaction, Misc};
use crate::sets::Set;

/// Entities stored by name
pub trait Named {
    fn name(&self) -> &str;
}

macro_rules! named_by_field {
    ($($ty:ty),*) => {
        $(impl Named for $ty {
            fn name(&self) -> &str {
                &self.name
            }
        })*
    };
}

named_by_field!(Set, Material, Section, ElementProperties, Displacement, Load, Step);

impl Named for Constraint {
    fn name(&self) -> &str {
        Constraint::name(self)
    }
}

impl Named for Interaction {
    fn name(&self) -> &str {
        Interaction::name(self)
    }
}

impl Named for Misc {
    fn name(&self) -> &str {
        Misc::name(self)
    }
}

/// What to do when a name is added twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    Replace,
}

/// Name-unique store that keeps insertion order.
///
/// Serialized as a plain list; the name index is rebuilt on load.
#[derive(Debug, Clone)]
pub struct NamedStore<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for NamedStore<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Named> NamedStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list, rejecting repeated names
    pub fn from_items(items: Vec<T>) -> FEAResult<Self> {
        let mut store = Self::new();
        for item in items {
            store.insert(item, DuplicatePolicy::Reject)?;
        }
        Ok(store)
    }

    /// Insert an item. Under `Replace` the previous item keeps its position
    /// and is returned.
    pub fn insert(&mut self, item: T, policy: DuplicatePolicy) -> FEAResult<Option<T>> {
        match (self.index.get(item.name()), policy) {
            (Some(_), DuplicatePolicy::Reject) => {
                Err(FEAError::DuplicateName(item.name().to_string()))
            }
            (Some(&i), DuplicatePolicy::Replace) => {
                Ok(Some(std::mem::replace(&mut self.items[i], item)))
            }
            (None, _) => {
                self.index.insert(item.name().to_string(), self.items.len());
                self.items.push(item);
                Ok(None)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&i| &self.items[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Insertion position of `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Remove by name; later items shift down one position
    pub fn remove(&mut self, name: &str) -> Option<T> {
        let i = self.index.remove(name)?;
        let item = self.items.remove(i);
        for pos in self.index.values_mut() {
            if *pos > i {
                *pos -= 1;
            }
        }
        Some(item)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Mutable access that cannot rename items
    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(Named::name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a NamedStore<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: PartialEq> PartialEq for NamedStore<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Serialize> Serialize for NamedStore<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + Named> Deserialize<'de> for NamedStore<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Self::from_items(items).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> NamedStore<Section> {
        let mut store = NamedStore::new();
        for name in ["a", "b", "c"] {
            store
                .insert(Section::shell(name, 0.1), DuplicatePolicy::Reject)
                .unwrap();
        }
        store
    }

    #[test]
    fn test_insertion_order() {
        let store = store();
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(store.position("c"), Some(2));
    }

    #[test]
    fn test_duplicate_policies() {
        let mut store = store();
        assert!(matches!(
            store.insert(Section::shell("b", 0.2), DuplicatePolicy::Reject),
            Err(FEAError::DuplicateName(name)) if name == "b"
        ));
        let old = store
            .insert(Section::shell("b", 0.2), DuplicatePolicy::Replace)
            .unwrap();
        assert_eq!(old.and_then(|s| s.get("t")), Some(0.1));
        assert_eq!(store.get("b").and_then(|s| s.get("t")), Some(0.2));
        assert_eq!(store.position("b"), Some(1));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut store = store();
        assert!(store.remove("a").is_some());
        assert!(store.remove("a").is_none());
        assert_eq!(store.position("b"), Some(0));
        assert_eq!(store.get("c").map(|s| s.name.as_str()), Some("c"));
    }

    #[test]
    fn test_serde_rejects_duplicates() {
        let json = serde_json::to_string(&store()).unwrap();
        let back: NamedStore<Section> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store());

        let dup = format!(
            "[{},{}]",
            serde_json::to_string(&Section::solid("x")).unwrap(),
            serde_json::to_string(&Section::solid("x")).unwrap()
        );
        assert!(serde_json::from_str::<NamedStore<Section>>(&dup).is_err());
    }
}
