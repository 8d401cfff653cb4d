//! Ordered keyed collection
//!
//! [`Collection`] is the container every listing in this crate is returned in.
//! Entries are addressed by [`Key`], which is either a position assigned on
//! append or a caller-chosen name. The order of keys is kept in an explicit
//! sequence next to the map, so iteration and serialization always follow
//! insertion order.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, DeserializeOwned, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key of a collection entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Positional key, assigned by [`Collection::push`] or set explicitly
    Index(i64),
    /// Named key
    Name(String),
}

impl Key {
    /// Parse a textual key
    ///
    /// Canonical decimal integers ("0", "42", "-7") become positional keys,
    /// anything else ("007", "name", "") stays a name.
    pub fn parse(s: &str) -> Self {
        let digits = s.strip_prefix('-').unwrap_or(s);
        let canonical = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && (digits == "0" || !digits.starts_with('0'))
            && s != "-0";

        match canonical.then(|| s.parse::<i64>().ok()).flatten() {
            Some(index) => Key::Index(index),
            None => Key::Name(s.to_string()),
        }
    }

    /// The position, for positional keys
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(_) => None,
        }
    }

    /// The name, for named keys
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Index(_) => None,
            Key::Name(name) => Some(name),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{i}"),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for Key {
    fn from(index: i64) -> Self {
        Key::Index(index)
    }
}

impl From<i32> for Key {
    fn from(index: i32) -> Self {
        Key::Index(i64::from(index))
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index as i64)
    }
}

/// Goes through [`Key::parse`], so `"0"` and `0` address the same entry
impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::parse(name)
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        match Key::parse(&name) {
            Key::Index(index) => Key::Index(index),
            Key::Name(_) => Key::Name(name),
        }
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::Index(i) => serializer.serialize_i64(*i),
            Key::Name(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = Key;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or a string key")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Key, E> {
                Ok(Key::Index(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Key, E> {
                Ok(i64::try_from(v)
                    .map(Key::Index)
                    .unwrap_or_else(|_| Key::Name(v.to_string())))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Key, E> {
                Ok(Key::parse(v))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

/// Ordered keyed container
///
/// Keeps a key sequence alongside the entry map. Every key in the sequence has
/// an entry and every entry has exactly one position in the sequence.
#[derive(Debug, Clone)]
pub struct Collection<V> {
    items: HashMap<Key, V>,
    keys: Vec<Key>,
    /// `None` once `i64::MAX` has been used as a position
    next_index: Option<i64>,
}

impl<V> Default for Collection<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Collection<V> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            keys: Vec::new(),
            next_index: Some(0),
        }
    }

    /// Whether an entry is stored under `key`
    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.items.contains_key(&key.into())
    }

    /// Value stored under `key`, `None` when the key is unset
    pub fn get(&self, key: impl Into<Key>) -> Option<&V> {
        self.items.get(&key.into())
    }

    /// Mutable access to the value stored under `key`
    pub fn get_mut(&mut self, key: impl Into<Key>) -> Option<&mut V> {
        self.items.get_mut(&key.into())
    }

    /// Number of live entries
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert or overwrite the entry under `key`
    ///
    /// An existing key keeps its position; a new key goes to the end.
    /// Returns the previous value, if any.
    pub fn set(&mut self, key: impl Into<Key>, value: V) -> Option<V> {
        let key = key.into();
        if let Key::Index(index) = key {
            self.next_index = match (self.next_index, index.checked_add(1)) {
                (Some(next), Some(after)) => Some(next.max(after)),
                _ => None,
            };
        }

        let previous = self.items.insert(key.clone(), value);
        if previous.is_none() {
            self.keys.push(key);
        }
        previous
    }

    /// Append `value` under the next positional key and return that key
    ///
    /// The next position is one past the largest position ever assigned, so
    /// positions freed by [`Collection::unset`] are not reused. Fails without
    /// storing anything once `i64::MAX` has been assigned.
    pub fn push(&mut self, value: V) -> crate::Result<Key> {
        let index = self.next_index.ok_or_else(|| {
            crate::Error::General("Collection has no free position to append to".into())
        })?;
        let key = Key::Index(index);
        self.set(key.clone(), value);
        Ok(key)
    }

    /// Remove the entry under `key`; no-op when the key is unset
    ///
    /// Other keys keep their values, nothing is renumbered.
    pub fn unset(&mut self, key: impl Into<Key>) -> Option<V> {
        let key = key.into();
        let removed = self.items.remove(&key)?;
        self.keys.retain(|k| k != &key);
        Some(removed)
    }

    /// Keys in iteration order
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Values in iteration order
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Begin an iteration; the returned cursor holds the position
    pub fn cursor(&self) -> Cursor {
        Cursor::new()
    }

    /// Iterate over `(key, value)` pairs in key order
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            collection: self,
            cursor: Cursor::new(),
        }
    }

    /// Whether the keys are exactly `0..count` in order
    pub fn is_list(&self) -> bool {
        self.keys
            .iter()
            .enumerate()
            .all(|(position, key)| *key == Key::Index(position as i64))
    }

    /// Plain structured form of the current mapping, in key order
    pub fn to_value(&self) -> crate::Result<serde_json::Value>
    where
        V: Serialize,
    {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuild a collection from the output of [`Collection::to_value`]
    pub fn from_value(value: serde_json::Value) -> crate::Result<Self>
    where
        V: DeserializeOwned,
    {
        Ok(serde_json::from_value(value)?)
    }
}

impl<V: PartialEq> PartialEq for Collection<V> {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys && self.iter().zip(other.iter()).all(|(a, b)| a.1 == b.1)
    }
}

impl<K: Into<Key>, V> FromIterator<(K, V)> for Collection<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut collection = Self::new();
        for (key, value) in iter {
            collection.set(key, value);
        }
        collection
    }
}

impl<V> From<Vec<V>> for Collection<V> {
    fn from(values: Vec<V>) -> Self {
        values.into_iter().enumerate().collect()
    }
}

impl<'a, V> IntoIterator for &'a Collection<V> {
    type Item = (&'a Key, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iteration position over a [`Collection`]
///
/// The cursor is detached from the collection: it only stores a position and
/// is resolved against a collection on every access. A position whose key no
/// longer resolves is invalid and reads as the end of the sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    position: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self { position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Move back to the first element
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Move to the next element
    pub fn advance(&mut self) {
        self.position += 1;
    }

    /// Key at the current position
    pub fn key<'a, V>(&self, collection: &'a Collection<V>) -> Option<&'a Key> {
        collection.keys.get(self.position)
    }

    /// Whether the current position resolves to a live entry
    pub fn is_valid<V>(&self, collection: &Collection<V>) -> bool {
        self.key(collection)
            .is_some_and(|key| collection.items.contains_key(key))
    }

    /// Entry at the current position, `None` once exhausted
    pub fn current<'a, V>(&self, collection: &'a Collection<V>) -> Option<(&'a Key, &'a V)> {
        let key = self.key(collection)?;
        collection.items.get(key).map(|value| (key, value))
    }
}

/// Iterator over a [`Collection`], driven by a [`Cursor`]
#[derive(Debug, Clone)]
pub struct Iter<'a, V> {
    collection: &'a Collection<V>,
    cursor: Cursor,
}

impl<V> Iter<'_, V> {
    /// Restart from the first element
    pub fn rewind(&mut self) {
        self.cursor.rewind();
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a Key, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.cursor.current(self.collection)?;
        self.cursor.advance();
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .collection
            .keys
            .len()
            .saturating_sub(self.cursor.position());
        (0, Some(remaining))
    }
}

impl<V: Serialize> Serialize for Collection<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_list() {
            let mut seq = serializer.serialize_seq(Some(self.count()))?;
            for value in self.values() {
                seq.serialize_element(value)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.count()))?;
            for (key, value) in self {
                map.serialize_entry(key, value)?;
            }
            map.end()
        }
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Collection<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CollectionVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for CollectionVisitor<V> {
            type Value = Collection<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a sequence or a map")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut collection = Collection::new();
                let mut position = 0usize;
                while let Some(value) = seq.next_element()? {
                    collection.set(position, value);
                    position += 1;
                }
                Ok(collection)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut collection = Collection::new();
                while let Some((key, value)) = map.next_entry::<Key, V>()? {
                    collection.set(key, value);
                }
                Ok(collection)
            }
        }

        deserializer.deserialize_any(CollectionVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_collection() {
        let collection: Collection<String> = Collection::new();
        assert_eq!(collection.count(), 0);
        assert!(collection.is_empty());
        assert!(collection.iter().next().is_none());

        let cursor = collection.cursor();
        assert!(!cursor.is_valid(&collection));
        assert!(cursor.current(&collection).is_none());
    }

    #[test]
    fn test_push_assigns_positions_in_order() {
        let mut collection = Collection::new();
        for value in ["a", "b", "c", "d"] {
            collection.push(value).unwrap();
        }

        let keys: Vec<_> = collection.keys().to_vec();
        assert_eq!(
            keys,
            vec![Key::Index(0), Key::Index(1), Key::Index(2), Key::Index(3)]
        );

        let values: Vec<_> = collection.values().copied().collect();
        assert_eq!(values, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_get_absent_key() {
        let mut collection = Collection::new();
        collection.set("present", 1);

        assert!(collection.get("missing").is_none());
        assert!(!collection.has("missing"));
        assert!(collection.get(7).is_none());
        assert_eq!(collection.get("present"), Some(&1));
    }

    #[test]
    fn test_has_counts_falsy_values() {
        let mut collection: Collection<Option<i32>> = Collection::new();
        collection.set("none", None);
        collection.set("zero", Some(0));

        assert!(collection.has("none"));
        assert!(collection.has("zero"));
        assert_eq!(collection.get("none"), Some(&None));
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut collection = Collection::new();
        collection.set("a", 1);
        collection.set("b", 2);
        collection.set("c", 3);

        assert_eq!(collection.set("b", 20), Some(2));
        let entries: Vec<_> = collection.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        assert_eq!(
            entries,
            vec![("a".to_string(), 1), ("b".to_string(), 20), ("c".to_string(), 3)]
        );
    }

    #[test]
    fn test_set_unset_set_leaves_single_key() {
        let mut collection = Collection::new();
        collection.set("x", 1);
        collection.set("y", 2);
        assert_eq!(collection.unset("x"), Some(1));
        collection.set("x", 3);

        assert_eq!(collection.keys(), &[Key::from("y"), Key::from("x")]);
        assert_eq!(collection.count(), 2);
        assert_eq!(collection.get("x"), Some(&3));
    }

    #[test]
    fn test_unset_absent_is_noop() {
        let mut collection = Collection::from(vec![1, 2]);
        assert!(collection.unset("missing").is_none());
        assert!(collection.unset(5).is_none());
        assert_eq!(collection.count(), 2);
    }

    #[test]
    fn test_unset_does_not_renumber() {
        let mut collection = Collection::from(vec!["a", "b", "c"]);
        collection.unset(1);

        assert_eq!(collection.keys(), &[Key::Index(0), Key::Index(2)]);
        assert_eq!(collection.get(2), Some(&"c"));

        // Freed positions are not reused
        collection.unset(2);
        assert_eq!(collection.push("d").unwrap(), Key::Index(3));
    }

    #[test]
    fn test_push_after_explicit_index() {
        let mut collection = Collection::new();
        collection.set(10, "ten");
        collection.set("name", "named");
        assert_eq!(collection.push("next").unwrap(), Key::Index(11));
    }

    #[test]
    fn test_push_after_max_position_fails() {
        let mut collection = Collection::new();
        collection.set(i64::MAX, "last");
        assert!(collection.push("overflow").is_err());
        assert_eq!(collection.count(), 1);
        assert_eq!(collection.get(i64::MAX), Some(&"last"));

        // A later smaller position does not make room again
        collection.set(3, "three");
        assert!(collection.push("again").is_err());
        assert_eq!(collection.count(), 2);
    }

    #[test]
    fn test_numeric_name_is_positional() {
        let mut collection = Collection::new();
        collection.set(0, 1);
        collection.set("0", 2);
        collection.set(String::from("7"), 3);

        assert_eq!(collection.count(), 2);
        assert_eq!(collection.get(0), Some(&2));
        assert_eq!(collection.get("7"), Some(&3));
        assert_eq!(collection.keys(), &[Key::Index(0), Key::Index(7)]);
        assert_eq!(serde_json::to_string(&collection).unwrap(), r#"{"0":2,"7":3}"#);

        // Non-canonical spellings stay names
        assert_eq!(Key::from("007"), Key::Name("007".into()));
        assert_eq!(Key::from("-0"), Key::Name("-0".into()));
        assert_eq!(Key::from("-3"), Key::Index(-3));
    }

    #[test]
    fn test_numeric_name_round_trip() {
        let mut collection = Collection::new();
        collection.set("42", 1);
        collection.set("name", 2);

        let restored: Collection<i32> = Collection::from_value(collection.to_value().unwrap()).unwrap();
        assert_eq!(restored, collection);
        assert_eq!(restored.keys(), &[Key::Index(42), Key::from("name")]);
    }

    #[test]
    fn test_count_matches_has_over_random_operations() {
        let mut collection = Collection::new();
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let universe: Vec<Key> = (0..8)
            .map(Key::from)
            .chain(["a", "b", "c", "d"].into_iter().map(Key::from))
            .collect();

        for step in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let key = universe[(seed % universe.len() as u64) as usize].clone();
            match seed % 3 {
                0 => {
                    collection.unset(&key);
                }
                1 => {
                    collection.push(step).unwrap();
                }
                _ => {
                    collection.set(&key, step);
                }
            }

            let live = collection
                .keys()
                .iter()
                .filter(|k| collection.has(*k))
                .count();
            let mut distinct = collection.keys().to_vec();
            distinct.sort();
            distinct.dedup();

            assert_eq!(collection.count(), live);
            assert_eq!(collection.keys().len(), collection.count());
            assert_eq!(distinct.len(), collection.count());
        }
    }

    #[test]
    fn test_cursor_rewind_after_full_iteration() {
        let collection = Collection::from(vec!["first", "second"]);
        let mut cursor = collection.cursor();

        while cursor.is_valid(&collection) {
            cursor.advance();
        }
        assert!(cursor.current(&collection).is_none());

        cursor.rewind();
        assert_eq!(
            cursor.current(&collection),
            Some((&Key::Index(0), &"first"))
        );
    }

    #[test]
    fn test_iter_rewind() {
        let collection = Collection::from(vec![1, 2, 3]);
        let mut iter = collection.iter();
        assert_eq!(iter.by_ref().count(), 3);
        assert!(iter.next().is_none());

        iter.rewind();
        assert_eq!(iter.next(), Some((&Key::Index(0), &1)));
    }

    #[test]
    fn test_cursor_past_shrunk_collection_reports_exhaustion() {
        let mut collection = Collection::from(vec!["a", "b", "c"]);
        let mut cursor = collection.cursor();
        cursor.advance();
        cursor.advance();
        assert!(cursor.is_valid(&collection));

        collection.unset(2);
        assert!(!cursor.is_valid(&collection));
        assert!(cursor.current(&collection).is_none());
    }

    #[test]
    fn test_list_serializes_as_array() {
        let collection = Collection::from(vec!["a", "b"]);
        let json = serde_json::to_string(&collection).unwrap();
        assert_eq!(json, r#"["a","b"]"#);

        let empty: Collection<i32> = Collection::new();
        assert_eq!(serde_json::to_string(&empty).unwrap(), "[]");
    }

    #[test]
    fn test_map_serializes_in_key_order() {
        let mut collection = Collection::new();
        collection.set("zeta", 1);
        collection.set(0, 2);
        collection.set("alpha", 3);

        let json = serde_json::to_string(&collection).unwrap();
        assert_eq!(json, r#"{"zeta":1,"0":2,"alpha":3}"#);
    }

    #[test]
    fn test_sparse_positions_serialize_as_map() {
        let mut collection = Collection::from(vec![1, 2, 3]);
        collection.unset(0);
        let json = serde_json::to_string(&collection).unwrap();
        assert_eq!(json, r#"{"1":2,"2":3}"#);
    }

    #[test]
    fn test_value_round_trip_preserves_order() {
        let mut collection = Collection::new();
        collection.set("b", 1);
        collection.set(0, 2);
        collection.set("a", 3);
        collection.set(5, 4);

        let value = collection.to_value().unwrap();
        let restored: Collection<i32> = Collection::from_value(value).unwrap();

        assert_eq!(restored, collection);
        assert_eq!(
            restored.keys(),
            &[Key::from("b"), Key::Index(0), Key::from("a"), Key::Index(5)]
        );
    }

    #[test]
    fn test_nested_collections() {
        let mut inner = Collection::new();
        inner.set("size", 10);

        let mut outer = Collection::new();
        outer.set("photos", inner);

        let json = serde_json::to_string(&outer).unwrap();
        assert_eq!(json, r#"{"photos":{"size":10}}"#);

        let restored: Collection<Collection<i32>> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.get("photos").and_then(|c| c.get("size")), Some(&10));
    }

    #[test]
    fn test_key_parse() {
        assert_eq!(Key::parse("0"), Key::Index(0));
        assert_eq!(Key::parse("42"), Key::Index(42));
        assert_eq!(Key::parse("-7"), Key::Index(-7));
        assert_eq!(Key::parse("007"), Key::from("007"));
        assert_eq!(Key::parse("-0"), Key::from("-0"));
        assert_eq!(Key::parse(""), Key::from(""));
        assert_eq!(Key::parse("name"), Key::from("name"));
        assert_eq!(
            Key::parse("99999999999999999999"),
            Key::from("99999999999999999999")
        );
    }

    #[test]
    fn test_from_iterator() {
        let collection: Collection<u64> = vec![("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(collection.count(), 2);
        assert_eq!(collection.keys()[0].as_name(), Some("a"));
    }
}
