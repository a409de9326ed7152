//! Index construction
//!
//! Indices are derived views rebuilt from storage content on every access.
//! One pass over the input, keyed by the caller's key function.

use indexmap::IndexMap;

/// Builds a one-entry-per-key index.
///
/// Duplicate keys are not an error: the last item wins, while the key keeps
/// the position of its first appearance.
pub fn build_index<T, I, F>(items: I, mut key: F) -> IndexMap<String, T>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> String,
{
    let items = items.into_iter();
    let mut index = IndexMap::with_capacity(items.size_hint().0);
    for item in items {
        index.insert(key(&item), item);
    }
    index
}

/// Groups items into per-key buckets.
///
/// An item yielding several keys is appended to each of their buckets.
/// Within a bucket, items keep their input order.
pub fn group_index<T, I, F, K>(items: I, mut keys: F) -> IndexMap<String, Vec<T>>
where
    T: Clone,
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> K,
    K: IntoIterator<Item = String>,
{
    let mut index: IndexMap<String, Vec<T>> = IndexMap::new();
    for item in items {
        for key in keys(&item) {
            index.entry(key).or_default().push(item.clone());
        }
    }
    index
}

/// Picks the entries of `index` named by `keys`, in key order.
///
/// Keys with no entry are dropped silently.
pub fn pick_keys<K, T>(index: &IndexMap<String, T>, keys: &[K]) -> IndexMap<String, T>
where
    K: AsRef<str>,
    T: Clone,
{
    keys.iter()
        .filter_map(|key| {
            index
                .get_key_value(key.as_ref())
                .map(|(key, item)| (key.clone(), item.clone()))
        })
        .collect()
}
