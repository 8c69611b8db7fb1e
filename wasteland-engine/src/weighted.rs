//! Ordered weight tables and the single-draw weighted pick shared by every engine.
//!
//! Tables keep insertion order so a seeded RNG always walks the cumulative sum
//! in the same sequence. JSON objects deserialize in document order for the
//! same reason.

use std::fmt;
use std::marker::PhantomData;

use rand::Rng;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered `key -> weight` table. Adding to an existing key accumulates.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable<K> {
    entries: Vec<(K, f64)>,
}

impl<K> Default for WeightTable<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

fn usable_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

impl<K: PartialEq + Clone> WeightTable<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(key, weight)` pairs, accumulating repeated keys.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (K, f64)>) -> Self {
        let mut table = Self::new();
        for (key, weight) in pairs {
            table.add(key, weight);
        }
        table
    }

    /// Add `weight` to `key`, inserting it at the end when absent.
    pub fn add(&mut self, key: K, weight: f64) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 += weight;
        } else {
            self.entries.push((key, weight));
        }
    }

    /// Multiply the weight of `key` in place; absent keys are left alone.
    pub fn scale(&mut self, key: &K, factor: f64) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 *= factor;
        }
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, weight)| *weight)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.entries.iter().map(|(key, weight)| (key, *weight))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// Sum of the strictly positive, finite weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| usable_weight(*w)).sum()
    }

    /// Pick one key proportionally to its weight using a single uniform draw.
    ///
    /// Zero, negative, and non-finite weights are never selected. When no
    /// weight is usable the pick falls back to a uniform choice over the keys.
    /// Returns `None` only for an empty table.
    pub fn pick<R>(&self, rng: &mut R) -> Option<K>
    where
        R: Rng + ?Sized,
    {
        if self.entries.is_empty() {
            return None;
        }
        let total = self.total();
        if total <= 0.0 {
            log::warn!(
                "weight table with {} entries has no positive weight; picking uniformly",
                self.entries.len()
            );
            let idx = rng.gen_range(0..self.entries.len());
            return self.entries.get(idx).map(|(key, _)| key.clone());
        }

        let mut remaining = rng.r#gen::<f64>() * total;
        let mut last_positive = None;
        for (key, weight) in &self.entries {
            let weight = usable_weight(*weight);
            if weight <= 0.0 {
                continue;
            }
            if remaining < weight {
                return Some(key.clone());
            }
            remaining -= weight;
            last_positive = Some(key);
        }
        last_positive.cloned()
    }
}

impl<K: Serialize> Serialize for WeightTable<K> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, weight) in &self.entries {
            map.serialize_entry(key, weight)?;
        }
        map.end()
    }
}

struct WeightTableVisitor<K> {
    marker: PhantomData<K>,
}

impl<'de, K> Visitor<'de> for WeightTableVisitor<K>
where
    K: Deserialize<'de> + PartialEq + Clone,
{
    type Value = WeightTable<K>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of keys to numeric weights")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut table = WeightTable::new();
        while let Some((key, weight)) = access.next_entry::<K, f64>()? {
            table.add(key, weight);
        }
        Ok(table)
    }
}

impl<'de, K> Deserialize<'de> for WeightTable<K>
where
    K: Deserialize<'de> + PartialEq + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(WeightTableVisitor {
            marker: PhantomData,
        })
    }
}

/// Uniformly pick one element of a slice.
pub fn pick_uniform<'a, T, R>(items: &'a [T], rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    if items.is_empty() {
        return None;
    }
    items.get(rng.gen_range(0..items.len()))
}
