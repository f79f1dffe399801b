/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use std::{fmt, marker::PhantomData};

/// An insertion-ordered map over a vector of pairs. Batch responses key
/// per-item outcomes by client-supplied references, and the reply must
/// list them in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VecMap<K, V> {
    pub(super) k: Vec<K>,
    pub(super) v: Vec<V>,
}

impl<K, V> Default for VecMap<K, V> {
    fn default() -> Self {
        VecMap {
            k: Vec::new(),
            v: Vec::new(),
        }
    }
}

impl<K: PartialEq, V> VecMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        VecMap {
            k: Vec::with_capacity(capacity),
            v: Vec::with_capacity(capacity),
        }
    }

    /// Appends without checking for duplicates.
    pub fn append(&mut self, key: K, value: V) {
        self.k.push(key);
        self.v.push(value);
    }

    pub fn set(&mut self, key: K, value: V) -> bool {
        if let Some(pos) = self.k.iter().position(|k| *k == key) {
            self.v[pos] = value;
            false
        } else {
            self.append(key, value);
            true
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.k
            .iter()
            .position(|k| k == key)
            .map(|pos| &self.v[pos])
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.k
            .iter()
            .position(|k| k == key)
            .map(|pos| &mut self.v[pos])
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.k.iter().any(|k| k == key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let pos = self.k.iter().position(|k| k == key)?;
        self.k.remove(pos);
        Some(self.v.remove(pos))
    }

    pub fn is_empty(&self) -> bool {
        self.k.is_empty()
    }

    pub fn len(&self) -> usize {
        self.k.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.k.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.v.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.k.iter().zip(self.v.iter())
    }
}

impl<K: PartialEq, V> IntoIterator for VecMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::iter::Zip<std::vec::IntoIter<K>, std::vec::IntoIter<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.k.into_iter().zip(self.v)
    }
}

impl<K: PartialEq, V> FromIterator<(K, V)> for VecMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = VecMap::new();
        for (key, value) in iter {
            map.append(key, value);
        }
        map
    }
}

impl<K: Serialize + PartialEq, V: Serialize> Serialize for VecMap<K, V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, K, V> Deserialize<'de> for VecMap<K, V>
where
    K: Deserialize<'de> + PartialEq,
    V: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VecMapVisitor<K, V>(PhantomData<(K, V)>);

        impl<'de, K, V> Visitor<'de> for VecMapVisitor<K, V>
        where
            K: Deserialize<'de> + PartialEq,
            V: Deserialize<'de>,
        {
            type Value = VecMap<K, V>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = VecMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry()? {
                    map.append(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(VecMapVisitor(PhantomData))
    }
}
