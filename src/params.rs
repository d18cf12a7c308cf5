//! Request parameters.
//!
//! Tumblr endpoints take loosely specified string options (`limit`, `offset`,
//! `type`, `tag`, `before`, the post fields...). `Params` keeps them as an
//! ordered map, so requests and signatures are deterministic, and passes
//! every key through to the API unchanged.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Params(BTreeMap::new())
    }

    /// Sets `key`, replacing any earlier value.
    pub fn set<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.insert(key, value);
        self
    }

    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<String>
    where
        K: Into<String>,
        V: ToString,
    {
        self.0.insert(key.into(), value.to_string())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Number of results to return.
    pub fn limit(self, limit: u32) -> Self {
        self.set("limit", limit)
    }

    /// Result number to start at.
    pub fn offset(self, offset: u32) -> Self {
        self.set("offset", offset)
    }

    /// Only results liked/posted before this unix timestamp.
    pub fn before(self, timestamp: u64) -> Self {
        self.set("before", timestamp)
    }

    /// Post type filter on reads, post type on writes.
    pub fn kind(self, kind: &str) -> Self {
        self.set("type", kind)
    }

    pub fn tag(self, tag: &str) -> Self {
        self.set("tag", tag)
    }

    /// `published`, `draft`, `queue` or `private`.
    pub fn state(self, state: &str) -> Self {
        self.set("state", state)
    }

    /// Comma separated tags of a new or edited post.
    pub fn tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = tags
            .into_iter()
            .map(|t| t.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");

        self.set("tags", joined)
    }

    /// Copy of `self` with every key of `other` laid on top.
    pub fn merged(&self, other: &Params) -> Params {
        let mut out = self.clone();
        out.0
            .extend(other.iter().map(|(k, v)| (k.clone(), v.clone())));
        out
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Params
where
    K: Into<String>,
    V: ToString,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl serde::Serialize for Params {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter())
    }
}

/// Square avatar sizes, in pixels, that Tumblr serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AvatarSize {
    Px16,
    Px24,
    Px30,
    Px40,
    Px48,
    Px64,
    Px96,
    Px128,
    Px512,
}

impl AvatarSize {
    pub const ALL: [AvatarSize; 9] = [
        AvatarSize::Px16,
        AvatarSize::Px24,
        AvatarSize::Px30,
        AvatarSize::Px40,
        AvatarSize::Px48,
        AvatarSize::Px64,
        AvatarSize::Px96,
        AvatarSize::Px128,
        AvatarSize::Px512,
    ];

    pub const fn pixels(self) -> u16 {
        match self {
            AvatarSize::Px16 => 16,
            AvatarSize::Px24 => 24,
            AvatarSize::Px30 => 30,
            AvatarSize::Px40 => 40,
            AvatarSize::Px48 => 48,
            AvatarSize::Px64 => 64,
            AvatarSize::Px96 => 96,
            AvatarSize::Px128 => 128,
            AvatarSize::Px512 => 512,
        }
    }
}

impl Default for AvatarSize {
    fn default() -> Self {
        AvatarSize::Px64
    }
}

impl TryFrom<u16> for AvatarSize {
    type Error = Error;

    fn try_from(pixels: u16) -> Result<Self> {
        AvatarSize::ALL
            .iter()
            .copied()
            .find(|size| size.pixels() == pixels)
            .ok_or(Error::InvalidAvatarSize(pixels))
    }
}

impl fmt::Display for AvatarSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pixels())
    }
}
