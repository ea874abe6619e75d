//! Document shapes for the four resources.
//!
//! Each resource is one whole JSON document. The structs here mirror the
//! on-disk layout exactly, including the resource-specific payload key of the
//! snapshot documents (`players` / `matches`).

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// One user turn and the assistant's reply. Never modified once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatExchange {
    pub user_id: String,
    pub timestamp: String,
    pub user_message: String,
    pub assistant_response: String,
}

/// Append-only transcript. Order on disk is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptDocument {
    pub chats: Vec<ChatExchange>,
}

pub type UserPreferences = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceDocument {
    pub theme: String,
    pub use_ai: bool,
    #[serde(default, deserialize_with = "favorites_map")]
    pub favorites: BTreeMap<String, UserPreferences>,
}

pub const DEFAULT_THEME: &str = "light";

impl Default for PreferenceDocument {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            use_ai: true,
            favorites: BTreeMap::new(),
        }
    }
}

impl PreferenceDocument {
    pub fn lookup(&self, user_id: &str, name: &str) -> Option<&Value> {
        self.favorites.get(user_id).and_then(|prefs| prefs.get(name))
    }
}

/// Older files were seeded with `"favorites": []`. An empty array is read as
/// "no users yet"; anything else that is not a mapping is corrupt.
fn favorites_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, UserPreferences>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(BTreeMap::new()),
        Value::Array(items) if items.is_empty() => Ok(BTreeMap::new()),
        Value::Array(_) => Err(de::Error::custom(
            "favorites must be a mapping of user id to preferences",
        )),
        other => serde_json::from_value(other).map_err(de::Error::custom),
    }
}

/// A cached domain resource: players or matches.
pub trait SnapshotKind: Send + Sync + 'static {
    /// Key the payload sequence is stored under.
    const PAYLOAD_KEY: &'static str;
    /// File name below the storage root.
    const FILE_NAME: &'static str;
    type Item: Serialize + DeserializeOwned + Clone + Send + Sync;
}

#[derive(Debug, Clone, Copy)]
pub struct Players;

impl SnapshotKind for Players {
    const PAYLOAD_KEY: &'static str = "players";
    const FILE_NAME: &'static str = "players_data.json";
    type Item = Value;
}

#[derive(Debug, Clone, Copy)]
pub struct Matches;

impl SnapshotKind for Matches {
    const PAYLOAD_KEY: &'static str = "matches";
    const FILE_NAME: &'static str = "match_data.json";
    type Item = Value;
}

/// Fully replaced on every save; never merged.
///
/// `last_updated` is `None` only when the field is absent from the file. A
/// freshly initialized document carries an empty string, which is present but
/// unparseable and therefore still stale.
pub struct SnapshotDocument<K: SnapshotKind> {
    pub last_updated: Option<String>,
    pub payload: Vec<K::Item>,
    kind: PhantomData<K>,
}

impl<K: SnapshotKind> SnapshotDocument<K> {
    pub fn new(last_updated: impl Into<String>, payload: Vec<K::Item>) -> Self {
        Self {
            last_updated: Some(last_updated.into()),
            payload,
            kind: PhantomData,
        }
    }
}

impl<K: SnapshotKind> Default for SnapshotDocument<K> {
    fn default() -> Self {
        Self::new("", Vec::new())
    }
}

impl<K: SnapshotKind> Clone for SnapshotDocument<K> {
    fn clone(&self) -> Self {
        Self {
            last_updated: self.last_updated.clone(),
            payload: self.payload.clone(),
            kind: PhantomData,
        }
    }
}

impl<K: SnapshotKind> fmt::Debug for SnapshotDocument<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotDocument")
            .field("kind", &K::PAYLOAD_KEY)
            .field("last_updated", &self.last_updated)
            .field("items", &self.payload.len())
            .finish()
    }
}

impl<K: SnapshotKind> Serialize for SnapshotDocument<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.last_updated.is_some() { 2 } else { 1 };
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(last_updated) = &self.last_updated {
            map.serialize_entry("last_updated", last_updated)?;
        }
        map.serialize_entry(K::PAYLOAD_KEY, &self.payload)?;
        map.end()
    }
}

impl<'de, K: SnapshotKind> Deserialize<'de> for SnapshotDocument<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;

        let last_updated = match fields.remove("last_updated") {
            None => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                return Err(de::Error::custom(format!(
                    "last_updated must be a string, got {}",
                    other
                )))
            }
        };

        let payload = match fields.remove(K::PAYLOAD_KEY) {
            Some(raw) => serde_json::from_value(raw).map_err(de::Error::custom)?,
            None => return Err(de::Error::missing_field(K::PAYLOAD_KEY)),
        };

        Ok(Self {
            last_updated,
            payload,
            kind: PhantomData,
        })
    }
}
