//! Versioned values: a raw value tagged with the causal context it was written in.

use crate::clock::VectorClock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Causal knowledge a value was written with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub clock: VectorClock,
}

impl Context {
    #[must_use]
    pub fn new(clock: VectorClock) -> Self {
        Self { clock }
    }

    /// A context that causally follows every entry in `entries`.
    ///
    /// Clients use this to turn a multi-version read into the context of a
    /// write that supersedes all of them.
    #[must_use]
    pub fn combined<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a ObjectEntry>,
    {
        let mut clock = VectorClock::new();
        clock.combine(entries.into_iter().map(|e| &e.context.clock));
        Self { clock }
    }
}

/// A single stored version. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub context: Context,
    #[serde(with = "base64_value")]
    pub value: Vec<u8>,
}

impl ObjectEntry {
    #[must_use]
    pub fn new(context: Context, value: impl Into<Vec<u8>>) -> Self {
        Self {
            context,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn clock(&self) -> &VectorClock {
        &self.context.clock
    }
}

impl fmt::Display for ObjectEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})",
            self.context.clock,
            String::from_utf8_lossy(&self.value)
        )
    }
}

/// All live versions of one key. Pairwise concurrent at rest.
pub type VersionSet = Vec<ObjectEntry>;

/// A full copy of a replica's store, as exchanged by gossip.
pub type StoreSnapshot = HashMap<String, VersionSet>;

pub(crate) mod base64_value {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
