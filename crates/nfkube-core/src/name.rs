//! Run names.

use derive_more::Display;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

const ADJECTIVES: &[&str] = &[
    "agile", "amber", "bold", "brave", "bright", "calm", "clever", "cosmic", "crisp", "curious",
    "daring", "eager", "elegant", "fancy", "fierce", "gentle", "golden", "happy", "hidden",
    "jolly", "keen", "lively", "lucid", "mellow", "mighty", "nimble", "noble", "patient",
    "quiet", "rapid", "serene", "shiny", "silent", "stoic", "sunny", "swift", "tender",
    "vivid", "wise", "zealous",
];

const NOUNS: &[&str] = &[
    "albatross", "badger", "beacon", "canyon", "cedar", "comet", "coral", "crane", "delta",
    "ember", "falcon", "fjord", "forest", "glacier", "harbor", "heron", "island", "lagoon",
    "lantern", "meadow", "meteor", "nebula", "orchid", "otter", "pebble", "pioneer", "quasar",
    "raven", "river", "sequoia", "sparrow", "summit", "tundra", "valley", "voyager", "walrus",
    "willow", "yak", "zephyr", "zenith",
];

/// Name of a launch, used for the Kubernetes job and the Nextflow run.
///
/// Generated names have the form `adjective-noun` and are valid DNS-1123
/// labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct RunName(String);

impl RunName {
    /// Generate a random `adjective-noun` name.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("quiet");
        let noun = NOUNS.choose(&mut rng).copied().unwrap_or("river");
        Self(format!("{}-{}", adjective, noun))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RunName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&str> for RunName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}
