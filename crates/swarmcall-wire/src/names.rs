//! Human-readable node names for nodes started without an explicit identity.

use rand::seq::SliceRandom;

const ADJECTIVES: &[&str] = &[
    "amber", "brave", "calm", "dusty", "eager", "fuzzy", "gentle", "hollow", "icy", "jolly",
    "keen", "lucky", "mellow", "nimble", "odd", "plucky", "quiet", "rusty", "swift", "tidy",
    "upbeat", "vivid", "wiry", "young", "zesty",
];

const NOUNS: &[&str] = &[
    "anchor", "badger", "comet", "dingo", "ember", "falcon", "gecko", "heron", "iguana", "jackal",
    "kestrel", "lemur", "magpie", "newt", "otter", "panda", "quokka", "raven", "sparrow", "tapir",
    "urchin", "vole", "walrus", "yak", "zebra",
];

/// A random `adjective-noun` name such as `plucky-otter`.
pub fn random_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("nameless");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("node");
    format!("{adjective}-{noun}")
}
