//! Random display names for new accounts, e.g. `brave_otter_48213`.

use rand::{seq::SliceRandom, Rng};

const ADJECTIVES: &[&str] = &[
    "brave", "calm", "clever", "curious", "eager", "gentle", "happy", "humble", "jolly", "keen",
    "lively", "lucky", "merry", "nimble", "quiet", "quick", "silly", "sunny", "witty", "zesty",
];

const NAMES: &[&str] = &[
    "ada", "alan", "bruno", "clara", "dora", "elio", "farah", "grace", "hugo", "iris", "jonah",
    "kira", "leon", "mila", "nora", "oscar", "pia", "rosa", "theo", "vera",
];

const ANIMALS: &[&str] = &[
    "badger", "beaver", "crane", "dolphin", "falcon", "ferret", "gecko", "heron", "koala", "lynx",
    "marmot", "narwhal", "otter", "panda", "puffin", "raven", "salmon", "tiger", "walrus", "yak",
];

const COLORS: &[&str] = &[
    "amber", "azure", "beige", "coral", "crimson", "cyan", "ebony", "gold", "indigo", "ivory",
    "jade", "lilac", "magenta", "ochre", "olive", "plum", "ruby", "scarlet", "teal", "violet",
];

const SUFFIX_MIN: u32 = 100;
const SUFFIX_MAX: u32 = 999_999;

/// Two words from two different lists plus a number, lowercased and joined
/// with `_`. Uniqueness is left to the database.
pub fn generate() -> String {
    generate_with(&mut rand::thread_rng())
}

pub fn generate_with<R: Rng>(rng: &mut R) -> String {
    let mut lists = [ADJECTIVES, NAMES, ANIMALS, COLORS];
    lists.shuffle(rng);

    let first = pick(rng, lists[0]);
    let second = pick(rng, lists[1]);
    let suffix = rng.gen_range(SUFFIX_MIN..=SUFFIX_MAX);

    format!("{first}_{second}_{suffix}").to_lowercase()
}

fn pick<'a, R: Rng>(rng: &mut R, words: &[&'a str]) -> &'a str {
    words[rng.gen_range(0..words.len())]
}
