//! Record id generation: `<unix millis>-<9 random base36 chars>`.

use rand::Rng;
use time::OffsetDateTime;

const SUFFIX_LEN: usize = 9;
const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a new record id.
///
/// The millisecond component orders ids roughly by creation time; the random
/// suffix separates ids minted within the same millisecond.
pub fn generate() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect();
    format!("{millis}-{suffix}")
}

/// Generate an id for which `taken` returns false.
pub fn generate_unique(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = generate();
        if !taken(&id) {
            return id;
        }
    }
}
