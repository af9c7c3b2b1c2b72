//! Random string generation.
//!
//! All helpers draw from `rand::thread_rng`, which is fast but **not** meant
//! for secrets, tokens or anything security sensitive.

use rand::Rng;

const HEX_DIGITS: &[u8] = b"0123456789abcdef";
const ALPHANUMERIC_UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MIXED_WITH_SPACE: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789 ";

/// Returns exactly `length` lowercase hex digits, uniform over all 16^length values.
///
/// ```
/// let id = utilkit::random::random_hex(8);
/// assert_eq!(id.len(), 8);
/// assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn random_hex(length: usize) -> String {
    random_from_alphabet(HEX_DIGITS, length)
}

/// Returns `length` characters from `A-Z` and `0-9`.
#[must_use]
pub fn random_alphanumeric(length: usize) -> String {
    random_from_alphabet(ALPHANUMERIC_UPPER, length)
}

/// Returns `length` characters from `A-Z`, `a-z`, `0-9` and space.
#[must_use]
pub fn random_string(length: usize) -> String {
    random_from_alphabet(MIXED_WITH_SPACE, length)
}

/// Returns a [`random_string`] whose length is uniform in `[min_length, max_length]`.
///
/// Bounds given in the wrong order are swapped.
#[must_use]
pub fn random_string_in_range(min_length: usize, max_length: usize) -> String {
    let (low, high) = if min_length <= max_length {
        (min_length, max_length)
    } else {
        (max_length, min_length)
    };
    let length = rand::thread_rng().gen_range(low..=high);
    random_string(length)
}

/// Returns a uniform integer in `[0, n)`.
///
/// # Panics
///
/// Panics if `n` is zero.
#[must_use]
pub fn insecure_rand_below(n: usize) -> usize {
    rand::thread_rng().gen_range(0..n)
}

fn random_from_alphabet(alphabet: &[u8], length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
        .collect()
}
