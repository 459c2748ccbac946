//! Process-wide fresh-name generation.
//!
//! Anonymous index variables and tensors draw their display names from a
//! global per-prefix counter, so `IndexVar::new()` yields `i0`, `i1`, …
//! across the whole process. Names are advisory: identity is always the
//! underlying handle, and collisions with user-chosen names are harmless.

use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::Mutex;

static COUNTERS: OnceLock<Mutex<HashMap<char, u64>>> = OnceLock::new();

/// Returns a fresh name with the given prefix, e.g. `i0`, `i1`, `A7`.
///
/// The counter behind each prefix is process-wide and increments atomically,
/// so concurrent callers never observe the same name twice.
pub fn fresh_name(prefix: char) -> String {
    let counters = COUNTERS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut counters = counters.lock();
    let counter = counters.entry(prefix).or_insert(0);
    let name = format!("{}{}", prefix, counter);
    *counter += 1;
    name
}
