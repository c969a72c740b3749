use super::{MemoryStore, StoreEntry};

/// Build a store from literal rows: `(unit, log_prob)` initials,
/// `(unit, pronunciation, log_prob)` emissions, `(prev, next, log_prob)`
/// transitions.
pub(crate) fn store_from(
    initial: &[(&str, f64)],
    emission: &[(&str, &str, f64)],
    transition: &[(&str, &str, f64)],
) -> MemoryStore {
    let entries = initial
        .iter()
        .map(|&(u, p)| StoreEntry::initial(u, p))
        .chain(
            emission
                .iter()
                .map(|&(u, py, p)| StoreEntry::emission(u, py, p)),
        )
        .chain(
            transition
                .iter()
                .map(|&(a, b, p)| StoreEntry::transition(a, b, p)),
        );
    MemoryStore::from_entries(entries).unwrap()
}
