//! Retention caps. Every collection is newest-first, so eviction drops from the tail.

/// Maximum number of upload history items.
pub const HISTORY_LIMIT: usize = 20;
/// Maximum number of face captures kept per person.
pub const PERSON_IMAGE_LIMIT: usize = 20;
/// Maximum number of queued unrecognized faces.
pub const UNRECOGNIZED_LIMIT: usize = 50;

/// Keep the first `max_len` items of a newest-first sequence.
pub fn cap_list<T>(mut items: Vec<T>, max_len: usize) -> Vec<T> {
    items.truncate(max_len);
    items
}

/// Insert `item` at the head and evict whatever falls past `max_len`.
pub fn prepend_capped<T>(items: &mut Vec<T>, item: T, max_len: usize) {
    items.insert(0, item);
    items.truncate(max_len);
}
