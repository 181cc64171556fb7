//! Lazily-generated identifiers for orders and sequences.
//!
//! Orders are constructed fresh on every scan pass; most are discarded
//! before ever being dispatched. Assigning an id only eagerly would waste
//! a timestamp+RNG draw on paths that never execute, so the id is
//! generated on first read and cached.

use std::cell::Cell;
use std::fmt;
use std::sync::OnceLock;
use std::time::SystemTime;

fn next_local_counter() -> u32 {
    thread_local! {
        static COUNTER: Cell<u32> = const { Cell::new(0) };
    }
    COUNTER.with(|c| {
        let val = c.get();
        c.set(val.wrapping_add(1));
        val
    })
}

fn generate_u128() -> u128 {
    use rand::Rng;

    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let random_part: u32 = rand::thread_rng().gen();
    let counter = next_local_counter();

    ((timestamp as u128) << 64) | ((random_part as u128) << 32) | (counter as u128)
}

/// Unique identifier for an order, lazily assigned on first read.
pub struct OrderId(OnceLock<u128>);

impl OrderId {
    /// Create a handle whose value has not been generated yet.
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Return the id, generating it on first call.
    pub fn get(&self) -> u128 {
        *self.0.get_or_init(generate_u128)
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for OrderId {
    fn clone(&self) -> Self {
        let cell = OnceLock::new();
        if let Some(v) = self.0.get() {
            let _ = cell.set(*v);
        }
        Self(cell)
    }
}

impl fmt::Debug for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrderId({:032x})", self.get())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.get())
    }
}

impl PartialEq for OrderId {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}
impl Eq for OrderId {}

impl std::hash::Hash for OrderId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.get().hash(state);
    }
}

/// Unique identifier for an admitted sequence (an in-flight cycle execution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequenceId(u128);

impl SequenceId {
    pub fn generate() -> Self {
        Self(generate_u128())
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_lazy_generation() {
        let id = OrderId::new();
        assert!(id.0.get().is_none());
        let a = id.get();
        let b = id.get();
        assert_eq!(a, b, "repeated reads must return the same value");
    }

    #[test]
    fn test_order_id_uniqueness() {
        let a = OrderId::new().get();
        let b = OrderId::new().get();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sequence_id_uniqueness() {
        let a = SequenceId::generate();
        let b = SequenceId::generate();
        assert_ne!(a, b);
    }
}
