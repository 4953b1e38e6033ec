use std::sync::atomic::{AtomicU64, Ordering};

use agora_types::PostId;

/// Monotonic post identifier allocator.
///
/// Holds the next identifier to issue. Each [`IdAllocator::next`] is a single
/// `fetch_add`, so concurrent callers always receive distinct identifiers in
/// issuance order.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Start issuing from `first`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Issue the next identifier.
    pub fn next(&self) -> PostId {
        PostId(self.next.fetch_add(1, Ordering::SeqCst))
    }

    /// The identifier the next call to [`IdAllocator::next`] would return.
    pub fn peek(&self) -> PostId {
        PostId(self.next.load(Ordering::SeqCst))
    }

    /// Make sure identifiers below `floor` are never issued.
    pub fn advance_to(&self, floor: u64) {
        self.next.fetch_max(floor, Ordering::SeqCst);
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::starting_at(0)
    }
}
