//! Allocation accounting for heap snapshots.
//!
//! With the `alloc-tracking` feature the binary installs `TrackingAllocator`
//! as the `#[global_allocator]`, and `prof heap` reports live bytes and
//! allocation counts. Without it the counters stay at zero and the snapshot
//! says so.

#[cfg(feature = "alloc-tracking")]
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static LIVE_BYTES: AtomicU64 = AtomicU64::new(0);
static ALLOCATIONS: AtomicU64 = AtomicU64::new(0);
static DEALLOCATIONS: AtomicU64 = AtomicU64::new(0);

/// `System` allocator wrapper that counts what passes through it.
#[cfg(feature = "alloc-tracking")]
pub struct TrackingAllocator;

#[cfg(feature = "alloc-tracking")]
unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            LIVE_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
            ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        LIVE_BYTES.fetch_sub(layout.size() as u64, Ordering::Relaxed);
        DEALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            let old_size = layout.size() as u64;
            let new_size = new_size as u64;
            if new_size >= old_size {
                LIVE_BYTES.fetch_add(new_size - old_size, Ordering::Relaxed);
            } else {
                LIVE_BYTES.fetch_sub(old_size - new_size, Ordering::Relaxed);
            }
        }
        new_ptr
    }
}

/// Counters as seen by a heap snapshot.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AllocationStats {
    /// False when no tracking allocator is installed.
    pub tracked: bool,
    pub live_bytes: u64,
    pub allocations: u64,
    pub deallocations: u64,
}

pub fn allocation_stats() -> AllocationStats {
    let allocations = ALLOCATIONS.load(Ordering::Relaxed);
    AllocationStats {
        tracked: allocations > 0,
        live_bytes: LIVE_BYTES.load(Ordering::Relaxed),
        allocations,
        deallocations: DEALLOCATIONS.load(Ordering::Relaxed),
    }
}
