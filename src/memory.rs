//! Peak heap usage around a single call.
//!
//! The binary installs [`PeakAlloc`] as its global allocator, which keeps a
//! running total of live bytes and the high-water mark. A [`MemorySampler`]
//! resets the high-water mark when started and reports how far above the
//! starting level it climbed when stopped.
//!
//! With the `dhat-heap` feature the dhat allocator is installed instead and
//! the sampler reads [`dhat::HeapStats`]. dhat never lowers its maximum, so
//! in that mode the figure is the run-wide peak above the starting level.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Live bytes and their high-water mark.
struct Counters {
    current: AtomicUsize,
    peak: AtomicUsize,
}

#[cfg_attr(feature = "dhat-heap", allow(dead_code))]
impl Counters {
    const fn new() -> Counters {
        Counters {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    fn grow(&self, bytes: usize) {
        let now = self.current.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.peak.fetch_max(now, Ordering::Relaxed);
    }

    fn shrink(&self, bytes: usize) {
        self.current.fetch_sub(bytes, Ordering::Relaxed);
    }

    fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    /// Drops the high-water mark to the live level and returns that level.
    fn reset_peak(&self) -> usize {
        let now = self.current();
        self.peak.store(now, Ordering::Relaxed);
        now
    }
}

static COUNTERS: Counters = Counters::new();

pub struct PeakAlloc;

impl PeakAlloc {
    pub const fn new() -> PeakAlloc {
        PeakAlloc
    }
}

impl Default for PeakAlloc {
    fn default() -> Self {
        PeakAlloc::new()
    }
}

unsafe impl GlobalAlloc for PeakAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            COUNTERS.grow(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        COUNTERS.shrink(layout.size());
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            COUNTERS.grow(layout.size());
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            if new_size > layout.size() {
                COUNTERS.grow(new_size - layout.size());
            } else {
                COUNTERS.shrink(layout.size() - new_size);
            }
        }
        new_ptr
    }
}

/// Bytes currently allocated through [`PeakAlloc`].
pub fn current_bytes() -> usize {
    COUNTERS.current()
}

pub struct MemorySampler {
    baseline: usize,
}

impl MemorySampler {
    #[cfg(not(feature = "dhat-heap"))]
    pub fn start() -> MemorySampler {
        MemorySampler {
            baseline: COUNTERS.reset_peak(),
        }
    }

    /// Peak bytes allocated above the level seen at `start`.
    #[cfg(not(feature = "dhat-heap"))]
    pub fn stop(self) -> u64 {
        COUNTERS.peak().saturating_sub(self.baseline) as u64
    }

    #[cfg(feature = "dhat-heap")]
    pub fn start() -> MemorySampler {
        MemorySampler {
            baseline: dhat::HeapStats::get().curr_bytes,
        }
    }

    #[cfg(feature = "dhat-heap")]
    pub fn stop(self) -> u64 {
        dhat::HeapStats::get().max_bytes.saturating_sub(self.baseline) as u64
    }
}

#[cfg(all(test, not(feature = "dhat-heap")))]
mod tests {
    use super::*;

    #[test]
    fn test_it_can_track_the_high_water_mark() {
        let counters = Counters::new();
        counters.grow(100);
        assert_eq!(100, counters.reset_peak());

        counters.grow(4096);
        counters.grow(1024);
        counters.shrink(5120);
        assert_eq!(100, counters.current());
        assert_eq!(5220, counters.peak());

        assert_eq!(100, counters.reset_peak());
        assert_eq!(100, counters.peak());
    }

    #[test]
    fn test_it_can_allocate_through_the_counting_allocator() {
        let alloc = PeakAlloc::new();
        let layout = Layout::from_size_align(256, 8).unwrap();
        unsafe {
            let ptr = alloc.alloc(layout);
            assert!(!ptr.is_null());
            let ptr = alloc.realloc(ptr, layout, 512);
            assert!(!ptr.is_null());
            alloc.dealloc(ptr, Layout::from_size_align(512, 8).unwrap());
        }
    }
}
