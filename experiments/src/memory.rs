use std::{
    alloc::{GlobalAlloc, Layout, System},
    sync::atomic::{AtomicUsize, Ordering},
};

static CURRENT: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);

/// Global allocator counting live and peak heap bytes.
///
/// Install it in a binary to get memory figures from the trial runner:
/// ```ignore
/// #[global_allocator]
/// static ALLOC: experiments::TrackingAllocator = experiments::TrackingAllocator;
/// ```
/// Without it every trial reports a peak of 0 bytes.
pub struct TrackingAllocator;

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            add(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            add(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        CURRENT.fetch_sub(layout.size(), Ordering::Relaxed);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            if new_size > layout.size() {
                add(new_size - layout.size());
            } else {
                CURRENT.fetch_sub(layout.size() - new_size, Ordering::Relaxed);
            }
        }
        new_ptr
    }
}

#[inline(always)]
fn add(size: usize) {
    let now = CURRENT.fetch_add(size, Ordering::Relaxed) + size;
    PEAK.fetch_max(now, Ordering::Relaxed);
}

/// Live heap bytes, 0 unless [`TrackingAllocator`] is installed
#[inline(always)]
pub fn current_bytes() -> usize {
    CURRENT.load(Ordering::Relaxed)
}

/// Measures the peak heap growth over a section of code
#[derive(Debug, Clone, Copy)]
pub struct MemoryProbe {
    baseline: usize,
}

impl MemoryProbe {
    /// Reset the peak to the current level and remember it as the baseline
    pub fn start() -> Self {
        let baseline = CURRENT.load(Ordering::Relaxed);
        PEAK.store(baseline, Ordering::Relaxed);
        Self { baseline }
    }

    /// Peak bytes above the baseline since [`MemoryProbe::start`]
    pub fn peak(&self) -> usize {
        PEAK.load(Ordering::Relaxed).saturating_sub(self.baseline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_sees_allocation() {
        let probe = MemoryProbe::start();
        let v: Vec<u8> = vec![1; 1 << 20];
        assert_eq!(v.len(), 1 << 20);
        // other test threads allocate and free concurrently
        assert!(probe.peak() >= 1 << 19);
    }
}
