//! Memory accounting through the pluggable allocator.

use nvf::{
    render, AllocError, Allocator, Document, ErrorCode, RenderOptions, TrackingAllocator,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const CONFIG: &str = "name \"service\"\n\
                      key bx00112233445566778899\n\
                      limits { conn 100 rate 2.5 tags [\"a\" 1 \"b\" [1 2 3]] }\n\
                      hosts [\"h1\" 1 \"h2\" 2 \"h3\" 3 \"h4\" 4 \"h5\" 5 \"h6\"]";

fn tracked() -> (Arc<TrackingAllocator>, Document) {
    let tracker = Arc::new(TrackingAllocator::new());
    let doc = Document::with_allocator(tracker.clone());
    (tracker, doc)
}

#[test]
fn test_deinit_releases_everything() {
    let (tracker, mut doc) = tracked();
    doc.parse(CONFIG).unwrap();
    assert!(tracker.live_bytes() > 0);
    assert!(tracker.allocation_count() > 0);

    doc.deinit().unwrap();
    assert_eq!(tracker.live_bytes(), 0);
    assert!(!doc.is_initialized());
}

#[test]
fn test_operations_after_deinit() {
    let (_tracker, mut doc) = tracked();
    doc.parse("x 1").unwrap();
    doc.deinit().unwrap();

    assert_eq!(doc.parse("y 2").unwrap_err().code(), ErrorCode::NotInitialized);
    assert_eq!(doc.get_int(&["x"]).unwrap_err().code(), ErrorCode::NotInitialized);
    assert_eq!(
        render(&doc, &RenderOptions::default()).unwrap_err().code(),
        ErrorCode::NotInitialized
    );
    assert_eq!(doc.deinit().unwrap_err().code(), ErrorCode::NotInitialized);
}

#[test]
fn test_refused_render_leaves_accounting_unchanged() {
    let (tracker, mut doc) = tracked();
    doc.parse(CONFIG).unwrap();
    let live = tracker.live_bytes();

    tracker.set_limit(live + 80);
    let err = render(&doc, &RenderOptions::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadAlloc);
    assert_eq!(tracker.live_bytes(), live);

    tracker.set_limit(usize::MAX);
    let out = render(&doc, &RenderOptions::default()).unwrap();
    assert!(tracker.live_bytes() > live);
    drop(out);
    assert_eq!(tracker.live_bytes(), live);
}

#[test]
fn test_getter_buffers_are_charged() {
    let (tracker, mut doc) = tracked();
    doc.parse("s \"0123456789\" b bx0102").unwrap();
    let live = tracker.live_bytes();

    let s = doc.get_str(&["s"]).unwrap();
    assert_eq!(s.len(), 10);
    assert_eq!(tracker.live_bytes(), live + 10);

    let b = doc.get_blob(&["b"]).unwrap();
    assert_eq!(tracker.live_bytes(), live + 12);

    drop(s);
    let bytes = b.into_vec();
    assert_eq!(bytes, vec![1, 2]);
    assert_eq!(tracker.live_bytes(), live);
}

#[test]
fn test_refused_getter_allocation() {
    let (tracker, mut doc) = tracked();
    doc.parse("s \"abcdef\"").unwrap();
    tracker.set_limit(tracker.live_bytes());
    let err = doc.get_str(&["s"]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadAlloc);
}

#[test]
fn test_parse_under_tight_limit_fails_cleanly() {
    for limit in [0, 16, 64, 256, 512] {
        let tracker = Arc::new(TrackingAllocator::with_limit(limit));
        let mut doc = Document::with_allocator(tracker.clone());
        if let Err(err) = doc.parse(CONFIG) {
            assert_eq!(err.code(), ErrorCode::BadAlloc, "limit {limit}");
        }
        assert!(tracker.live_bytes() <= limit);
        drop(doc);
        assert_eq!(tracker.live_bytes(), 0, "limit {limit}");
    }
}

#[test]
fn test_drop_deinits() {
    let tracker = Arc::new(TrackingAllocator::new());
    {
        let mut doc = Document::with_allocator(tracker.clone());
        doc.parse(CONFIG).unwrap();
    }
    assert_eq!(tracker.live_bytes(), 0);
    assert!(tracker.peak_bytes() > 0);
    assert!(tracker.free_count() > 0);
}

/// Refuses every request once a fixed number of grants has been used up.
#[derive(Debug)]
struct CountdownAllocator {
    grants: AtomicUsize,
    live: AtomicUsize,
}

impl Allocator for CountdownAllocator {
    fn resize(&self, old: usize, new: usize) -> Result<(), AllocError> {
        if new > old {
            let granted = self
                .grants
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if granted.is_err() {
                return Err(AllocError);
            }
        }
        self.live.fetch_add(new, Ordering::SeqCst);
        self.live.fetch_sub(old, Ordering::SeqCst);
        Ok(())
    }

    fn free(&self, size: usize) {
        self.live.fetch_sub(size, Ordering::SeqCst);
    }
}

#[test]
fn test_custom_allocator_failure_at_every_step() {
    for grants in 0..40 {
        let alloc = Arc::new(CountdownAllocator {
            grants: AtomicUsize::new(grants),
            live: AtomicUsize::new(0),
        });
        let mut doc = Document::with_allocator(alloc.clone());
        let result = doc.parse(CONFIG);
        if let Err(err) = &result {
            assert_eq!(err.code(), ErrorCode::BadAlloc, "grants {grants}");
        }
        doc.deinit().unwrap();
        assert_eq!(alloc.live.load(Ordering::SeqCst), 0, "grants {grants}");
    }
}
