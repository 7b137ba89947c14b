use std::path::Path;

use shadow_core::{is_binary_like, CaptureError, SequenceTracker, Snapshot};

#[test]
fn test_sequential_changes_number_from_zero() {
    let tracker = SequenceTracker::new();
    let path = Path::new("/watch/config.tmp");
    let seqs: Vec<u64> = (0..5).map(|_| tracker.next_sequence(path)).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_snapshot_creation() {
    let snap = Snapshot::for_path(1, Path::new("/watch/config.tmp"), "ab");
    assert_eq!(snap.sequence(), 1);
    assert_eq!(snap.file_name(), "config.tmp");
    assert_eq!(snap.contents(), "ab");
    assert_eq!(snap.shadow_name(), "1_config.tmp");
}

#[test]
fn test_snapshot_equality() {
    assert_eq!(Snapshot::new(0, "a", "x"), Snapshot::new(0, "a", "x"));
    assert_ne!(Snapshot::new(0, "a", "x"), Snapshot::new(1, "a", "x"));
}

#[test]
fn test_binary_classification_of_snapshot_contents() {
    let text = Snapshot::new(0, "readme.txt", "plain\ttext\r\n");
    let blob = Snapshot::new(0, "blob.bin", "MZ\0\0\u{3}");
    assert!(!is_binary_like(text.contents()));
    assert!(is_binary_like(blob.contents()));
}

#[test]
fn test_capture_error_reports_path() {
    let err = CaptureError::Read {
        path: "/watch/gone.tmp".into(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
    };
    assert_eq!(err.path(), Path::new("/watch/gone.tmp"));
    assert!(err.to_string().contains("/watch/gone.tmp"));
}
