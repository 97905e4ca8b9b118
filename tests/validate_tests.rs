//! Output validator: footer checks per format and partial-frame cleanup.

mod common;

use common::complete_png;
use pseudofarm::{cleanup_corrupted_outputs, is_output_valid};
use std::fs;

// --- is_output_valid ---

#[test]
fn test_png_with_end_marker_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame_0001.png");
    fs::write(&path, complete_png()).unwrap();
    assert!(is_output_valid(&path));
}

#[test]
fn test_png_truncated_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame_0001.png");
    let mut bytes = complete_png();
    bytes.truncate(bytes.len() - 4);
    fs::write(&path, bytes).unwrap();
    assert!(!is_output_valid(&path));
}

#[test]
fn test_png_marker_outside_last_ten_bytes_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame_0001.png");
    let mut bytes = complete_png();
    bytes.extend_from_slice(&[0u8; 10]);
    fs::write(&path, bytes).unwrap();
    assert!(!is_output_valid(&path));
}

#[test]
fn test_uppercase_extension_uses_format_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("FRAME.PNG");
    fs::write(&path, b"not a png at all").unwrap();
    assert!(!is_output_valid(&path));
}

#[test]
fn test_file_shorter_than_footer_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("tiny.png");
    fs::write(&png, [0xAE, 0x42, 0x60, 0x82]).unwrap();
    assert!(!is_output_valid(&png));
    let other = dir.path().join("tiny.txt");
    fs::write(&other, b"x").unwrap();
    assert!(!is_output_valid(&other));
    let nine = dir.path().join("nine.tif");
    fs::write(&nine, [7u8; 9]).unwrap();
    assert!(!is_output_valid(&nine));
    let ten = dir.path().join("ten.tif");
    fs::write(&ten, [7u8; 10]).unwrap();
    assert!(is_output_valid(&ten));
}

#[test]
fn test_zero_length_is_invalid_for_every_extension() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.png", "a.jpg", "a.jpeg", "a.exr", "a.tif", "noext"] {
        let path = dir.path().join(name);
        fs::write(&path, b"").unwrap();
        assert!(!is_output_valid(&path), "{name}");
    }
}

#[test]
fn test_missing_file_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    assert!(!is_output_valid(&dir.path().join("nope.png")));
}

#[test]
fn test_directory_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub.png");
    fs::create_dir(&sub).unwrap();
    assert!(!is_output_valid(&sub));
}

#[test]
fn test_jpeg_end_of_image_marker() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.jpg");
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend_from_slice(&[0x11; 64]);
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    fs::write(&good, &bytes).unwrap();
    assert!(is_output_valid(&good));

    let bad = dir.path().join("bad.jpeg");
    fs::write(&bad, &bytes[..bytes.len() - 2]).unwrap();
    assert!(!is_output_valid(&bad));
}

#[test]
fn test_exr_size_heuristic() {
    let dir = tempfile::tempdir().unwrap();
    let small = dir.path().join("small.exr");
    fs::write(&small, vec![1u8; 1000]).unwrap();
    assert!(!is_output_valid(&small));
    let big = dir.path().join("big.exr");
    fs::write(&big, vec![1u8; 1001]).unwrap();
    assert!(is_output_valid(&big));
}

#[test]
fn test_unknown_extension_valid_when_non_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame_0001.tif");
    fs::write(&path, vec![7u8; 32]).unwrap();
    assert!(is_output_valid(&path));
}

// --- cleanup_corrupted_outputs ---

#[test]
fn test_cleanup_removes_only_invalid_top_level_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("good.png"), complete_png()).unwrap();
    fs::write(root.join("bad.png"), b"partial").unwrap();
    fs::write(root.join("empty.txt"), b"").unwrap();
    fs::write(root.join("notes.txt"), b"keep me, fully written").unwrap();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("sub").join("bad.png"), b"partial").unwrap();

    assert_eq!(cleanup_corrupted_outputs(root), 2);
    assert!(root.join("good.png").exists());
    assert!(root.join("notes.txt").exists());
    assert!(!root.join("bad.png").exists());
    assert!(!root.join("empty.txt").exists());
    // not recursive
    assert!(root.join("sub").join("bad.png").exists());
}

#[test]
fn test_cleanup_second_pass_removes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.jpg"), b"partial").unwrap();
    assert_eq!(cleanup_corrupted_outputs(dir.path()), 1);
    assert_eq!(cleanup_corrupted_outputs(dir.path()), 0);
}

#[test]
fn test_cleanup_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(cleanup_corrupted_outputs(&dir.path().join("missing")), 0);
}
