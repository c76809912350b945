use super::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn skip_policy_skips_existing_destination() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("note.txt");
    fs::write(&dest, b"existing").unwrap();
    let decision = resolve(Path::new("/tmp/src/note.txt"), &dest, CollisionPolicy::Skip);
    assert_eq!(decision, Decision::Skip);
}

#[test]
fn skip_policy_passes_through_when_absent() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("note.txt");
    let decision = resolve(Path::new("/tmp/src/note.txt"), &dest, CollisionPolicy::Skip);
    assert_eq!(decision, Decision::UseAsIs(dest));
}

#[test]
fn overwrite_always_uses_as_is() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("note.txt");
    fs::write(&dest, b"existing").unwrap();
    let decision = resolve(Path::new("/tmp/src/note.txt"), &dest, CollisionPolicy::Overwrite);
    assert_eq!(decision, Decision::UseAsIs(dest));
}

#[test]
fn rename_finds_smallest_free_candidate() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("note.txt");
    fs::write(&dest, b"existing").unwrap();
    fs::write(dir.path().join("note_(1).txt"), b"taken").unwrap();

    let decision = resolve(Path::new("/tmp/src/note.txt"), &dest, CollisionPolicy::Rename);
    assert_eq!(decision, Decision::UseRenamed(dir.path().join("note_(2).txt")));
}

#[test]
fn rename_with_no_extension() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("README");
    fs::write(&dest, b"existing").unwrap();

    let decision = resolve(Path::new("/tmp/src/README"), &dest, CollisionPolicy::Rename);
    assert_eq!(decision, Decision::UseRenamed(dir.path().join("README_(1)")));
}

#[test]
fn fail_policy_errors_when_destination_exists() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("note.txt");
    fs::write(&dest, b"existing").unwrap();
    let decision = resolve(Path::new("/tmp/src/note.txt"), &dest, CollisionPolicy::Fail);
    assert!(matches!(decision, Decision::Fail(DestinationError::AlreadyExists(_))));
}

#[test]
fn fail_policy_passes_through_when_absent() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("note.txt");
    let decision = resolve(Path::new("/tmp/src/note.txt"), &dest, CollisionPolicy::Fail);
    assert_eq!(decision, Decision::UseAsIs(dest));
}

#[test]
fn ask_policy_behaves_like_skip() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("note.txt");
    fs::write(&dest, b"existing").unwrap();
    let decision = resolve(Path::new("/tmp/src/note.txt"), &dest, CollisionPolicy::Ask);
    assert_eq!(decision, Decision::Skip);
}

#[test]
fn moving_file_onto_itself_short_circuits_to_skip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("note.txt");
    fs::write(&path, b"content").unwrap();
    let decision = resolve(&path, &path, CollisionPolicy::Overwrite);
    assert_eq!(decision, Decision::Skip);
}

#[test]
fn rename_exhaustion_fails_after_probe_limit() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("note.txt");
    fs::write(&dest, b"existing").unwrap();
    for k in 1..=1000u32 {
        fs::write(dir.path().join(format!("note_({k}).txt")), b"x").unwrap();
    }
    let decision = resolve(Path::new("/tmp/src/note.txt"), &dest, CollisionPolicy::Rename);
    assert!(matches!(decision, Decision::Fail(DestinationError::RenameExhausted(_))));
}
