mod common;

use common::{digest_of, write_file, TestFixture};
use dirhash_lib::{
    walk_and_record, Algorithm, CancelToken, DirhashError, ErrorPolicy, HashEngine, Inventory, InventoryEntry,
    InventoryReader, RunOutcome, ScanObserver, ScanOptions, NoopObserver,
};

const HI_SHA256: &str = "8f434346648f6b96df89dda901c5176b10a6d83961dd3c1ac88b59b2dc327aa4";

#[test]
fn test_identical_content_in_two_directories() {
    let fixture = TestFixture::new();
    let root = fixture.tree("root", &[("a.txt", b"hi"), ("sub/b.txt", b"hi")]);

    let stats = fixture.build("root", &root, Algorithm::Sha256).unwrap();
    assert_eq!(stats.outcome, RunOutcome::Completed);
    assert_eq!(stats.file_count, 2);
    assert_eq!(stats.dir_count, 2);
    assert_eq!(stats.total_bytes, 4);

    let reader = InventoryReader::open(fixture.db("root")).unwrap();
    assert_eq!(
        reader.entries().unwrap(),
        vec![
            InventoryEntry::new(HI_SHA256, "a.txt"),
            InventoryEntry::new(HI_SHA256, "sub/b.txt"),
        ]
    );
    assert_eq!(reader.digest_column(), "sha256");
    assert_eq!(reader.meta().outcome.as_deref(), Some("completed"));
    assert_eq!(
        reader.meta().root.as_deref(),
        Some(root.canonicalize().unwrap().to_string_lossy().as_ref())
    );

    let mirror = std::fs::read_to_string(fixture.mirror("root")).unwrap();
    let expected_head = format!("\n{d} a.txt\n\n{d} sub/b.txt\n\nStatistics:\n", d = HI_SHA256);
    assert!(mirror.starts_with(&expected_head), "unexpected mirror:\n{}", mirror);
    assert!(mirror.contains("Total files:           2"));
    assert!(mirror.contains("Total directories:     2"));
}

#[test]
fn test_empty_root() {
    let fixture = TestFixture::new();
    let root = fixture.tree("empty", &[]);

    let stats = fixture.build("empty", &root, Algorithm::Md5).unwrap();
    assert_eq!((stats.file_count, stats.dir_count, stats.total_bytes), (0, 0, 0));

    let reader = InventoryReader::open(fixture.db("empty")).unwrap();
    assert!(reader.is_empty().unwrap());
    assert_eq!(reader.algorithm(), Algorithm::Md5);
}

#[test]
fn test_digest_depends_only_on_content() {
    let fixture = TestFixture::new();
    let root = fixture.tree(
        "root",
        &[("one.bin", b"same bytes"), ("deep/er/two.dat", b"same bytes"), ("other", b"different")],
    );

    fixture.build("root", &root, Algorithm::Sha1).unwrap();
    let entries = InventoryReader::open(fixture.db("root")).unwrap().entries().unwrap();

    let digest = |path: &str| entries.iter().find(|e| e.path == path).unwrap().digest.clone();
    assert_eq!(digest("one.bin"), digest("deep/er/two.dat"));
    assert_ne!(digest("one.bin"), digest("other"));
    assert_eq!(digest("other"), digest_of(Algorithm::Sha1, b"different"));
}

struct CancelAfter {
    remaining: usize,
    token: CancelToken,
}

impl ScanObserver for CancelAfter {
    fn on_entry(&mut self, _entry: &InventoryEntry, _new_dir: bool) {
        self.remaining -= 1;
        if self.remaining == 0 {
            self.token.cancel();
        }
    }
}

#[test]
fn test_interrupt_keeps_recorded_prefix() {
    let fixture = TestFixture::new();
    let root = fixture.tree(
        "root",
        &[("1.txt", b"1"), ("2.txt", b"2"), ("3.txt", b"3"), ("4.txt", b"4"), ("5.txt", b"5")],
    );

    let token = CancelToken::new();
    let mut observer = CancelAfter {
        remaining: 2,
        token: token.clone(),
    };
    let options = ScanOptions {
        cancel: Some(token),
        ..ScanOptions::default()
    };

    let mut inventory =
        Inventory::open(fixture.db("root"), fixture.mirror("root"), Algorithm::Sha256, &root).unwrap();
    let stats = walk_and_record(&mut inventory, &root, &HashEngine::new(Algorithm::Sha256), &options, &mut observer)
        .unwrap();
    assert!(inventory.is_finalized());
    drop(inventory);

    assert_eq!(stats.outcome, RunOutcome::Interrupted);
    assert_eq!(stats.file_count, 2);

    let reader = InventoryReader::open(fixture.db("root")).unwrap();
    let paths: Vec<_> = reader.entries().unwrap().into_iter().map(|e| e.path).collect();
    assert_eq!(paths, vec!["1.txt", "2.txt"]);
    assert_eq!(reader.meta().outcome.as_deref(), Some("interrupted"));

    let mirror = std::fs::read_to_string(fixture.mirror("root")).unwrap();
    assert_eq!(mirror.matches("Statistics:").count(), 1);
    assert!(mirror.contains("Total files:           2"));
    assert!(mirror.contains("Run outcome:           interrupted"));
}

#[test]
fn test_existing_artifacts_are_not_overwritten() {
    let fixture = TestFixture::new();
    let root = fixture.tree("root", &[("a.txt", b"a")]);
    std::fs::write(fixture.db("root"), b"precious").unwrap();

    let result = Inventory::open(fixture.db("root"), fixture.mirror("root"), Algorithm::Sha256, &root);
    assert!(matches!(result, Err(DirhashError::AlreadyExists(_))));
    assert_eq!(std::fs::read(fixture.db("root")).unwrap(), b"precious");
    assert!(!fixture.mirror("root").exists());
}

#[cfg(unix)]
mod unreadable {
    use super::*;
    use std::os::unix::fs::symlink;

    fn tree_with_dangling_link(fixture: &TestFixture) -> std::path::PathBuf {
        let root = fixture.tree("root", &[("a.txt", b"a"), ("z.txt", b"z")]);
        symlink(root.join("missing-target"), root.join("m-broken")).unwrap();
        root
    }

    fn run(fixture: &TestFixture, root: &std::path::Path, policy: ErrorPolicy) -> dirhash_lib::Result<dirhash_lib::RunStatistics> {
        let mut inventory =
            Inventory::open(fixture.db("root"), fixture.mirror("root"), Algorithm::Md5, root).unwrap();
        let options = ScanOptions {
            error_policy: policy,
            cancel: None,
        };
        walk_and_record(&mut inventory, root, &HashEngine::new(Algorithm::Md5), &options, &mut NoopObserver)
    }

    #[test]
    fn test_abort_policy_stops_and_finalizes() {
        let fixture = TestFixture::new();
        let root = tree_with_dangling_link(&fixture);

        let result = run(&fixture, &root, ErrorPolicy::Abort);
        assert!(matches!(result, Err(DirhashError::FileIo { .. })));

        let reader = InventoryReader::open(fixture.db("root")).unwrap();
        let paths: Vec<_> = reader.entries().unwrap().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["a.txt"]);
        assert_eq!(reader.meta().outcome.as_deref(), Some("aborted"));

        let mirror = std::fs::read_to_string(fixture.mirror("root")).unwrap();
        let failure = mirror.lines().find(|l| l.starts_with("Failure:")).unwrap();
        assert!(failure.contains("m-broken"), "unexpected failure line: {}", failure);
    }

    #[test]
    fn test_skip_policy_continues() {
        let fixture = TestFixture::new();
        let root = tree_with_dangling_link(&fixture);

        let stats = run(&fixture, &root, ErrorPolicy::Skip).unwrap();
        assert_eq!(stats.outcome, RunOutcome::Completed);
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.skipped_files, 1);

        let mirror = std::fs::read_to_string(fixture.mirror("root")).unwrap();
        assert!(mirror.contains("Skipped files:         1"));
        assert!(!mirror.contains("Failure:"));
    }
}

// Linux filesystems accept arbitrary bytes in names; others may not.
#[cfg(target_os = "linux")]
mod non_utf8_names {
    use super::*;
    use dirhash_lib::verify_inventory;
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    fn tree_with_raw_names(fixture: &TestFixture) -> std::path::PathBuf {
        let root = fixture.tree("root", &[("ok.txt", b"ok")]);
        std::fs::write(root.join(OsStr::from_bytes(b"bad\xff.txt")), b"first").unwrap();
        std::fs::write(root.join(OsStr::from_bytes(b"bad\xfe.txt")), b"second").unwrap();
        root
    }

    fn run(fixture: &TestFixture, root: &std::path::Path, policy: ErrorPolicy) -> dirhash_lib::Result<dirhash_lib::RunStatistics> {
        let mut inventory =
            Inventory::open(fixture.db("root"), fixture.mirror("root"), Algorithm::Sha256, root).unwrap();
        let options = ScanOptions {
            error_policy: policy,
            cancel: None,
        };
        walk_and_record(&mut inventory, root, &HashEngine::new(Algorithm::Sha256), &options, &mut NoopObserver)
    }

    #[test]
    fn test_abort_on_non_utf8_name() {
        let fixture = TestFixture::new();
        let root = tree_with_raw_names(&fixture);

        let result = run(&fixture, &root, ErrorPolicy::Abort);
        match result {
            Err(DirhashError::FileIo { source, .. }) => assert_eq!(source.kind(), std::io::ErrorKind::InvalidData),
            other => panic!("expected an InvalidData error, got {:?}", other),
        }

        let reader = InventoryReader::open(fixture.db("root")).unwrap();
        assert!(reader.is_empty().unwrap());
        assert_eq!(reader.meta().outcome.as_deref(), Some("aborted"));
    }

    #[test]
    fn test_skip_non_utf8_names_and_round_trip() {
        let fixture = TestFixture::new();
        let root = tree_with_raw_names(&fixture);

        let stats = run(&fixture, &root, ErrorPolicy::Skip).unwrap();
        assert_eq!(stats.file_count, 1);
        assert_eq!(stats.skipped_files, 2);

        let reader = InventoryReader::open(fixture.db("root")).unwrap();
        let paths: Vec<_> = reader.entries().unwrap().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["ok.txt"]);
        assert!(paths.iter().all(|p| !p.contains('\u{FFFD}')));

        let report = verify_inventory(&reader, &root, &HashEngine::new(Algorithm::Sha256), |_| Ok(())).unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.failed_count, 0);
    }
}

#[test]
fn test_artifacts_inside_root_are_not_hashed() {
    let fixture = TestFixture::new();
    let root = fixture.tree("root", &[("a.txt", b"a")]);
    write_file(&root, "sub/b.txt", b"b");

    let mut inventory =
        Inventory::open(root.join("self.db"), root.join("self.txt"), Algorithm::Sha256, &root).unwrap();
    let stats = walk_and_record(
        &mut inventory,
        &root,
        &HashEngine::new(Algorithm::Sha256),
        &ScanOptions::default(),
        &mut NoopObserver,
    )
    .unwrap();
    drop(inventory);

    assert_eq!(stats.file_count, 2);
    let paths: Vec<_> = InventoryReader::open(root.join("self.db"))
        .unwrap()
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| e.path)
        .collect();
    assert_eq!(paths, vec!["a.txt", "sub/b.txt"]);
}
