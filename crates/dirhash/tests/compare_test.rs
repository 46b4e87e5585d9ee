mod common;

use common::{digest_of, inventory_from_rows, TestFixture};
use dirhash_lib::{compare_inventories, write_comparison, Algorithm, DirhashError, InventoryEntry, InventoryReader};
use proptest::prelude::*;
use std::collections::HashSet;

#[test]
fn test_disjoint_trees() {
    let fixture = TestFixture::new();
    let a = fixture.tree("a", &[("x", b"1")]);
    let b = fixture.tree("b", &[("y", b"2")]);
    fixture.build("a", &a, Algorithm::Sha256).unwrap();
    fixture.build("b", &b, Algorithm::Sha256).unwrap();

    let first = InventoryReader::open(fixture.db("a")).unwrap();
    let second = InventoryReader::open(fixture.db("b")).unwrap();
    let result = compare_inventories(&first, &second).unwrap();

    assert_eq!(result.common().count(), 0);
    assert_eq!(
        result.unique_to_first,
        vec![InventoryEntry::new(digest_of(Algorithm::Sha256, b"1"), "x")]
    );
    assert_eq!(
        result.unique_to_second,
        vec![InventoryEntry::new(digest_of(Algorithm::Sha256, b"2"), "y")]
    );
}

#[test]
fn test_backup_with_renamed_and_missing_files() {
    let fixture = TestFixture::new();
    let original = fixture.tree(
        "original",
        &[("photos/cat.jpg", b"cat"), ("photos/dog.jpg", b"dog"), ("notes.txt", b"notes")],
    );
    let backup = fixture.tree("backup", &[("2023/kitty.jpg", b"cat"), ("notes.txt", b"notes"), ("new.txt", b"new")]);
    fixture.build("original", &original, Algorithm::Md5).unwrap();
    fixture.build("backup", &backup, Algorithm::Md5).unwrap();

    let first = InventoryReader::open(fixture.db("original")).unwrap();
    let second = InventoryReader::open(fixture.db("backup")).unwrap();
    let result = compare_inventories(&first, &second).unwrap();

    let paths = |entries: &[InventoryEntry]| entries.iter().map(|e| e.path.clone()).collect::<Vec<_>>();
    assert_eq!(paths(&result.common_in_first), vec!["notes.txt", "photos/cat.jpg"]);
    assert_eq!(paths(&result.common_in_second), vec!["notes.txt", "2023/kitty.jpg"]);
    assert_eq!(paths(&result.unique_to_first), vec!["photos/dog.jpg"]);
    assert_eq!(paths(&result.unique_to_second), vec!["new.txt"]);

    let out_dir = fixture.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();
    let artifacts = write_comparison(&result, &out_dir).unwrap();

    assert_eq!(
        artifacts.common.file_name().unwrap(),
        "common_to_original.db_and_backup.db.txt"
    );
    let common = std::fs::read_to_string(&artifacts.common).unwrap();
    assert_eq!(common.lines().count(), 4);
    assert!(common.lines().all(|l| l.contains('|')));
}

#[test]
fn test_mixed_algorithms_are_refused() {
    let fixture = TestFixture::new();
    let root = fixture.tree("root", &[("a", b"a")]);
    fixture.build("sha", &root, Algorithm::Sha256).unwrap();
    fixture.build("md5", &root, Algorithm::Md5).unwrap();

    let first = InventoryReader::open(fixture.db("sha")).unwrap();
    let second = InventoryReader::open(fixture.db("md5")).unwrap();
    assert!(matches!(
        compare_inventories(&first, &second),
        Err(DirhashError::AlgorithmMismatch { .. })
    ));
}

#[test]
fn test_non_inventory_input_is_rejected() {
    let fixture = TestFixture::new();
    let bogus = fixture.path().join("bogus.db");
    std::fs::write(&bogus, b"definitely not sqlite").unwrap();

    assert!(matches!(
        InventoryReader::open(&bogus),
        Err(DirhashError::MalformedArtifact { .. })
    ));
}

fn rows_from(contents: &[u8], prefix: &str) -> Vec<InventoryEntry> {
    contents
        .iter()
        .enumerate()
        .map(|(i, byte)| InventoryEntry::new(digest_of(Algorithm::Sha256, &[*byte]), format!("{}/{}", prefix, i)))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_comparison_partitions_both_sides(
        a in proptest::collection::vec(0u8..6, 0..12),
        b in proptest::collection::vec(0u8..6, 0..12),
    ) {
        let fixture = TestFixture::new();
        let a_rows = rows_from(&a, "a");
        let b_rows = rows_from(&b, "b");
        let first = inventory_from_rows(&fixture.db("a"), Algorithm::Sha256, &a_rows);
        let second = inventory_from_rows(&fixture.db("b"), Algorithm::Sha256, &b_rows);

        let result = compare_inventories(&first, &second).unwrap();

        let a_digests: HashSet<_> = a_rows.iter().map(|e| e.digest.clone()).collect();
        let b_digests: HashSet<_> = b_rows.iter().map(|e| e.digest.clone()).collect();

        prop_assert_eq!(result.common_in_first.len() + result.unique_to_first.len(), a_rows.len());
        prop_assert_eq!(result.common_in_second.len() + result.unique_to_second.len(), b_rows.len());

        prop_assert!(result.common_in_first.iter().all(|e| b_digests.contains(&e.digest)));
        prop_assert!(result.common_in_second.iter().all(|e| a_digests.contains(&e.digest)));
        prop_assert!(result.unique_to_first.iter().all(|e| !b_digests.contains(&e.digest)));
        prop_assert!(result.unique_to_second.iter().all(|e| !a_digests.contains(&e.digest)));

        let mut rebuilt: Vec<_> = result.common_in_first.iter().chain(&result.unique_to_first).cloned().collect();
        rebuilt.sort_by(|x, y| x.path.cmp(&y.path));
        let mut expected = a_rows.clone();
        expected.sort_by(|x, y| x.path.cmp(&y.path));
        prop_assert_eq!(rebuilt, expected);
    }
}
