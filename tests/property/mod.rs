//! Property-based testing for histline
//!
//! Uses proptest to check the time-resolution and path-filtering invariants
//! across randomly generated histories.

use crate::common::{FixtureVersion, HistoryFixture};
use ::histline::*;
use proptest::prelude::*;
use std::path::{Path, PathBuf};

/// Generate a list of capture times, possibly with duplicates
fn timestamps_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(
        prop_oneof![
            0i64..1_000,
            1_700_000_000_000i64..1_800_000_000_000,
        ],
        0..20,
    )
}

/// Generate a directory name component
fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn tracked_with(timestamps: &[i64]) -> TrackedFile {
    TrackedFile::new(
        "file:///prop/file.txt",
        PathBuf::from("/prop-history/dir"),
        timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| VersionEntry::new(format!("e{}", i), *ts))
            .collect(),
    )
}

fn catalog_of(paths: &[String]) -> Catalog {
    paths
        .iter()
        .map(|p| TrackedFile::new(p.clone(), PathBuf::from("/prop-history/x"), vec![]))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// `latest` holds the maximum timestamp and is absent only without entries
    #[test]
    fn prop_latest_is_maximum(timestamps in timestamps_strategy()) {
        let file = tracked_with(&timestamps);
        match file.latest() {
            Some(latest) => {
                prop_assert_eq!(Some(latest.timestamp), timestamps.iter().copied().max());
            }
            None => prop_assert!(timestamps.is_empty()),
        }
        match file.oldest() {
            Some(oldest) => prop_assert_eq!(Some(oldest.timestamp), timestamps.iter().copied().min()),
            None => prop_assert!(timestamps.is_empty()),
        }
    }

    /// `entry_at_or_before(t)` is the greatest timestamp not after `t`
    #[test]
    fn prop_entry_at_or_before(timestamps in timestamps_strategy(), instant in -10i64..1_900_000_000_000) {
        let file = tracked_with(&timestamps);
        let expected = timestamps.iter().copied().filter(|ts| *ts <= instant).max();
        prop_assert_eq!(file.entry_at_or_before(instant).map(|e| e.timestamp), expected);
    }

    /// Newest-first ordering is a sorted permutation of the entries
    #[test]
    fn prop_sorted_entries(timestamps in timestamps_strategy()) {
        let file = tracked_with(&timestamps);
        let sorted: Vec<i64> = file.sorted_entries(true).iter().map(|e| e.timestamp).collect();
        let mut expected = timestamps.clone();
        expected.sort_by(|a, b| b.cmp(a));
        prop_assert_eq!(sorted, expected);
    }

    /// A directory matches its own subtree and nothing that merely shares a prefix
    #[test]
    fn prop_directory_filter_is_prefix_exact(
        dir in name_strategy(),
        suffix in name_strategy(),
        leaf in name_strategy(),
        trailing in any::<bool>(),
    ) {
        let base = "/histline-prop-root";
        let inside = format!("{}/{}/{}", base, dir, leaf);
        let sibling = format!("{}/{}{}/{}", base, dir, suffix, leaf);
        let itself = format!("{}/{}", base, dir);
        let catalog = catalog_of(&[inside.clone(), sibling.clone(), itself.clone()]);

        let filter = if trailing { format!("{}/", itself) } else { itself.clone() };
        let matched: Vec<&str> = catalog
            .filter_by_directory(Path::new(&filter))
            .iter()
            .map(|f| f.path.as_str())
            .collect();

        prop_assert!(matched.contains(&inside.as_str()));
        prop_assert!(matched.contains(&itself.as_str()));
        prop_assert!(!matched.contains(&sibling.as_str()));
    }

    /// Integers below the cutoff are seconds, everything else milliseconds
    #[test]
    fn prop_integer_timestamps(value in 0i64..10_000_000_000_000) {
        let parsed = parse_timestamp(&value.to_string()).unwrap();
        if value < 4_102_444_800 {
            prop_assert_eq!(parsed, value * 1000);
        } else {
            prop_assert_eq!(parsed, value);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Exporting version `i` yields the same bytes as the blob it names
    #[test]
    fn prop_export_round_trip(
        contents in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 1..6),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut fixture = HistoryFixture::new();
        let versions: Vec<FixtureVersion> = contents
            .iter()
            .enumerate()
            .map(|(i, c)| FixtureVersion::new(1_000 + i as i64 * 10, c.clone()))
            .collect();
        let tracked = fixture.track("blob.bin", &versions).unwrap();
        let extractor = fixture.extractor();

        let index = pick.index(versions.len());
        let out = fixture.output_dir("export.bin");
        let exported = extractor.export_version(&tracked.key(), &out, index).unwrap();

        let file = extractor.catalog().get(&tracked.key()).unwrap();
        let entry = file.sorted_entries(true)[index];
        prop_assert_eq!(&exported.file_hash, &file.compute_hash(entry).unwrap());
        prop_assert_eq!(exported.version.id.as_str(), entry.id.as_str());
        prop_assert_eq!(std::fs::read(&out).unwrap(), contents[contents.len() - 1 - index].clone());
    }
}
