//! Integration tests for histline
//!
//! Recovery scenarios run end to end against a fake history store: point in
//! time reconstruction, pruned snapshots, manifests, exports and rescans.

use crate::common::{FixtureVersion, HistoryFixture};
use ::histline::*;
use filetime::FileTime;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;
use walkdir::WalkDir;

const HOUR: i64 = 3_600_000;
const T0: i64 = 1_751_000_000_000;

/// Build a small project history spanning five hours
///
/// - `src/main.rs`: saved at T0, T0+2h, T0+4h
/// - `src/lib.rs`: created at T0+3h
/// - `README.md`: saved at T0+1h, blob of the second save pruned
/// - `Cargo.toml`: saved at T0
fn create_project_history() -> HistoryFixture {
    let mut fixture = HistoryFixture::new();
    fixture
        .track(
            "src/main.rs",
            &[
                FixtureVersion::new(T0, "fn main() {}"),
                FixtureVersion::new(T0 + 2 * HOUR, "fn main() { a(); }").with_source("Chat Edit"),
                FixtureVersion::new(T0 + 4 * HOUR, "fn main() { a(); b(); }"),
            ],
        )
        .unwrap();
    fixture
        .track("src/lib.rs", &[FixtureVersion::new(T0 + 3 * HOUR, "pub fn a() {}")])
        .unwrap();
    let readme = fixture
        .track(
            "README.md",
            &[
                FixtureVersion::new(T0 + HOUR, "# v1"),
                FixtureVersion::new(T0 + 5 * HOUR, "# v2"),
            ],
        )
        .unwrap();
    fs::remove_file(&readme.blobs[1]).unwrap();
    fixture
        .track("Cargo.toml", &[FixtureVersion::new(T0, "[package]")])
        .unwrap();
    fixture
}

fn tree_contents(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap().to_string_lossy().to_string();
            (relative, fs::read(e.path()).unwrap())
        })
        .collect()
}

fn read_manifest(dir: &Path) -> Manifest {
    serde_json::from_slice(&fs::read(dir.join(DEFAULT_MANIFEST_FILE)).unwrap()).unwrap()
}

#[test]
fn test_reconstruct_latest_collects_pruned_blob() {
    let fixture = create_project_history();
    let extractor = fixture.extractor();
    let out = fixture.output_dir("latest");

    let result = extractor
        .reconstruct(&fixture.project, &out, &ReconstructOptions::default())
        .unwrap();

    assert!(result.success);
    assert_eq!(result.files_processed, 3);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].file.ends_with("README.md"));
    assert!(result.errors[0].error.contains("v001.md"));

    let tree = tree_contents(&out);
    assert_eq!(tree["src/main.rs"], b"fn main() { a(); b(); }");
    assert_eq!(tree["src/lib.rs"], b"pub fn a() {}");
    assert!(!tree.contains_key("README.md"));
}

#[test]
fn test_reconstruct_at_instants() {
    let fixture = create_project_history();
    let extractor = fixture.extractor();

    let cases = [
        (T0 - 1, 0, 4),
        (T0, 2, 2),
        (T0 + HOUR, 3, 1),
        (T0 + 2 * HOUR + 30 * 60 * 1000, 3, 1),
        (T0 + 3 * HOUR, 4, 0),
    ];

    for (i, (instant, processed, skipped)) in cases.iter().enumerate() {
        let out = fixture.output_dir(&format!("at-{}", i));
        let options = extractor.reconstruct_options().at(*instant);
        let result = extractor.reconstruct(&fixture.project, &out, &options).unwrap();
        info!("instant {} -> {:?}", instant, result.files);

        assert_eq!(result.files_processed, *processed, "instant {}", instant);
        assert_eq!(result.skipped_files, Some(*skipped), "instant {}", instant);
        assert!(result.errors.is_empty());
        assert_eq!(result.reconstructed_at, Some(utils::format_timestamp(*instant)));
    }

    let out = fixture.output_dir("at-3");
    assert_eq!(
        fs::read_to_string(out.join("src").join("main.rs")).unwrap(),
        "fn main() { a(); }"
    );
}

#[test]
fn test_reconstruct_is_idempotent() {
    let fixture = create_project_history();
    let extractor = fixture.extractor();
    let out = fixture.output_dir("twice");
    let options = extractor.reconstruct_options().at(T0 + 3 * HOUR);

    let first = extractor.reconstruct(&fixture.project, &out, &options).unwrap();
    let first_tree = tree_contents(&out);
    let first_manifest = read_manifest(&out);

    let second = extractor.reconstruct(&fixture.project, &out, &options).unwrap();
    let second_tree = tree_contents(&out);
    let second_manifest = read_manifest(&out);

    assert_eq!(first.files, second.files);
    assert_eq!(first_manifest.total_files, second_manifest.total_files);
    assert_eq!(first_manifest.files, second_manifest.files);

    // The manifest itself carries a wall-clock time
    let strip = |mut tree: BTreeMap<String, Vec<u8>>| {
        tree.remove(DEFAULT_MANIFEST_FILE);
        tree
    };
    assert_eq!(strip(first_tree), strip(second_tree));
}

#[test]
fn test_manifest_contents() {
    let fixture = create_project_history();
    let extractor = fixture.extractor();
    let out = fixture.output_dir("manifest");
    let options = extractor.reconstruct_options().at(T0 + 2 * HOUR);

    extractor.reconstruct(&fixture.project, &out, &options).unwrap();
    let manifest = read_manifest(&out);

    assert_eq!(manifest.source_directory, fixture.project.display().to_string());
    assert_eq!(manifest.total_files, 3);
    assert_eq!(manifest.files.len(), 3);
    assert_eq!(manifest.reconstructed_at_timestamp, Some(T0 + 2 * HOUR));
    assert_eq!(
        manifest.reconstructed_at_datetime,
        Some(utils::format_timestamp(T0 + 2 * HOUR))
    );

    let main = manifest
        .files
        .iter()
        .find(|r| r.relative_path == "src/main.rs")
        .unwrap();
    assert_eq!(main.source, "timeline");
    assert_eq!(main.timestamp, T0 + 2 * HOUR);
    assert_eq!(main.entry_source.as_deref(), Some("Chat Edit"));
    assert_eq!(main.total_versions, 3);
    assert!(main.original_path.starts_with("file:///"));
    assert_eq!(
        main.file_hash.as_deref(),
        Some(utils::hash_file_content(&out.join("src/main.rs")).unwrap().as_str())
    );

    // Raw JSON uses the documented field names
    let raw: serde_json::Value =
        serde_json::from_slice(&fs::read(out.join(DEFAULT_MANIFEST_FILE)).unwrap()).unwrap();
    for field in ["source_directory", "extraction_time", "total_files", "files"] {
        assert!(raw.get(field).is_some(), "missing {}", field);
    }
}

#[test]
fn test_no_metadata_and_custom_manifest_name() {
    let fixture = create_project_history();

    let extractor = fixture.extractor();
    let out = fixture.output_dir("bare");
    let options = extractor.reconstruct_options().export_metadata(false);
    extractor.reconstruct(&fixture.project, &out, &options).unwrap();
    assert!(!out.join(DEFAULT_MANIFEST_FILE).exists());

    let extractor = ExtractorBuilder::new()
        .history_root(fixture.history.path())
        .manifest_file_name("recovered.json")
        .build()
        .unwrap();
    let out = fixture.output_dir("custom");
    extractor
        .reconstruct(&fixture.project, &out, &extractor.reconstruct_options())
        .unwrap();
    assert!(out.join("recovered.json").exists());
    assert!(!out.join(DEFAULT_MANIFEST_FILE).exists());
}

#[test]
fn test_unwritable_output_root_is_fatal() {
    let fixture = create_project_history();
    let extractor = fixture.extractor();
    let out = fixture.output_dir("taken");
    fs::write(&out, "occupied").unwrap();

    let err = extractor
        .reconstruct(&fixture.project, &out, &ReconstructOptions::default())
        .unwrap_err();
    assert!(matches!(err, HistlineError::Io(_)));
    assert!(!err.is_lookup_miss());

    assert_eq!(fs::read_to_string(&out).unwrap(), "occupied");
    let stray: Vec<_> = fs::read_dir(fixture.work.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name())
        .collect();
    assert_eq!(stray, vec![std::ffi::OsString::from("taken")]);
}

#[test]
fn test_resource_with_parent_segments_is_skipped() {
    let mut fixture = create_project_history();
    fixture
        .track("../escaped.txt", &[FixtureVersion::new(T0, "outside")])
        .unwrap();
    let extractor = fixture.extractor();
    let out = fixture.output_dir("nested").join("inner");

    let result = extractor
        .reconstruct(&fixture.project, &out, &ReconstructOptions::default().at(T0 + HOUR))
        .unwrap();

    assert!(!fixture.output_dir("nested").join("escaped.txt").exists());
    assert!(result.files.iter().all(|f| !f.contains("escaped")));
    // Nothing for lib.rs yet, and the escaping file has no place in the tree
    assert_eq!(result.skipped_files, Some(2));
}

#[test]
fn test_subdirectory_reconstruction() {
    let fixture = create_project_history();
    let extractor = fixture.extractor();
    let out = fixture.output_dir("src-only");

    let result = extractor
        .reconstruct(&fixture.project.join("src"), &out, &ReconstructOptions::default())
        .unwrap();

    let mut files = result.files.clone();
    files.sort();
    assert_eq!(files, vec!["lib.rs".to_string(), "main.rs".to_string()]);
    assert!(out.join("main.rs").exists());
}

#[test]
fn test_copied_files_keep_modification_time() {
    let mut fixture = HistoryFixture::new();
    let tracked = fixture
        .track("notes.txt", &[FixtureVersion::new(T0, "remember")])
        .unwrap();
    let mtime = FileTime::from_unix_time(1_700_000_000, 0);
    filetime::set_file_mtime(&tracked.blobs[0], mtime).unwrap();

    let extractor = fixture.extractor();
    let out = fixture.output_dir("times");
    extractor
        .reconstruct(&fixture.project, &out, &ReconstructOptions::default())
        .unwrap();

    let copied = FileTime::from_last_modification_time(&fs::metadata(out.join("notes.txt")).unwrap());
    assert_eq!(copied, mtime);
}

#[test]
fn test_export_versions() {
    let fixture = create_project_history();
    let extractor = fixture.extractor();
    let main = fixture.project.join("src").join("main.rs");
    let key = main.to_string_lossy().to_string();

    let versions = extractor.get_versions(&key).unwrap();
    assert_eq!(versions.versions.len(), 3);
    assert_eq!(versions.versions[0].timestamp, T0 + 4 * HOUR);

    let out = fixture.output_dir("exports").join("deep").join("main.rs");
    let exported = extractor.export_version(&key, &out, 2).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), "fn main() {}");
    assert_eq!(exported.version.timestamp, T0);
    assert_eq!(exported.output_path, out);

    let err = extractor.export_version(&key, &out, 3).unwrap_err();
    assert!(matches!(
        err,
        HistlineError::VersionIndexOutOfRange { index: 3, available: 3 }
    ));
    assert!(err.to_string().contains("0..3"));

    let readme = fixture.project.join("README.md").to_string_lossy().to_string();
    let err = extractor.export_version(&readme, &out, 0).unwrap_err();
    assert!(matches!(err, HistlineError::SnapshotMissing(_)));
}

#[test]
fn test_lookup_through_relative_path() {
    let fixture = create_project_history();
    let extractor = fixture.extractor();

    let roundabout = fixture.project.join("src").join("..").join("Cargo.toml");
    let versions = extractor.get_versions(&roundabout.to_string_lossy()).unwrap();
    assert_eq!(versions.versions.len(), 1);

    let err = extractor
        .get_versions(&fixture.project.join("nope.rs").to_string_lossy())
        .unwrap_err();
    assert!(err.is_lookup_miss());
}

#[test]
fn test_rescan_sees_new_history() {
    let mut fixture = create_project_history();
    let mut extractor = fixture.extractor();
    assert_eq!(extractor.catalog().len(), 4);

    fixture
        .track("src/new.rs", &[FixtureVersion::new(T0 + 6 * HOUR, "new")])
        .unwrap();
    assert_eq!(extractor.catalog().len(), 4);
    assert_eq!(extractor.rescan().unwrap(), 5);

    let listing = extractor.list_files(Some(&fixture.project), Some(1));
    assert!(listing[0].path.ends_with("new.rs"));
}

#[test]
fn test_list_and_info_rankings() {
    let fixture = create_project_history();
    let extractor = fixture.extractor();

    let listing = extractor.list_files(None, None);
    let order: Vec<Option<i64>> = listing.iter().map(|f| f.latest_timestamp).collect();
    let mut sorted = order.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(order, sorted);

    let most = extractor.catalog().most_versioned(1);
    assert!(most[0].path.ends_with("main.rs"));
    let recent = extractor.catalog().most_recent(1);
    assert!(recent[0].path.ends_with("README.md"));

    let stats = extractor.statistics();
    assert_eq!(stats.total_files, 4);
    assert_eq!(stats.total_versions, 7);
    assert_eq!(stats.average_versions, 1.75);
}
