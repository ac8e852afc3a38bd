use std::fs;
use std::path::Path;

use pdf_splitter::{CancelToken, Event, FsRelocator, Recorder, RunResult, SplitJob, run_job};
use tempfile::tempdir;

fn write_sized(path: &Path, len: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, vec![b'x'; len]).expect("write file");
}

fn split(source: &Path, dest: &Path, limit: u64) -> (RunResult, Recorder) {
    let job = SplitJob::new(source, dest, limit);
    let rec = Recorder::new();
    let result = run_job(&job, &FsRelocator::default(), &CancelToken::new(), &rec);
    (result, rec)
}

fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn largest_first_fills_two_buckets() {
    let td = tempdir().unwrap();
    let src = td.path().join("in");
    let dest = td.path().join("out");
    write_sized(&src.join("a.pdf"), 50);
    write_sized(&src.join("b.pdf"), 30);
    write_sized(&src.join("nested/c.pdf"), 40);
    write_sized(&src.join("d.PDF"), 10);
    write_sized(&src.join("notes.txt"), 500);

    let (result, rec) = split(&src, &dest, 100);

    assert!(result.success, "{}", result.message);
    assert_eq!(result.message, "File split complete!");
    assert_eq!(result.bucket("output_001"), Some(90));
    assert_eq!(result.bucket("output_002"), Some(40));
    assert_eq!(result.bucket_sizes.len(), 2);
    assert_eq!(names_in(&dest.join("output_001")), vec!["a.pdf", "c.pdf"]);
    assert_eq!(names_in(&dest.join("output_002")), vec!["b.pdf", "d.PDF"]);

    // non-matching files stay put
    assert!(src.join("notes.txt").exists());
    assert_eq!(result.stats.discovered, 4);
    assert_eq!(result.stats.moved, 4);
    assert!(matches!(rec.events().last(), Some(Event::Finished(_))));
}

#[test]
fn oversized_file_gets_a_bucket_of_its_own() {
    let td = tempdir().unwrap();
    let src = td.path().join("in");
    let dest = td.path().join("out");
    write_sized(&src.join("huge.pdf"), 200);

    let (result, _) = split(&src, &dest, 100);

    assert!(result.success);
    assert_eq!(result.bucket_sizes.len(), 1);
    assert_eq!(result.bucket("output_001"), Some(200));
    assert!(!dest.join("output_002").exists());
}

#[test]
fn oversized_file_after_a_filled_bucket_opens_a_new_one() {
    let td = tempdir().unwrap();
    let src = td.path().join("in");
    let dest = td.path().join("out");
    write_sized(&src.join("huge.pdf"), 300);
    write_sized(&src.join("small.pdf"), 10);

    let (result, _) = split(&src, &dest, 100);

    assert_eq!(result.bucket("output_001"), Some(300));
    assert_eq!(result.bucket("output_002"), Some(10));
}

#[test]
fn empty_source_reports_no_files() {
    let td = tempdir().unwrap();
    let src = td.path().join("in");
    fs::create_dir_all(&src).unwrap();
    write_sized(&src.join("readme.txt"), 5);
    let dest = td.path().join("out");

    let (result, rec) = split(&src, &dest, 100);

    assert!(!result.success);
    assert_eq!(result.message, "No .pdf files were found in the source folder.");
    assert!(result.bucket_sizes.is_empty());
    assert!(!dest.join("output_001").exists());
    assert_eq!(rec.finished().len(), 1);
}

#[test]
fn missing_source_leaves_no_destination() {
    let td = tempdir().unwrap();
    let dest = td.path().join("out");

    let (result, _) = split(&td.path().join("nope"), &dest, 100);

    assert!(!result.success);
    assert_eq!(result.message, "Source folder not found.");
    assert!(!dest.exists());
}

#[test]
fn exact_fit_rolls_over_only_when_exceeded() {
    let td = tempdir().unwrap();
    let src = td.path().join("in");
    let dest = td.path().join("out");
    write_sized(&src.join("one.pdf"), 20);
    write_sized(&src.join("two.pdf"), 20);

    let (result, _) = split(&src, &dest, 25);
    assert_eq!(result.bucket("output_001"), Some(20));
    assert_eq!(result.bucket("output_002"), Some(20));

    let td = tempdir().unwrap();
    let src = td.path().join("in");
    let dest = td.path().join("out");
    write_sized(&src.join("one.pdf"), 20);
    write_sized(&src.join("two.pdf"), 20);

    let (result, _) = split(&src, &dest, 40);
    assert_eq!(result.bucket_sizes.len(), 1);
    assert_eq!(result.bucket("output_001"), Some(40));
}

#[test]
fn destination_inside_source_is_not_rescanned() {
    let td = tempdir().unwrap();
    let src = td.path().join("in");
    write_sized(&src.join("a.pdf"), 60);
    write_sized(&src.join("b.pdf"), 60);

    // First pass splits the folder into itself.
    let (first, _) = split(&src, &src, 100);
    assert!(first.success, "{}", first.message);
    assert_eq!(first.bucket_sizes.len(), 2);

    // A second pass finds nothing new: existing buckets are excluded from discovery.
    let (second, _) = split(&src, &src, 100);
    assert!(!second.success);
    assert_eq!(second.message, "No .pdf files were found in the source folder.");
    assert_eq!(names_in(&src.join("output_001")).len(), 1);
    assert_eq!(names_in(&src.join("output_002")).len(), 1);
}

#[test]
fn custom_suffix_is_matched_case_insensitively() {
    let td = tempdir().unwrap();
    let src = td.path().join("in");
    let dest = td.path().join("out");
    write_sized(&src.join("scan.TIFF"), 10);
    write_sized(&src.join("doc.pdf"), 10);

    let job = SplitJob::new(&src, &dest, 100).with_suffix(".tiff");
    let result = run_job(&job, &FsRelocator::default(), &CancelToken::new(), &Recorder::new());

    assert!(result.success);
    assert_eq!(result.stats.moved, 1);
    assert!(dest.join("output_001/scan.TIFF").exists());
    assert!(src.join("doc.pdf").exists());
}

#[test]
fn log_story_is_timestamped_and_ordered() {
    let td = tempdir().unwrap();
    let src = td.path().join("in");
    write_sized(&src.join("a.pdf"), 10);

    let (_, rec) = split(&src, &td.path().join("out"), 100);
    let lines = rec.log_lines();

    assert!(lines.iter().all(|l| l.starts_with('[') && l.as_bytes()[20] == b']'));
    let pos = |needle: &str| {
        lines
            .iter()
            .position(|l| l.contains(needle))
            .unwrap_or_else(|| panic!("missing log line containing {needle:?}: {lines:#?}"))
    };
    assert!(pos("Starting file split") < pos("Found: 'a.pdf'"));
    assert!(pos("Found: 'a.pdf'") < pos("Moving 'a.pdf'"));
    assert!(pos("Moving 'a.pdf'") < pos("All files have been processed"));
}
