use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

const KB: usize = 1024;

/// Run the binary with an isolated (absent) config file.
fn pdf_splitter(cfg_dir: &Path, args: &[&str]) -> Output {
    let me = assert_cmd::cargo::cargo_bin!("pdf_splitter");
    Command::new(me)
        .env("PDF_SPLITTER_CONFIG", cfg_dir.join("config.xml"))
        .args(args)
        .output()
        .expect("spawn binary")
}

fn seed(src: &Path) {
    fs::create_dir_all(src.join("sub")).unwrap();
    fs::write(src.join("big.pdf"), vec![0u8; 600 * KB]).unwrap();
    fs::write(src.join("sub/mid.pdf"), vec![0u8; 500 * KB]).unwrap();
    fs::write(src.join("small.pdf"), vec![0u8; 300 * KB]).unwrap();
}

#[test]
fn binary_print_config_succeeds() {
    let td = tempdir().unwrap();
    let out = pdf_splitter(td.path(), &["--print-config"]);
    assert!(out.status.success(), "binary should succeed with --print-config");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("PDF_SPLITTER_CONFIG"), "{stdout}");
}

#[test]
fn binary_init_config_writes_template_once() {
    let td = tempdir().unwrap();
    let out = pdf_splitter(td.path(), &["--init-config"]);
    assert!(out.status.success());
    let written = fs::read_to_string(td.path().join("config.xml")).unwrap();
    assert!(written.contains("<limit_mb>100</limit_mb>"));

    // second call leaves the file alone
    fs::write(td.path().join("config.xml"), "<config/>").unwrap();
    let out = pdf_splitter(td.path(), &["--init-config"]);
    assert!(out.status.success());
    assert_eq!(fs::read_to_string(td.path().join("config.xml")).unwrap(), "<config/>");
}

#[test]
fn binary_splits_and_reports_sizes() {
    let td = tempdir().unwrap();
    let src = td.path().join("in");
    let dest = td.path().join("out");
    seed(&src);

    let out = pdf_splitter(
        td.path(),
        &[
            "--source",
            src.to_str().unwrap(),
            "--dest",
            dest.to_str().unwrap(),
            "--limit-mb",
            "1",
            "--no-progress",
        ],
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "stdout: {stdout}\nstderr: {}", String::from_utf8_lossy(&out.stderr));

    assert!(dest.join("output_001/big.pdf").exists());
    assert!(dest.join("output_002/mid.pdf").exists());
    assert!(dest.join("output_002/small.pdf").exists());
    assert!(stdout.contains("File split complete!"), "{stdout}");
    assert!(stdout.contains("output_001: 0.59 MB"), "{stdout}");
    assert!(stdout.contains("output_002: 0.78 MB"), "{stdout}");
    assert!(stdout.contains("Found: 'mid.pdf'"), "{stdout}");
}

#[test]
fn binary_json_report_is_machine_readable() {
    let td = tempdir().unwrap();
    let src = td.path().join("in");
    let dest = td.path().join("out");
    seed(&src);

    let out = pdf_splitter(
        td.path(),
        &[
            "-s",
            src.to_str().unwrap(),
            "-o",
            dest.to_str().unwrap(),
            "-l",
            "1",
            "--json",
        ],
    );
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).expect("stdout is one JSON document");
    assert_eq!(report["success"], true);
    assert_eq!(report["bucket_sizes"][0]["name"], "output_001");
    assert_eq!(report["bucket_sizes"][0]["bytes"], 600 * KB);
    assert_eq!(report["bucket_sizes"][1]["bytes"], 800 * KB);
    assert_eq!(report["stats"]["moved"], 3);
}

#[test]
fn binary_reads_folders_from_config_file() {
    let td = tempdir().unwrap();
    let src = td.path().join("in");
    let dest = td.path().join("out");
    seed(&src);
    fs::write(
        td.path().join("config.xml"),
        format!(
            "<config><source_dir>{}</source_dir><dest_dir>{}</dest_dir><limit_mb>2</limit_mb></config>",
            src.display(),
            dest.display()
        ),
    )
    .unwrap();

    let out = pdf_splitter(td.path(), &["--no-progress"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(dest.join("output_001/big.pdf").exists());
    assert!(dest.join("output_001/small.pdf").exists());
    assert!(!dest.join("output_002").exists());
}

#[test]
fn binary_fails_on_empty_source() {
    let td = tempdir().unwrap();
    let src = td.path().join("in");
    fs::create_dir_all(&src).unwrap();

    let out = pdf_splitter(
        td.path(),
        &["-s", src.to_str().unwrap(), "-o", td.path().join("out").to_str().unwrap(), "--no-progress"],
    );
    assert!(!out.status.success());
    let all = format!(
        "{}{}",
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    assert!(all.contains("No .pdf files were found in the source folder."), "{all}");
}

#[test]
fn binary_fails_without_folders() {
    let td = tempdir().unwrap();
    let out = pdf_splitter(td.path(), &["--no-progress"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no source folder configured"));
}

#[test]
fn binary_refuses_in_place_split_without_yes() {
    let td = tempdir().unwrap();
    let dir = td.path().join("scans");
    seed(&dir);
    let d = dir.to_str().unwrap();

    let out = pdf_splitter(td.path(), &["-s", d, "-o", d, "--no-progress"]);
    assert!(!out.status.success());
    assert!(dir.join("big.pdf").exists());
    assert!(!dir.join("output_001").exists());

    let out = pdf_splitter(td.path(), &["-s", d, "-o", d, "-l", "1", "--yes", "--no-progress"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(dir.join("output_001/big.pdf").exists());
    assert!(!dir.join("big.pdf").exists());
}
