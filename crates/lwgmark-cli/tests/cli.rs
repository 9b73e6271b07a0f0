use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin_path() -> PathBuf {
    if let Some(path) = env::var_os("CARGO_BIN_EXE_lwgmark-cli") {
        return PathBuf::from(path);
    }
    if let Some(path) = env::var_os("CARGO_BIN_EXE_lwgmark_cli") {
        return PathBuf::from(path);
    }
    let exe = env::current_exe().expect("current exe");
    let mut debug_dir = exe.as_path();
    while let Some(parent) = debug_dir.parent() {
        if parent.file_name().and_then(|name| name.to_str()) == Some("debug") {
            let candidate = parent.join("lwgmark-cli");
            if candidate.exists() {
                return candidate;
            }
        }
        debug_dir = parent;
    }
    panic!("binary path missing");
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures")
}

fn issue_xml(num: u32, status: &str, discussion: &str) -> String {
    format!(
        "<issue num=\"{num}\" status=\"{status}\">\n\
         <title>Issue {num}</title>\n\
         <section><sref ref=\"[foo.bar]\"/></section>\n\
         <submitter>Someone</submitter>\n\
         <date>3 Feb 2024</date>\n\
         <discussion>\n{discussion}\n</discussion>\n\
         <resolution>\n</resolution>\n\
         </issue>\n"
    )
}

fn issues_dir(files: &[(&str, String)]) -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).expect("write issue");
    }
    dir
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(bin_path())
        .arg(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("LWGMARK_SECTIONS")
        .env_remove("LWGMARK_PAPER_TITLES")
        .env_remove("LWGMARK_COMMIT_DATES")
        .output()
        .expect("run")
}

#[test]
fn prints_fragments_to_stdout() {
    let dir = issues_dir(&[
        ("issue0001.xml", issue_xml(1, "New", "<p>See <iref ref=\"2\"/>.</p>")),
        ("issue0002.xml", issue_xml(2, "WP", "<p>Fixed.</p>")),
    ]);
    let output = run(dir.path(), &[]);

    assert!(output.status.success(), "expected success exit code");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<div id=\"1\">"));
    assert!(stdout.contains("<div id=\"2\">"));
    assert!(stdout.contains(
        "<a href=\"lwg-defects.html#2\" title=\"Issue 2 (Status: WP)\">2</a>"
    ));
    assert!(stdout.contains("<p id=\"res-1\"><b>Proposed resolution:</b></p>"));
}

#[test]
fn writes_fixture_issues_into_out_dir() {
    let fixtures = fixtures_dir();
    let dir = tempfile::tempdir().expect("temp dir");
    for name in ["issue0010.xml", "issue0020.xml", "issue0030.xml"] {
        fs::copy(fixtures.join(name), dir.path().join(name)).expect("copy fixture");
    }
    let out = dir.path().join("html");
    let sections = fixtures.join("sections.txt");
    let papers = fixtures.join("papers.txt");

    let output = run(
        dir.path(),
        &[
            "--sections",
            sections.to_str().expect("path"),
            "--paper-titles",
            papers.to_str().expect("path"),
            "--out",
            out.to_str().expect("path"),
        ],
    );

    assert!(output.status.success(), "expected success exit code");
    assert!(output.stdout.is_empty(), "expected nothing on stdout");
    let html = fs::read_to_string(out.join("issue0010.html")).expect("issue0010.html");
    let expected = fs::read_to_string(fixtures.join("../expect/issue0010.html")).expect("expect");
    assert_eq!(html.trim_end(), expected.trim_end());
    assert!(out.join("issue0020.html").exists());
    assert!(out.join("issue0030.html").exists());
}

#[test]
fn diagnostics_json_reports_number_mismatch() {
    let dir = issues_dir(&[("issue0007.xml", issue_xml(8, "New", "<p>Text.</p>"))]);
    let output = run(dir.path(), &["--diagnostics", "json", "--log-level", "off"]);

    assert!(output.status.success(), "warnings keep the success exit code");
    let stderr = String::from_utf8_lossy(&output.stderr);
    let diagnostics: serde_json::Value = serde_json::from_str(&stderr).expect("json diagnostics");
    let list = diagnostics.as_array().expect("array");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["code"], "W_NUM_MISMATCH");
    assert_eq!(list[0]["severity"], "warning");
    assert_eq!(list[0]["file"], "issue0007.xml");
    assert_eq!(list[0]["issue"], 8);
}

#[test]
fn diagnostics_pretty_reports_error_and_exit_code() {
    let dir = issues_dir(&[("issue0001.xml", issue_xml(1, "New", "<p>a < b</p>"))]);
    let output = run(dir.path(), &["--diagnostics", "pretty"]);

    assert!(!output.status.success(), "expected error exit code");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("E_UNESCAPED_LT"), "stderr: {stderr}");
    assert!(stderr.contains("issue0001.xml:"), "stderr: {stderr}");
    assert!(output.stdout.is_empty(), "no output after an error");
}

#[test]
fn first_bad_issue_stops_the_batch() {
    let dir = issues_dir(&[
        ("issue0001.xml", "<issue num=\"1\" status=\"New\">\n</issue>\n".to_string()),
        ("issue0002.xml", issue_xml(2, "New", "<p>Fine.</p>")),
    ]);
    let output = run(dir.path(), &[]);

    assert!(!output.status.success(), "expected error exit code");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: issue0001.xml:"), "stderr: {stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn keep_going_skips_bad_issues() {
    let dir = issues_dir(&[
        ("issue0001.xml", "<issue num=\"1\" status=\"New\">\n</issue>\n".to_string()),
        ("issue0002.xml", issue_xml(2, "New", "<p>Fine.</p>")),
        ("issue0003.xml", issue_xml(3, "New", "<p>Unclosed <b>bold</p>")),
    ]);
    let output = run(dir.path(), &["--keep-going", "--diagnostics", "json", "--log-level", "off"]);

    assert!(!output.status.success(), "errors still fail the run");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<div id=\"2\">"));
    assert!(!stdout.contains("<div id=\"1\">"));
    assert!(!stdout.contains("<div id=\"3\">"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    let diagnostics: serde_json::Value = serde_json::from_str(&stderr).expect("json diagnostics");
    let codes: Vec<&str> = diagnostics
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|entry| entry["code"].as_str())
        .collect();
    assert_eq!(codes, ["E_MISSING_FIELD", "E_TAG_MISMATCH"]);
}

#[test]
fn duplicate_issue_numbers_fail_the_run() {
    let dir = issues_dir(&[
        ("issue0005.xml", issue_xml(5, "New", "<p>First.</p>")),
        ("issue0006.xml", issue_xml(5, "New", "<p>Second.</p>")),
    ]);
    let output = run(dir.path(), &["--keep-going", "--diagnostics", "json", "--log-level", "off"]);

    assert!(!output.status.success(), "expected error exit code");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("<div id=\"5\">").count(), 1);
    assert!(stdout.contains("First."));
    assert!(!stdout.contains("Second."));

    let stderr = String::from_utf8_lossy(&output.stderr);
    let diagnostics: serde_json::Value = serde_json::from_str(&stderr).expect("json diagnostics");
    let list = diagnostics.as_array().expect("array");
    let codes: Vec<&str> = list.iter().filter_map(|entry| entry["code"].as_str()).collect();
    assert_eq!(codes, ["W_NUM_MISMATCH", "E_DUPLICATE_ISSUE"]);
    assert_eq!(list[1]["file"], "issue0006.xml");
}

#[test]
fn sanitized_output_drops_scripts() {
    let dir = issues_dir(&[(
        "issue0001.xml",
        issue_xml(1, "New", "<p>Hi<script>alert(1)</script></p>"),
    )]);
    let output = run(dir.path(), &["--sanitized"]);

    assert!(output.status.success(), "expected success exit code");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<p>Hi</p>"), "stdout: {stdout}");
    assert!(!stdout.contains("<script"));
}

#[test]
fn missing_issues_dir_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = run(&dir.path().join("absent"), &[]);

    assert!(!output.status.success(), "expected error exit code");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read directory"), "stderr: {stderr}");
}
