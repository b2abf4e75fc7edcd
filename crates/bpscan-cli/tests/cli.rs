use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bpscan() -> Command {
    let mut cmd = Command::cargo_bin("bpscan").unwrap();
    cmd.env_remove("BPSCAN_PROVIDER")
        .env_remove("OPENAI_API_KEY")
        .env_remove("GEMINI_API_KEY");
    cmd
}

/// Config pointing at a file that does not exist yet inside `dir`.
fn config_arg(dir: &TempDir) -> String {
    dir.path().join("config.json").display().to_string()
}

/// Write a default config file into `dir` and return its path.
fn init_config(dir: &TempDir) -> String {
    let config = config_arg(dir);
    bpscan()
        .args(["--config", &config, "config", "init"])
        .assert()
        .success();
    config
}

#[test]
fn extract_from_text_argument() {
    let dir = TempDir::new().unwrap();
    let config = init_config(&dir);

    bpscan()
        .args(["--config", &config, "extract", "--text", "120/80 PULSE 72"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"sys":120,"dia":80,"pulse":72}"#));
}

#[test]
fn extract_from_stdin() {
    let dir = TempDir::new().unwrap();
    let config = init_config(&dir);

    bpscan()
        .args(["--config", &config, "extract", "--format", "text"])
        .write_stdin("SYS 132\nDIA 84\nPR 69\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Systolic:  132 mmHg"))
        .stdout(predicate::str::contains("Pulse:     69 /min"));
}

#[test]
fn extract_without_digits_reports_empty_reading() {
    let dir = TempDir::new().unwrap();
    let config = init_config(&dir);

    bpscan()
        .args(["--config", &config, "extract", "--text", "no digits here", "--detailed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no_numeric_content"))
        .stderr(predicate::str::contains("clearer photo"));
}

#[test]
fn extract_from_file_to_csv() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("ocr.txt");
    let output = dir.path().join("reading.csv");
    std::fs::write(&input, "Measured 118 - 76 at 8:15").unwrap();
    let config = init_config(&dir);

    bpscan()
        .args(["--config", &config, "extract"])
        .arg(&input)
        .args(["--format", "csv", "--output"])
        .arg(&output)
        .assert()
        .success();

    let csv = std::fs::read_to_string(&output).unwrap();
    assert!(csv.starts_with("sys,dia,pulse,strategy,confidence,warnings\n118,76,,slash_pair,"));
}

#[test]
fn config_init_and_get() {
    let dir = TempDir::new().unwrap();
    let config = config_arg(&dir);

    bpscan()
        .args(["--config", &config, "config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    bpscan()
        .args(["--config", &config, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    bpscan()
        .args(["--config", &config, "config", "set", "vision.provider", "gemini"])
        .assert()
        .success();

    bpscan()
        .args(["--config", &config, "config", "get", "vision.provider"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"gemini\""));
}

#[test]
fn config_path_reports_missing_file() {
    let dir = TempDir::new().unwrap();

    bpscan()
        .args(["--config", &config_arg(&dir), "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));
}

#[test]
fn scan_without_api_key_fails() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("monitor.png");
    std::fs::write(&image, b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap();

    let config = init_config(&dir);

    bpscan()
        .args(["--config", &config, "scan"])
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}
