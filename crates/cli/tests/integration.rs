//! Integration tests for the hbp CLI
//!
//! Tests in `public` read the public validation container over the network.
//! Tests in `authenticated` log in and need:
//!
//! ```bash
//! export HBP_ARCHIVE_USERNAME=<user>
//! export CSCS_PASS=<password>
//! export TEST_HBP_CONTAINER=<writable container>
//! cargo test -p hbp-archive --features integration
//! ```

#![cfg(feature = "integration")]

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const PUBLIC_URL: &str =
    "https://object.cscs.ch/v1/AUTH_c0a333ecf7c045809321ce9d9ecdfdea/sp6_validation_data";

/// Run hbp with an isolated config directory
fn run_hbp(args: &[&str], config_dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hbp"))
        .args(args)
        .env("HBP_ARCHIVE_CONFIG_DIR", config_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute hbp command")
}

/// Run hbp without any login details in the environment
fn run_anonymous(args: &[&str], config_dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hbp"))
        .args(args)
        .env("HBP_ARCHIVE_CONFIG_DIR", config_dir)
        .env_remove("HBP_ARCHIVE_USERNAME")
        .env_remove("CSCS_PASS")
        .output()
        .expect("Failed to execute hbp command")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "invalid JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

/// Writable container and config dir, if login details are available
fn setup_authenticated() -> Option<(TempDir, String)> {
    std::env::var("HBP_ARCHIVE_USERNAME").ok()?;
    std::env::var("CSCS_PASS").ok()?;
    let container = std::env::var("TEST_HBP_CONTAINER").ok()?;
    let config_dir = tempfile::tempdir().ok()?;
    Some((config_dir, container))
}

/// Unique suffix for test objects
fn unique_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{:x}", duration.as_nanos() % 0xFFFFFFFF)
}

mod public {
    use super::*;

    #[test]
    fn test_list_public_container() {
        let config_dir = tempfile::tempdir().unwrap();
        let output = run_anonymous(&["ls", PUBLIC_URL, "--json"], config_dir.path());
        assert!(
            output.status.success(),
            "ls failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let json = stdout_json(&output);
        let files = json.as_array().expect("array of files");
        assert!(!files.is_empty());
    }

    #[test]
    fn test_du_public_container() {
        let config_dir = tempfile::tempdir().unwrap();
        let output = run_anonymous(
            &["du", PUBLIC_URL, "--unit", "B", "--json"],
            config_dir.path(),
        );
        assert!(output.status.success());
        let json = stdout_json(&output);
        assert!(json["count"].as_u64().unwrap_or(0) > 0);
        assert!(json["size"].as_f64().unwrap_or(0.0) > 0.0);
    }

    #[test]
    fn test_public_container_is_read_only() {
        let config_dir = tempfile::tempdir().unwrap();
        let local = config_dir.path().join("upload.txt");
        std::fs::write(&local, b"nope").unwrap();
        let output = run_anonymous(
            &["put", local.to_str().unwrap(), PUBLIC_URL],
            config_dir.path(),
        );
        assert_eq!(output.status.code(), Some(4));
    }
}

mod authenticated {
    use super::*;

    #[test]
    fn test_projects_listed() {
        let Some((config_dir, _)) = setup_authenticated() else {
            eprintln!("Skipping: login details not available");
            return;
        };
        let output = run_hbp(&["projects", "--json"], config_dir.path());
        assert!(output.status.success());
        assert!(stdout_json(&output).as_array().is_some_and(|p| !p.is_empty()));
    }

    #[test]
    fn test_put_get_move_delete() {
        let Some((config_dir, container)) = setup_authenticated() else {
            eprintln!("Skipping: login details not available");
            return;
        };
        let suffix = unique_suffix();
        let local = config_dir.path().join(format!("it-{suffix}.txt"));
        std::fs::write(&local, b"integration test content").unwrap();

        let remote = format!("{container}/hbp-it/");
        let output = run_hbp(
            &["put", local.to_str().unwrap(), &remote],
            config_dir.path(),
        );
        assert!(
            output.status.success(),
            "put failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let object = format!("{container}/hbp-it/it-{suffix}.txt");
        let output = run_hbp(&["stat", &object, "--json"], config_dir.path());
        assert!(output.status.success());
        assert_eq!(stdout_json(&output)["bytes"], 24);

        let download_dir = config_dir.path().join("download");
        let output = run_hbp(
            &["get", &object, download_dir.to_str().unwrap()],
            config_dir.path(),
        );
        assert!(output.status.success());
        let downloaded = download_dir.join("hbp-it").join(format!("it-{suffix}.txt"));
        assert_eq!(
            std::fs::read(&downloaded).unwrap(),
            b"integration test content"
        );

        let output = run_hbp(
            &["get", &object, download_dir.to_str().unwrap()],
            config_dir.path(),
        );
        assert_eq!(output.status.code(), Some(6));

        let moved = format!("{container}/hbp-it/moved-{suffix}.txt");
        let output = run_hbp(&["mv", &object, &moved], config_dir.path());
        assert!(output.status.success());

        let output = run_hbp(&["stat", &object], config_dir.path());
        assert_eq!(output.status.code(), Some(5));

        let output = run_hbp(&["rm", &moved], config_dir.path());
        assert!(output.status.success());
    }

    #[test]
    fn test_find_container() {
        let Some((config_dir, container)) = setup_authenticated() else {
            eprintln!("Skipping: login details not available");
            return;
        };
        let output = run_hbp(&["find", &container, "--json"], config_dir.path());
        assert!(output.status.success());
        assert_eq!(stdout_json(&output)["container"], container.as_str());
    }
}
