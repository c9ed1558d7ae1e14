//! Integration tests for CLI behavior
//!
//! These tests run the `gsmc-pack` binary against manifests in temporary
//! directories and, where the network is involved, against local mock servers.

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;

fn gsmc_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gsmc-pack"))
}

fn workspace(manifest: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    temp.child("pack.jsonc").write_str(manifest).unwrap();
    temp
}

mod help_command {
    use super::*;

    #[test]
    fn shows_help_with_flag() {
        gsmc_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"))
            .stdout(predicate::str::contains("sync"))
            .stdout(predicate::str::contains("dep"));
    }

    #[test]
    fn shows_version_with_flag() {
        gsmc_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn requires_a_subcommand() {
        gsmc_cmd().assert().failure();
    }
}

mod manifest_loading {
    use super::*;

    #[test]
    fn missing_manifest_is_fatal() {
        let temp = TempDir::new().unwrap();
        gsmc_cmd()
            .current_dir(temp.path())
            .arg("sync")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Failed to load manifest"));
        temp.child("pack").assert(predicate::path::missing());
    }

    #[test]
    fn invalid_manifest_is_fatal() {
        let temp = workspace(r#"{ "origins": 12 }"#);
        gsmc_cmd()
            .current_dir(temp.path())
            .arg("test")
            .assert()
            .code(2);
    }

    #[test]
    fn custom_manifest_path() {
        let temp = TempDir::new().unwrap();
        temp.child("mods.jsonc")
            .write_str(r#"["assume;fabric-api"]"#)
            .unwrap();
        gsmc_cmd()
            .current_dir(temp.path())
            .args(["-f", "mods.jsonc", "sync"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 / 1 synced"));
    }
}

mod sync_command {
    use super::*;

    #[test]
    fn assume_only_manifest() {
        let temp = workspace(
            r#"{
                // installed by the launcher
                "origins": ["assume;fabric-api"],
            }"#,
        );
        gsmc_cmd()
            .current_dir(temp.path())
            .arg("sync")
            .assert()
            .success()
            .stdout(predicate::str::contains("skipped   fabric-api: assumed present"))
            .stdout(predicate::str::contains("1 / 1 synced"));
    }

    #[test]
    fn malformed_origins_are_reported_not_fatal() {
        let temp = workspace(r#"["modrinth;sodium", "curseforge;jei;forge;1.20.1"]"#);
        gsmc_cmd()
            .current_dir(temp.path())
            .arg("sync")
            .assert()
            .success()
            .stdout(predicate::str::contains("failed    modrinth;sodium: malformed origin"))
            .stdout(predicate::str::contains("0 / 2 synced"));
    }

    #[test]
    fn verbose_shows_expected_pattern() {
        let temp = workspace(r#"["modrinth;sodium"]"#);
        gsmc_cmd()
            .current_dir(temp.path())
            .args(["sync", "--verbose"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "    Malformed origin 'modrinth;sodium', expected 'modrinth;$LABEL;$PLATFORM;$VERSION'",
            ));
    }

    #[test]
    fn duplicate_labels_keep_first() {
        let temp = workspace(r#"["assume;core", "assume;core"]"#);
        gsmc_cmd()
            .current_dir(temp.path())
            .arg("sync")
            .assert()
            .success()
            .stdout(predicate::str::contains("duplicate label"))
            .stdout(predicate::str::contains("1 / 1 synced"));
    }

    #[test]
    fn unreachable_direct_url() {
        let temp = workspace(r#"["direct;core;http://127.0.0.1:9/file.jar;core.jar"]"#);
        gsmc_cmd()
            .current_dir(temp.path())
            .arg("sync")
            .assert()
            .success()
            .stdout(predicate::str::contains("0 / 1 synced"));
        temp.child("pack/core.jar").assert(predicate::path::missing());
    }

    #[test]
    fn file_name_cannot_leave_pack_directory() {
        let temp = workspace(r#"["direct;evil;http://127.0.0.1:9/e.jar;../escaped.jar"]"#);
        gsmc_cmd()
            .current_dir(temp.path())
            .arg("sync")
            .assert()
            .success()
            .stdout(predicate::str::contains("failed    direct;evil;"))
            .stdout(predicate::str::contains("invalid file name"))
            .stdout(predicate::str::contains("0 / 1 synced"));
        temp.child("escaped.jar").assert(predicate::path::missing());
    }

    #[test]
    fn clean_removes_pack_directory() {
        let temp = workspace(r#"["assume;fabric-api"]"#);
        temp.child("pack/stale.jar").write_str("old").unwrap();
        gsmc_cmd()
            .current_dir(temp.path())
            .args(["sync", "--clean"])
            .assert()
            .success();
        temp.child("pack/stale.jar").assert(predicate::path::missing());
    }
}

mod network {
    use super::*;
    use gsmc_registry::HashVerifier;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &[u8] = b"shader pack bytes";

    #[tokio::test(flavor = "multi_thread")]
    async fn direct_download_structured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bsl.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
            .expect(1)
            .mount(&server)
            .await;

        let temp = workspace(&format!(
            r#"["direct;bsl;{}/bsl.zip;bsl.zip;shader"]"#,
            server.uri()
        ));

        gsmc_cmd()
            .current_dir(temp.path())
            .args(["-M", "sync"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 / 1 synced"));
        temp.child("pack/shaderpacks/bsl.zip")
            .assert(predicate::path::exists());

        // Second run is a no-op.
        gsmc_cmd()
            .current_dir(temp.path())
            .args(["-M", "sync"])
            .assert()
            .success()
            .stdout(predicate::str::contains("skipped   bsl"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_command_reports_broken_url() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/gone.jar"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let temp = workspace(&format!(
            r#"["direct;gone;{}/gone.jar;gone.jar", "assume;fabric-api"]"#,
            server.uri()
        ));

        gsmc_cmd()
            .current_dir(temp.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("corrupted URL"))
            .stdout(predicate::str::contains("1 / 2 passed"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn modrinth_sync_against_registry() {
        let server = MockServer::start().await;
        let limits = |status: u16| {
            ResponseTemplate::new(status)
                .insert_header("x-ratelimit-remaining", "299")
                .insert_header("x-ratelimit-reset", "60")
        };
        Mock::given(method("GET"))
            .and(path("/project/sodium"))
            .respond_with(limits(200).set_body_json(serde_json::json!({
                "id": "AANobbMI",
                "slug": "sodium",
                "project_type": "mod",
                "loaders": ["fabric"]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/project/sodium/version"))
            .respond_with(limits(200).set_body_json(serde_json::json!([{
                "id": "v1",
                "version_number": "0.5.11",
                "date_published": "2024-07-01T00:00:00Z",
                "files": [{
                    "filename": "sodium-0.5.11.jar",
                    "url": format!("{}/cdn/sodium.jar", server.uri()),
                    "hashes": { "sha512": HashVerifier::compute(BODY) },
                    "primary": true,
                    "size": BODY.len()
                }],
                "loaders": ["fabric"],
                "game_versions": ["1.21"]
            }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cdn/sodium.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
            .mount(&server)
            .await;

        let temp = workspace(r#"["modrinth;sodium;fabric;1.21"]"#);

        gsmc_cmd()
            .current_dir(temp.path())
            .args(["--registry-url", &server.uri(), "-M", "sync"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 / 1 synced"));
        temp.child("pack/mods/sodium-0.5.11.jar")
            .assert(predicate::path::exists());
    }
}
