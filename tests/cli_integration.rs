//! Integration tests for the `docker-registry` binary.
//!
//! Argument validation is checked without any registry. The end-to-end
//! tests point the binary at a `wiremock` registry over plain HTTP, with a
//! throwaway config file so no local credentials are picked up.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docker_registry::core::types::{Digest, DigestAlgorithm};
use docker_registry::registry::ImageManifest;

const CONFIG_BLOB: &str = r#"{"created":"2024-03-01T12:30:45Z","architecture":"amd64"}"#;

fn docker_registry() -> Command {
    Command::cargo_bin("docker-registry").unwrap()
}

/// Config file with credential lookup disabled.
fn anonymous_config() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[credentials]\nprovider = \"none\"").unwrap();
    file
}

/// `host:port` of the mock registry.
fn host(server: &MockServer) -> String {
    server.uri().trim_start_matches("http://").to_string()
}

fn sha256(content: &str) -> Digest {
    Digest::from_content(DigestAlgorithm::Sha256, content.as_bytes())
}

fn manifest_for(config: &Digest) -> String {
    serde_json::json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
        "config": {
            "mediaType": "application/vnd.docker.container.image.v1+json",
            "size": CONFIG_BLOB.len(),
            "digest": config.as_str(),
        },
        "layers": [{
            "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
            "size": 2_831_155,
            "digest": sha256("layer").as_str(),
        }]
    })
    .to_string()
}

async fn registry() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;
    server
}

// =============================================================================
// Argument validation
// =============================================================================

mod arguments {
    use super::*;

    #[test]
    fn help_lists_commands() {
        docker_registry()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("ls"))
            .stdout(predicate::str::contains("rm"))
            .stdout(predicate::str::contains("manifest"))
            .stdout(predicate::str::contains("blob"));
    }

    #[test]
    fn version() {
        docker_registry()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn rm_help_has_examples() {
        docker_registry()
            .args(["rm", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("EXAMPLES:"))
            .stdout(predicate::str::contains("registry.example.com/my/repo:my-tag"));
    }

    #[test]
    fn empty_repository() {
        docker_registry()
            .args(["ls", ""])
            .assert()
            .failure()
            .stderr(predicate::str::contains("repository can't be empty"));
    }

    #[test]
    fn missing_server() {
        docker_registry()
            .args(["rm", "/app:v1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("registry server is required"));
    }

    #[test]
    fn manifest_needs_repository() {
        docker_registry()
            .args(["manifest", "registry.example.com"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("repository path is required"));
    }

    #[test]
    fn blob_needs_valid_digest() {
        docker_registry()
            .args(["blob", "registry.example.com/app", "sha256:bad"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid digest"));
    }

    #[test]
    fn blob_needs_two_arguments() {
        docker_registry()
            .args(["blob", "registry.example.com/app"])
            .assert()
            .failure();
    }

    #[test]
    fn missing_config_file() {
        docker_registry()
            .args(["--config", "/nonexistent/config.toml", "ls", "127.0.0.1:9"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("config file not found"));
    }

    #[test]
    fn completion_script() {
        docker_registry()
            .args(["completion", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("docker-registry"));
    }
}

// =============================================================================
// Against a registry
// =============================================================================

mod end_to_end {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn ls_catalog() {
        let server = registry().await;
        Mock::given(method("GET"))
            .and(path("/v2/_catalog"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "repositories": ["base", "team/app"] })),
            )
            .mount(&server)
            .await;
        let config = anonymous_config();

        docker_registry()
            .arg("--insecure")
            .arg("--config")
            .arg(config.path())
            .args(["ls", host(&server).as_str()])
            .assert()
            .success()
            .stdout("base\nteam/app\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn debug_logs_to_stderr() {
        let server = registry().await;
        Mock::given(method("GET"))
            .and(path("/v2/_catalog"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "repositories": ["base"] })),
            )
            .mount(&server)
            .await;
        let config = anonymous_config();
        let file_name = config.path().file_name().unwrap().to_str().unwrap().to_string();

        docker_registry()
            .arg("--insecure")
            .arg("--debug")
            .arg("--config")
            .arg(config.path())
            .args(["ls", host(&server).as_str()])
            .assert()
            .success()
            .stdout("base\n")
            .stderr(predicate::str::contains("connecting to registry"))
            .stderr(predicate::str::contains(file_name));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn ls_tags_only() {
        let server = registry().await;
        Mock::given(method("GET"))
            .and(path("/v2/team/app/tags/list"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "name": "team/app", "tags": ["v1", "latest"] })),
            )
            .mount(&server)
            .await;
        let config = anonymous_config();

        docker_registry()
            .arg("--insecure")
            .arg("--config")
            .arg(config.path())
            .args(["ls", "-t", format!("{}/team/app", host(&server)).as_str()])
            .assert()
            .success()
            .stdout("TAG\nv1\nlatest\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn ls_image_table() {
        let server = registry().await;
        let config_digest = sha256(CONFIG_BLOB);
        Mock::given(method("GET"))
            .and(path("/v2/app/tags/list"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "name": "app", "tags": ["latest", "gone"] })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/app/manifests/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_string(manifest_for(&config_digest)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/v2/app/blobs/{}", config_digest)))
            .respond_with(ResponseTemplate::new(200).set_body_string(CONFIG_BLOB))
            .mount(&server)
            .await;
        let config = anonymous_config();

        docker_registry()
            .arg("--insecure")
            .arg("--config")
            .arg(config.path())
            .args(["ls", format!("{}/app", host(&server)).as_str()])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("TAG      IMAGE ID        SIZE      CREATED\n"))
            .stdout(predicate::str::contains(format!(
                "latest   {}",
                config_digest.short_id()
            )))
            .stdout(predicate::str::contains("2.7MB"))
            .stdout(predicate::str::contains("gone     *** Not Found ***"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn manifest_prints_digest_header() {
        let server = registry().await;
        let body = manifest_for(&sha256(CONFIG_BLOB));
        let digest = sha256(&body);
        Mock::given(method("GET"))
            .and(path("/v2/app/manifests/latest"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Docker-Content-Digest", digest.as_str())
                    .set_body_string(body.clone()),
            )
            .mount(&server)
            .await;
        let config = anonymous_config();

        docker_registry()
            .arg("--insecure")
            .arg("--config")
            .arg(config.path())
            .args(["manifest", format!("{}/app", host(&server)).as_str()])
            .assert()
            .success()
            .stdout(format!("Docker-Content-Digest: {}\n{}\n", digest, body));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn blob_writes_raw_bytes() {
        let server = registry().await;
        let digest = sha256(CONFIG_BLOB);
        Mock::given(method("GET"))
            .and(path(format!("/v2/app/blobs/{}", digest)))
            .respond_with(ResponseTemplate::new(200).set_body_string(CONFIG_BLOB))
            .mount(&server)
            .await;
        let config = anonymous_config();

        docker_registry()
            .arg("--insecure")
            .arg("--config")
            .arg(config.path())
            .args(["blob", format!("{}/app", host(&server)).as_str(), digest.as_str()])
            .assert()
            .success()
            .stdout(CONFIG_BLOB);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn blob_with_wrong_content() {
        let server = registry().await;
        let digest = sha256(CONFIG_BLOB);
        Mock::given(method("GET"))
            .and(path(format!("/v2/app/blobs/{}", digest)))
            .respond_with(ResponseTemplate::new(200).set_body_string("tampered"))
            .mount(&server)
            .await;
        let config = anonymous_config();

        docker_registry()
            .arg("--insecure")
            .arg("--config")
            .arg(config.path())
            .args(["blob", format!("{}/app", host(&server)).as_str(), digest.as_str()])
            .assert()
            .failure()
            .stdout("")
            .stderr(predicate::str::contains("does not match"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rm_single_tag() {
        let server = registry().await;
        let digest = sha256("manifest");
        Mock::given(method("GET"))
            .and(path("/v2/app/tags/list"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "tags": ["v1"] })),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/v2/app/manifests/v1"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("Docker-Content-Digest", digest.as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("/v2/app/manifests/{}", digest)))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
        let config = anonymous_config();

        docker_registry()
            .arg("--insecure")
            .arg("--config")
            .arg(config.path())
            .args(["rm", format!("{}/app:v1", host(&server)).as_str()])
            .assert()
            .success()
            .stdout(format!("deleted {}/app tags: v1\n", server.uri()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rm_shared_tag_moves_it_first() {
        const MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
        let server = registry().await;
        let manifest = manifest_for(&sha256(CONFIG_BLOB));
        let shared = sha256(&manifest);
        let placeholder = ImageManifest::from_slice(manifest.as_bytes())
            .unwrap()
            .placeholder()
            .to_vec()
            .unwrap();
        let moved = Digest::from_content(DigestAlgorithm::Sha256, &placeholder);

        Mock::given(method("GET"))
            .and(path("/v2/app/tags/list"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "tags": ["a", "b"] })),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/v2/app/manifests/b"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("Docker-Content-Digest", shared.as_str()),
            )
            .mount(&server)
            .await;
        // first HEAD of `a` sees the shared digest, later ones the placeholder
        Mock::given(method("HEAD"))
            .and(path("/v2/app/manifests/a"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("Docker-Content-Digest", shared.as_str()),
            )
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/v2/app/manifests/a"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("Docker-Content-Digest", moved.as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/app/manifests/a"))
            .and(header("accept", MANIFEST_V2))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Docker-Content-Digest", shared.as_str())
                    .set_body_raw(manifest.clone(), MANIFEST_V2),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v2/app/manifests/a"))
            .and(header("content-type", MANIFEST_V2))
            .and(body_bytes(placeholder.clone()))
            .respond_with(
                ResponseTemplate::new(201).insert_header("Docker-Content-Digest", moved.as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("/v2/app/manifests/{}", moved)))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("/v2/app/manifests/{}", shared)))
            .respond_with(ResponseTemplate::new(202))
            .expect(0)
            .mount(&server)
            .await;
        let config = anonymous_config();

        docker_registry()
            .arg("--insecure")
            .arg("--config")
            .arg(config.path())
            .args(["rm", format!("{}/app:a", host(&server)).as_str()])
            .assert()
            .success()
            .stdout(format!("deleted {}/app tags: a\n", server.uri()));

        let calls: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/v2/app/manifests/a" || r.method.as_str() == "DELETE")
            .map(|r| r.method.to_string())
            .collect();
        assert_eq!(calls, vec!["HEAD", "GET", "PUT", "HEAD", "DELETE"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rm_quiet() {
        let server = registry().await;
        let digest = sha256("manifest");
        Mock::given(method("GET"))
            .and(path("/v2/app/tags/list"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "tags": ["v1"] })),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/v2/app/manifests/v1"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("Docker-Content-Digest", digest.as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
        let config = anonymous_config();

        docker_registry()
            .args(["-q", "--insecure", "--config"])
            .arg(config.path())
            .args(["rm", format!("{}/app", host(&server)).as_str()])
            .assert()
            .success()
            .stdout("");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rm_with_empty_segment_deletes_nothing() {
        let server = registry().await;
        Mock::given(method("GET"))
            .and(path("/v2/_catalog"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "repositories": ["app"] })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/app/tags/list"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "tags": ["v1", "v2"] })),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Docker-Content-Digest", sha256("manifest").as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(202))
            .expect(0)
            .mount(&server)
            .await;
        let config = anonymous_config();

        for (reference, message) in [
            (format!("{}/", host(&server)), "repository path is required"),
            (format!("{}/app:", host(&server)), "tag is empty"),
        ] {
            docker_registry()
                .arg("--insecure")
                .arg("--config")
                .arg(config.path())
                .args(["rm", reference.as_str()])
                .assert()
                .failure()
                .stdout("")
                .stderr(predicate::str::contains(message));
        }

        let requests = server.received_requests().await.unwrap();
        assert!(requests.is_empty(), "{} requests sent", requests.len());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rm_when_deletion_is_disabled() {
        let server = registry().await;
        let digest = sha256("manifest");
        Mock::given(method("GET"))
            .and(path("/v2/app/tags/list"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "tags": ["v1"] })),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/v2/app/manifests/v1"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("Docker-Content-Digest", digest.as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(405).set_body_json(serde_json::json!({
                "errors": [{ "code": "UNSUPPORTED", "message": "The operation is unsupported." }]
            })))
            .mount(&server)
            .await;
        let config = anonymous_config();

        docker_registry()
            .arg("--insecure")
            .arg("--config")
            .arg(config.path())
            .args(["rm", format!("{}/app:v1", host(&server)).as_str()])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error:"))
            .stderr(predicate::str::contains("405"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn insecure_host_from_config() {
        let server = registry().await;
        Mock::given(method("GET"))
            .and(path("/v2/_catalog"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "repositories": [] })),
            )
            .mount(&server)
            .await;

        let mut config = NamedTempFile::new().unwrap();
        writeln!(
            config,
            "insecure_registries = [\"{}\"]\n\n[credentials]\nprovider = \"none\"",
            host(&server)
        )
        .unwrap();

        docker_registry()
            .arg("--config")
            .arg(config.path())
            .args(["ls", host(&server).as_str()])
            .assert()
            .success()
            .stdout("");
    }

    #[test]
    fn unreachable_registry() {
        let config = anonymous_config();

        docker_registry()
            .arg("--insecure")
            .arg("--config")
            .arg(config.path())
            .args(["ls", "127.0.0.1:9"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot connect to registry at http://127.0.0.1:9"));
    }
}
