//! Integration tests for the HTTP registry client.
//!
//! A `wiremock` server stands in for the registry, so these tests cover the
//! wire behavior: endpoints, headers, pagination, error bodies and the
//! authentication handshake.

use docker_registry::core::types::{Digest, DigestAlgorithm, ManifestSchema};
use docker_registry::credentials::Credentials;
use docker_registry::registry::http::HttpRegistry;
use docker_registry::registry::{create_registry, ImageManifest, Registry, RegistryError};
use wiremock::matchers::{basic_auth, bearer_token, body_bytes, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
const MANIFEST_V1: &str = "application/vnd.docker.distribution.manifest.v1+json";

const MANIFEST: &str = r#"{
   "schemaVersion": 2,
   "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
   "config": {
      "mediaType": "application/vnd.docker.container.image.v1+json",
      "size": 1472,
      "digest": "sha256:3fd9065eaf02feaf94d68376da52541925650b81698c53c6824d92ff63f98353"
   },
   "layers": [
      {
         "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
         "size": 3408729,
         "digest": "sha256:c926b61bad3b94ae7351bafd0c184c159ebf0643b085f7ef1d47ecdc7316833c"
      }
   ]
}"#;

fn client(server: &MockServer) -> HttpRegistry {
    HttpRegistry::new(server.uri(), None, "docker-registry-test").unwrap()
}

fn client_with_login(server: &MockServer) -> HttpRegistry {
    HttpRegistry::new(
        server.uri(),
        Some(Credentials::new("alice", "s3cret")),
        "docker-registry-test",
    )
    .unwrap()
}

fn digest_of(content: &str) -> Digest {
    Digest::from_content(DigestAlgorithm::Sha256, content.as_bytes())
}

// =============================================================================
// Endpoints
// =============================================================================

mod endpoints {
    use super::*;

    #[tokio::test]
    async fn ping_version_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/"))
            .and(header("user-agent", "docker-registry-test"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).ping().await.unwrap();
    }

    #[tokio::test]
    async fn catalog_follows_next_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/_catalog"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Link", r#"</v2/_catalog?last=base&n=2>; rel="next""#)
                    .set_body_json(serde_json::json!({ "repositories": ["app", "base"] })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/_catalog"))
            .and(query_param("last", "base"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "repositories": ["team/web"] })),
            )
            .with_priority(1)
            .mount(&server)
            .await;

        let repositories = client(&server).repositories().await.unwrap();
        assert_eq!(repositories, vec!["app", "base", "team/web"]);
    }

    #[tokio::test]
    async fn catalog_stops_on_repeated_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/_catalog"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Link", r#"</v2/_catalog?last=base&n=2>; rel="next""#)
                    .set_body_json(serde_json::json!({ "repositories": ["app", "base"] })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/_catalog"))
            .and(query_param("last", "base"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Link", r#"</v2/_catalog?last=base&n=2>; rel="next""#)
                    .set_body_json(serde_json::json!({ "repositories": ["team/web"] })),
            )
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;

        let repositories = client(&server).repositories().await.unwrap();
        assert_eq!(repositories, vec!["app", "base", "team/web"]);
    }

    #[tokio::test]
    async fn null_tag_list_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/team/app/tags/list"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "name": "team/app", "tags": null })),
            )
            .mount(&server)
            .await;

        assert!(client(&server).tags("team/app").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tag_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/app/tags/list"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "name": "app", "tags": ["v1", "latest"] })),
            )
            .mount(&server)
            .await;

        assert_eq!(client(&server).tags("app").await.unwrap(), vec!["v1", "latest"]);
    }

    #[tokio::test]
    async fn manifest_get_sends_schema_accept() {
        let server = MockServer::start().await;
        let digest = digest_of(MANIFEST);
        Mock::given(method("GET"))
            .and(path("/v2/app/manifests/v1"))
            .and(header("accept", MANIFEST_V2))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Docker-Content-Digest", digest.as_str())
                    .set_body_raw(MANIFEST, MANIFEST_V2),
            )
            .mount(&server)
            .await;

        let raw = client(&server)
            .manifest("app", "v1", ManifestSchema::V2)
            .await
            .unwrap();
        assert_eq!(raw.digest.as_deref(), Some(digest.as_str()));
        assert_eq!(raw.media_type.as_deref(), Some(MANIFEST_V2));
        assert_eq!(raw.body_text(), MANIFEST);
    }

    #[tokio::test]
    async fn manifest_v1_accept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/app/manifests/latest"))
            .and(header("accept", MANIFEST_V1))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"schemaVersion":1}"#))
            .mount(&server)
            .await;

        let raw = client(&server)
            .manifest("app", "latest", ManifestSchema::V1)
            .await
            .unwrap();
        assert_eq!(raw.digest, None);
        assert_eq!(raw.body, br#"{"schemaVersion":1}"#);
    }

    #[tokio::test]
    async fn manifest_v2_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/app/manifests/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MANIFEST))
            .mount(&server)
            .await;

        let manifest = client(&server).manifest_v2("app", "v1").await.unwrap();
        assert_eq!(manifest.layers.len(), 1);
        assert_eq!(manifest.total_size(), 1472 + 3408729);
    }

    #[tokio::test]
    async fn digest_from_head() {
        let server = MockServer::start().await;
        let digest = digest_of(MANIFEST);
        Mock::given(method("HEAD"))
            .and(path("/v2/app/manifests/v1"))
            .and(header("accept", MANIFEST_V2))
            .respond_with(
                ResponseTemplate::new(200).insert_header("Docker-Content-Digest", digest.as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let found = client(&server).manifest_digest("app", "v1").await.unwrap();
        assert_eq!(found, digest);
    }

    #[tokio::test]
    async fn head_without_digest_header() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/v2/app/manifests/v1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = client(&server)
            .manifest_digest("app", "v1")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn put_sends_manifest_media_type() {
        let server = MockServer::start().await;
        let manifest = ImageManifest::from_slice(MANIFEST.as_bytes()).unwrap();
        let placeholder = manifest.placeholder();
        let body = placeholder.to_vec().unwrap();
        let digest = Digest::from_content(DigestAlgorithm::Sha256, &body);

        Mock::given(method("PUT"))
            .and(path("/v2/app/manifests/v1"))
            .and(header("content-type", MANIFEST_V2))
            .and(body_bytes(body.clone()))
            .respond_with(
                ResponseTemplate::new(201).insert_header("Docker-Content-Digest", digest.as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let stored = client(&server)
            .put_manifest("app", "v1", &placeholder)
            .await
            .unwrap();
        assert_eq!(stored, Some(digest));
    }

    #[tokio::test]
    async fn delete_by_digest() {
        let server = MockServer::start().await;
        let digest = digest_of(MANIFEST);
        Mock::given(method("DELETE"))
            .and(path(format!("/v2/team/app/manifests/{}", digest)))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .delete_manifest("team/app", &digest)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn blob_bytes() {
        let server = MockServer::start().await;
        let content = b"\x1f\x8b\x08\x00binary layer";
        let digest = Digest::from_content(DigestAlgorithm::Sha256, content);
        Mock::given(method("GET"))
            .and(path(format!("/v2/app/blobs/{}", digest)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
            .mount(&server)
            .await;

        let blob = client(&server).blob("app", &digest).await.unwrap();
        assert_eq!(blob, content);
    }
}

// =============================================================================
// Errors
// =============================================================================

mod errors {
    use super::*;

    #[tokio::test]
    async fn error_body_becomes_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/app/manifests/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "errors": [{ "code": "MANIFEST_UNKNOWN", "message": "manifest unknown", "detail": {} }]
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .manifest("app", "gone", ManifestSchema::V2)
            .await
            .unwrap_err();
        assert_eq!(err, RegistryError::NotFound("MANIFEST_UNKNOWN: manifest unknown".into()));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn deletion_disabled() {
        let server = MockServer::start().await;
        let digest = digest_of(MANIFEST);
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(405).set_body_json(serde_json::json!({
                "errors": [{ "code": "UNSUPPORTED", "message": "The operation is unsupported." }]
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .delete_manifest("app", &digest)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(405));
        assert!(err.to_string().contains("UNSUPPORTED"));
    }

    #[tokio::test]
    async fn plain_error_uses_status_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/_catalog"))
            .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
            .mount(&server)
            .await;

        let err = client(&server).repositories().await.unwrap_err();
        assert_eq!(
            err,
            RegistryError::ApiError {
                status: 503,
                message: "Service Unavailable".into()
            }
        );
    }

    #[tokio::test]
    async fn forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client(&server)
            .delete_manifest("app", &digest_of(MANIFEST))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::AuthFailed(ref m) if m.starts_with("permission denied")));
    }

    #[tokio::test]
    async fn unreachable_registry() {
        let result = create_registry("http://127.0.0.1:9", None, None).await;
        assert!(matches!(result, Err(RegistryError::NetworkError(_))));
    }
}

// =============================================================================
// Authentication
// =============================================================================

mod auth {
    use super::*;

    async fn bearer_server(login: Option<(&str, &str)>) -> MockServer {
        let server = MockServer::start().await;
        let challenge = format!(
            r#"Bearer realm="{}/token",service="registry.test",scope="repository:app:pull""#,
            server.uri()
        );

        Mock::given(path("/v2/"))
            .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", challenge.as_str()))
            .mount(&server)
            .await;
        Mock::given(path("/v2/"))
            .and(bearer_token("tok-123"))
            .respond_with(ResponseTemplate::new(200))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(path("/v2/app/tags/list"))
            .and(bearer_token("tok-123"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "tags": ["v1"] })),
            )
            .mount(&server)
            .await;

        let token = Mock::given(method("GET"))
            .and(path("/token"))
            .and(query_param("service", "registry.test"))
            .and(query_param("scope", "repository:app:pull"));
        let token = match login {
            Some((user, password)) => token.and(basic_auth(user, password)),
            None => token,
        };
        token
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "tok-123" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        server
    }

    #[tokio::test]
    async fn anonymous_bearer_token_is_fetched_once() {
        let server = bearer_server(None).await;
        let registry = client(&server);

        registry.ping().await.unwrap();
        assert_eq!(registry.tags("app").await.unwrap(), vec!["v1"]);
    }

    #[tokio::test]
    async fn token_endpoint_gets_basic_credentials() {
        let server = bearer_server(Some(("alice", "s3cret"))).await;
        client_with_login(&server).ping().await.unwrap();
    }

    #[tokio::test]
    async fn access_token_field() {
        let server = MockServer::start().await;
        let challenge = format!(r#"Bearer realm="{}/auth""#, server.uri());
        Mock::given(path("/v2/"))
            .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", challenge.as_str()))
            .mount(&server)
            .await;
        Mock::given(path("/v2/"))
            .and(bearer_token("oauth"))
            .respond_with(ResponseTemplate::new(200))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(path("/auth"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "oauth" })),
            )
            .mount(&server)
            .await;

        client(&server).ping().await.unwrap();
    }

    #[tokio::test]
    async fn rejected_token_request() {
        let server = MockServer::start().await;
        let challenge = format!(r#"Bearer realm="{}/token""#, server.uri());
        Mock::given(path("/v2/"))
            .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", challenge.as_str()))
            .mount(&server)
            .await;
        Mock::given(path("/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_with_login(&server).ping().await.unwrap_err();
        assert!(matches!(err, RegistryError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn basic_challenge_with_credentials() {
        let server = MockServer::start().await;
        Mock::given(path("/v2/"))
            .respond_with(
                ResponseTemplate::new(401).insert_header("WWW-Authenticate", r#"Basic realm="registry""#),
            )
            .mount(&server)
            .await;
        Mock::given(path("/v2/"))
            .and(basic_auth("alice", "s3cret"))
            .respond_with(ResponseTemplate::new(200))
            .with_priority(1)
            .mount(&server)
            .await;

        client_with_login(&server).ping().await.unwrap();
    }

    #[tokio::test]
    async fn basic_challenge_without_credentials() {
        let server = MockServer::start().await;
        Mock::given(path("/v2/"))
            .respond_with(
                ResponseTemplate::new(401).insert_header("WWW-Authenticate", r#"Basic realm="registry""#),
            )
            .mount(&server)
            .await;

        let err = client(&server).ping().await.unwrap_err();
        assert_eq!(err, RegistryError::AuthRequired);
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn wrong_password() {
        let server = MockServer::start().await;
        Mock::given(path("/v2/"))
            .respond_with(
                ResponseTemplate::new(401).insert_header("WWW-Authenticate", r#"Basic realm="registry""#),
            )
            .expect(2)
            .mount(&server)
            .await;

        let err = client_with_login(&server).ping().await.unwrap_err();
        assert!(matches!(err, RegistryError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn factory_pings_with_credentials() {
        let server = MockServer::start().await;
        Mock::given(path("/v2/"))
            .respond_with(
                ResponseTemplate::new(401).insert_header("WWW-Authenticate", r#"Basic realm="registry""#),
            )
            .mount(&server)
            .await;
        Mock::given(path("/v2/"))
            .and(basic_auth("alice", "s3cret"))
            .respond_with(ResponseTemplate::new(200))
            .with_priority(1)
            .mount(&server)
            .await;

        let registry = create_registry(&server.uri(), Some(Credentials::new("alice", "s3cret")), None)
            .await
            .unwrap();
        assert_eq!(registry.url(), server.uri());
    }
}
