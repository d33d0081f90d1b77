use base64::{Engine, engine::general_purpose::STANDARD};
use plantao_sync::{GitHubClient, GitHubConfig, Publish};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Config defaults ─────────────────────────────────────────────

#[test]
fn config_defaults() {
    let cfg = GitHubConfig::default();
    assert_eq!(cfg.api_base_url, "https://api.github.com");
    assert_eq!(cfg.branch, "main");
    assert_eq!(cfg.path_in_repo, "data/plantao.db");
    assert_eq!(cfg.timeout_secs, 60);
    assert!(cfg.owner.is_empty());
    assert!(cfg.token.is_none());
}

#[test]
fn config_serde_roundtrip() {
    let cfg = GitHubConfig {
        owner: "clinica".to_string(),
        repo: "plantao-dados".to_string(),
        ..Default::default()
    };
    let json = serde_json::to_string(&cfg).unwrap();
    let back: GitHubConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.owner, "clinica");
    assert_eq!(back.repo, "plantao-dados");
    assert_eq!(back.branch, "main");
}

fn mock_config(server: &MockServer) -> GitHubConfig {
    GitHubConfig {
        owner: "clinica".to_string(),
        repo: "plantao-dados".to_string(),
        path_in_repo: "data/plantao.db".to_string(),
        branch: "main".to_string(),
        api_base_url: server.uri(),
        token: Some("ghp_teste".to_string()),
        timeout_secs: 5,
    }
}

const CONTENTS_PATH: &str = "/repos/clinica/plantao-dados/contents/data/plantao.db";

// ── fetch ───────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_decodes_wrapped_base64_and_revision() {
    let server = MockServer::start().await;

    // The host wraps base64 bodies in newlines every 60 chars.
    let encoded = STANDARD.encode(b"conteudo do banco de dados local, em bytes crus");
    let wrapped = format!("{}\n{}\n", &encoded[..20], &encoded[20..]);

    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": wrapped,
            "sha": "rev-abc123"
        })))
        .mount(&server)
        .await;

    let client = GitHubClient::new(mock_config(&server));
    let snapshot = client.fetch().await.unwrap().unwrap();
    assert_eq!(snapshot.revision, "rev-abc123");
    assert_eq!(
        snapshot.bytes,
        b"conteudo do banco de dados local, em bytes crus"
    );
}

#[tokio::test]
async fn fetch_not_found_is_a_clean_bootstrap_signal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = GitHubClient::new(mock_config(&server));
    assert!(client.fetch().await.unwrap().is_none());
}

#[tokio::test]
async fn fetch_server_error_is_transport_not_notfound() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("host em manutenção"))
        .mount(&server)
        .await;

    let client = GitHubClient::new(mock_config(&server));
    let err = client.fetch().await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("500"), "{msg}");
    assert!(msg.contains("host em manutenção"), "{msg}");
}

#[tokio::test]
async fn fetch_to_file_writes_bytes_and_returns_revision() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": STANDARD.encode(b"bytes remotos"),
            "sha": "rev-1"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("remoto.db");
    let client = GitHubClient::new(mock_config(&server));

    let revision = client.fetch_to_file(&dest).await.unwrap();
    assert_eq!(revision.as_deref(), Some("rev-1"));
    assert_eq!(std::fs::read(&dest).unwrap(), b"bytes remotos");
}

// ── publish ─────────────────────────────────────────────────────

#[tokio::test]
async fn publish_with_token_sends_conditional_update() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(serde_json::json!({
            "sha": "rev-antiga",
            "branch": "main"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": {"sha": "rev-nova"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::new(mock_config(&server));
    let result = client
        .publish(b"bytes", Some("rev-antiga"), "Atualização")
        .await
        .unwrap();
    assert_eq!(
        result,
        Publish::Published {
            revision: "rev-nova".to_string(),
            status: 200
        }
    );
}

#[tokio::test]
async fn publish_without_token_creates_and_gets_201() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "content": {"sha": "rev-criada"}
        })))
        .mount(&server)
        .await;

    let client = GitHubClient::new(mock_config(&server));
    let result = client.publish(b"bytes", None, "Primeira publicação").await.unwrap();
    let Publish::Published { revision, status } = result else {
        panic!("expected Published, got {result:?}");
    };
    assert_eq!(revision, "rev-criada");
    assert_eq!(status, 201);

    // The create payload must not carry a sha key at all.
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("sha").is_none());
}

#[tokio::test]
async fn publish_stale_token_returns_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(
            ResponseTemplate::new(409).set_body_string("plantao.db does not match rev-antiga"),
        )
        .mount(&server)
        .await;

    let client = GitHubClient::new(mock_config(&server));
    let result = client
        .publish(b"bytes", Some("rev-antiga"), "Atualização")
        .await
        .unwrap();
    let Publish::Conflict { status, detail } = result else {
        panic!("expected Conflict, got {result:?}");
    };
    assert_eq!(status, 409);
    assert!(detail.contains("rev-antiga"));
}

#[tokio::test]
async fn publish_other_statuses_are_rejections_with_verbatim_body() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(
            ResponseTemplate::new(422).set_body_string(r#"{"message":"Invalid request"}"#),
        )
        .mount(&server)
        .await;

    let client = GitHubClient::new(mock_config(&server));
    let result = client.publish(b"bytes", None, "Atualização").await.unwrap();
    let Publish::Rejected { status, detail } = result else {
        panic!("expected Rejected, got {result:?}");
    };
    assert_eq!(status, 422);
    assert_eq!(detail, r#"{"message":"Invalid request"}"#);
}

#[tokio::test]
async fn publish_empty_payload_is_refused_before_any_request() {
    let server = MockServer::start().await;

    let client = GitHubClient::new(mock_config(&server));
    let result = client.publish(b"", Some("rev"), "Atualização").await.unwrap();
    let Publish::Rejected { status, detail } = result else {
        panic!("expected Rejected, got {result:?}");
    };
    assert_eq!(status, 422);
    assert!(detail.contains("empty"));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn publish_sends_bearer_credential() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(wiremock::matchers::header("Authorization", "Bearer ghp_teste"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": {"sha": "rev-nova"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::new(mock_config(&server));
    client.publish(b"bytes", None, "Atualização").await.unwrap();
}

// ── current_revision ────────────────────────────────────────────

#[tokio::test]
async fn current_revision_probes_without_content() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sha": "rev-atual"
        })))
        .mount(&server)
        .await;

    let client = GitHubClient::new(mock_config(&server));
    assert_eq!(
        client.current_revision().await.unwrap().as_deref(),
        Some("rev-atual")
    );
}

#[tokio::test]
async fn current_revision_none_when_nothing_published() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = GitHubClient::new(mock_config(&server));
    assert_eq!(client.current_revision().await.unwrap(), None);
}
