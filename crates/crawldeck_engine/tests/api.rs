use std::sync::Arc;
use std::time::Duration;

use crawldeck_engine::{
    ApiSettings, BrokenLinkRecord, ConsoleApi, FailureKind, LinkCountRecord, NoToken,
    ReqwestApiClient, TokenSource, UrlRecord,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct StaticToken(Option<&'static str>);

impl TokenSource for StaticToken {
    fn bearer(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

fn client(server: &MockServer, token: Option<&'static str>) -> ReqwestApiClient {
    let settings = ApiSettings {
        base_url: format!("{}/api", server.uri()),
        ..ApiSettings::default()
    };
    ReqwestApiClient::new(settings, Arc::new(StaticToken(token))).expect("client")
}

async fn authorization_headers(server: &MockServer) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| {
            request
                .headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
        .collect()
}

#[tokio::test]
async fn login_posts_credentials_without_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({ "email": "a@b.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "abc.def.ghi" })))
        .expect(1)
        .mount(&server)
        .await;

    let token = client(&server, Some("old")).login("a@b.com", "pw").await.unwrap();
    assert_eq!(token, "abc.def.ghi");
    assert_eq!(authorization_headers(&server).await, vec![None]);
}

#[tokio::test]
async fn rejected_login_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid credentials" })))
        .mount(&server)
        .await;

    let err = client(&server, None).login("a@b.com", "wrong").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(401));
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.server_message(), Some("Invalid credentials"));
}

#[tokio::test]
async fn register_sends_all_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register"))
        .and(body_json(json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "password": "Engine#1843",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "token": "t" })))
        .mount(&server)
        .await;

    let token = client(&server, None)
        .register("Ada", "Lovelace", "ada@example.com", "Engine#1843")
        .await
        .unwrap();
    assert_eq!(token, "t");
}

#[tokio::test]
async fn conflict_on_register_is_a_status_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .register("Ada", "Lovelace", "ada@example.com", "Engine#1843")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(409));
    assert_eq!(err.server_message(), None);
}

#[tokio::test]
async fn list_urls_sends_bearer_and_reads_capitalized_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/urls"))
        .and(header("authorization", "Bearer stored-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "ID": 5, "URL": "https://example.com", "Status": "queued", "UpdatedAt": "2024-05-01T10:00:00Z" },
            { "ID": 6, "URL": "https://example.org", "Status": "done", "UpdatedAt": null }
        ])))
        .mount(&server)
        .await;

    let rows = client(&server, Some("stored-token")).list_urls().await.unwrap();
    assert_eq!(
        rows,
        vec![
            UrlRecord {
                id: 5,
                url: "https://example.com".to_string(),
                status: "queued".to_string(),
                updated_at: Some("2024-05-01T10:00:00Z".to_string()),
            },
            UrlRecord {
                id: 6,
                url: "https://example.org".to_string(),
                status: "done".to_string(),
                updated_at: None,
            },
        ]
    );
}

#[tokio::test]
async fn missing_credential_still_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/urls"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Missing or invalid Authorization header" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ReqwestApiClient::new(
        ApiSettings {
            base_url: format!("{}/api/", server.uri()),
            ..ApiSettings::default()
        },
        Arc::new(NoToken),
    )
    .unwrap();
    let err = api.list_urls().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(401));
    assert_eq!(authorization_headers(&server).await, vec![None]);
}

#[tokio::test]
async fn admin_commands_hit_their_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/urls/start"))
        .and(body_json(json!({ "url_ids": [5, 7] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/urls/stop"))
        .and(body_json(json!({ "url_ids": [2] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/urls"))
        .and(body_json(json!({ "url": "https://new.example.com" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ID": 9 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/urls/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "URL deleted successfully" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, Some("admin-token"));
    api.start_urls(&[5, 7]).await.unwrap();
    api.stop_urls(&[2]).await.unwrap();
    api.add_url("https://new.example.com").await.unwrap();
    api.delete_url(3).await.unwrap();

    let headers = authorization_headers(&server).await;
    assert_eq!(headers.len(), 4);
    assert!(headers
        .iter()
        .all(|value| value.as_deref() == Some("Bearer admin-token")));
}

#[tokio::test]
async fn duplicate_url_is_a_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/urls"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "error": "URL already exists" })))
        .mount(&server)
        .await;

    let err = client(&server, Some("t")).add_url("example.com").await.unwrap_err();
    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
async fn analytics_endpoints_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/urls/4/link-count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "internal": 12, "external": 3 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/urls/4/broken-links"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "href": "https://example.com/gone", "status_code": 404 }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/urls/8/broken-links"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let api = client(&server, Some("t"));
    assert_eq!(
        api.link_count(4).await.unwrap(),
        LinkCountRecord {
            internal: 12,
            external: 3
        }
    );
    assert_eq!(
        api.broken_links(4).await.unwrap(),
        vec![BrokenLinkRecord {
            href: "https://example.com/gone".to_string(),
            status_code: 404,
        }]
    );
    assert!(api.broken_links(8).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_body_is_a_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/urls"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server, Some("t")).list_urls().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/urls"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!([])),
        )
        .mount(&server)
        .await;

    let settings = ApiSettings {
        base_url: format!("{}/api", server.uri()),
        request_timeout: Duration::from_millis(50),
        ..ApiSettings::default()
    };
    let api = ReqwestApiClient::new(settings, Arc::new(NoToken)).unwrap();
    let err = api.list_urls().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[test]
fn unparsable_base_url_is_rejected() {
    let settings = ApiSettings {
        base_url: "not a url".to_string(),
        ..ApiSettings::default()
    };
    let err = ReqwestApiClient::new(settings, Arc::new(NoToken)).err().unwrap();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
