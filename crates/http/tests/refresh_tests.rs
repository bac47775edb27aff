//! Token refresh behavior against a mock backend

use leasedesk_http::client::error::ClientError;
use leasedesk_http::types::RegisterRequest;
use leasedesk_http::{ClientConfig, LeaseClient, Session, User};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REFRESH_DELAY: Duration = Duration::from_millis(200);

fn session() -> Session {
    Session {
        access_token: "t1".into(),
        refresh_token: Some("r1".into()),
        user: User {
            id: "u1".into(),
            email: "ana@example.com".into(),
            name: "Ana".into(),
        },
    }
}

/// Logged-in client plus a counter of login redirects
fn client_for(server: &MockServer, config: ClientConfig) -> (LeaseClient, Arc<AtomicUsize>) {
    let redirects = Arc::new(AtomicUsize::new(0));
    let counter = redirects.clone();
    let client = LeaseClient::builder()
        .config(config)
        .base_url(server.uri())
        .on_login_redirect(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();
    client.store().save(&session()).unwrap();
    (client, redirects)
}

async fn mount_people(server: &MockServer, token: &str, status: u16, expected: u64) {
    let template = if status == 200 {
        ResponseTemplate::new(200).set_body_json(json!([]))
    } else {
        ResponseTemplate::new(status).set_body_string("Token expirado")
    };
    Mock::given(method("GET"))
        .and(path("/personas"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(template)
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_refresh(server: &MockServer, template: ResponseTemplate, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/usuarios/refresh"))
        .and(body_json(json!({"refreshToken": "r1"})))
        .respond_with(template.set_delay(REFRESH_DELAY))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let mock_server = MockServer::start().await;
    mount_people(&mock_server, "t1", 401, 2).await;
    mount_people(&mock_server, "t2", 200, 2).await;
    mount_refresh(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(json!({"token": "t2"})),
        1,
    )
    .await;

    let (client, redirects) = client_for(&mock_server, ClientConfig::default());

    let (first, second) = futures::future::join(client.list_people(), client.list_people()).await;

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(client.store().access_token().unwrap().as_deref(), Some("t2"));
    assert_eq!(client.store().refresh_token().unwrap().as_deref(), Some("r1"));
    assert_eq!(redirects.load(Ordering::SeqCst), 0);
    assert!(!client.is_refreshing());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_401s_on_worker_threads() {
    let mock_server = MockServer::start().await;
    mount_people(&mock_server, "t1", 401, 8).await;
    mount_people(&mock_server, "t2", 200, 8).await;
    mount_refresh(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(json!({"token": "t2", "refreshToken": "r2"})),
        1,
    )
    .await;

    let (client, _) = client_for(&mock_server, ClientConfig::default());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.list_people().await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    // Rotated refresh token replaces the old one
    assert_eq!(client.store().refresh_token().unwrap().as_deref(), Some("r2"));
}

#[tokio::test]
async fn test_failed_refresh_rejects_every_waiter() {
    let mock_server = MockServer::start().await;
    mount_people(&mock_server, "t1", 401, 3).await;
    mount_refresh(
        &mock_server,
        ResponseTemplate::new(401).set_body_json(json!({"mensaje": "Refresh token inválido"})),
        1,
    )
    .await;

    let (client, redirects) = client_for(&mock_server, ClientConfig::default());

    let (a, b, c) = futures::future::join3(
        client.list_people(),
        client.list_people(),
        client.list_people(),
    )
    .await;

    for result in [a, b, c] {
        match result {
            Err(ClientError::RefreshFailed(failure)) => {
                assert_eq!(failure.status, Some(401));
                assert!(failure.message.contains("Refresh token inválido"));
            }
            other => panic!("expected refresh failure, got {other:?}"),
        }
    }
    assert_eq!(client.store().get().unwrap(), None);
    assert_eq!(redirects.load(Ordering::SeqCst), 1);
    assert!(!client.is_refreshing());
}

#[tokio::test]
async fn test_no_refresh_after_session_ended() {
    let mock_server = MockServer::start().await;
    mount_people(&mock_server, "t1", 401, 1).await;
    mount_refresh(&mock_server, ResponseTemplate::new(401), 1).await;

    // Unauthenticated follow-up request
    Mock::given(method("GET"))
        .and(path("/personas"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = client_for(&mock_server, ClientConfig::default());

    assert!(client.list_people().await.is_err());
    let again = client.list_people().await;
    assert!(matches!(again, Err(ClientError::AuthenticationFailed(_))));
}

#[tokio::test]
async fn test_late_401_after_failed_refresh_does_not_refresh_again() {
    let mock_server = MockServer::start().await;
    mount_people(&mock_server, "t1", 401, 1).await;
    mount_refresh(&mock_server, ResponseTemplate::new(401), 1).await;

    // Answers only after the refresh above has failed and cleared the session
    Mock::given(method("GET"))
        .and(path("/inmuebles"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string("Token expirado")
                .set_delay(REFRESH_DELAY * 2),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, redirects) = client_for(&mock_server, ClientConfig::default());

    let (people, properties) =
        futures::future::join(client.list_people(), client.list_properties()).await;

    assert!(matches!(people, Err(ClientError::RefreshFailed(ref f)) if f.status == Some(401)));
    assert!(matches!(properties, Err(ClientError::NotAuthenticated)));
    assert_eq!(redirects.load(Ordering::SeqCst), 1);
    assert_eq!(client.store().get().unwrap(), None);
}

#[tokio::test]
async fn test_session_without_refresh_token_surfaces_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/personas"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Token expirado"))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, ResponseTemplate::new(200), 0).await;

    let (client, redirects) = client_for(&mock_server, ClientConfig::default());
    client
        .store()
        .save(&Session {
            refresh_token: None,
            ..session()
        })
        .unwrap();

    let result = client.list_people().await;
    assert!(matches!(result, Err(ClientError::AuthenticationFailed(ref m)) if m == "Token expirado"));
    assert_eq!(client.store().get().unwrap(), None);
    assert_eq!(redirects.load(Ordering::SeqCst), 1);

    // Without a session there is nothing to end
    let again = client.list_people().await;
    assert!(matches!(again, Err(ClientError::AuthenticationFailed(_))));
    assert_eq!(redirects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_register_rejection_reaches_caller() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/usuarios/register"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"mensaje": "Registro no permitido"})),
        )
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, ResponseTemplate::new(200), 0).await;

    let (client, redirects) = client_for(&mock_server, ClientConfig::default());
    let registration = RegisterRequest {
        name: "Ana".into(),
        email: "ana@example.com".into(),
        password: "secret".into(),
    };

    // With a stored session the session is left alone
    let result = client.register(&registration).await;
    assert!(
        matches!(result, Err(ClientError::AuthenticationFailed(ref m)) if m == "Registro no permitido")
    );
    assert!(client.is_authenticated());

    client.logout().unwrap();
    let result = client.register(&registration).await;
    assert!(
        matches!(result, Err(ClientError::AuthenticationFailed(ref m)) if m == "Registro no permitido")
    );
    assert_eq!(redirects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_retried_request_is_not_retried_again() {
    let mock_server = MockServer::start().await;
    mount_people(&mock_server, "t1", 401, 1).await;
    mount_people(&mock_server, "t2", 401, 1).await;
    mount_refresh(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(json!({"token": "t2"})),
        1,
    )
    .await;

    let (client, redirects) = client_for(&mock_server, ClientConfig::default());

    let result = client.list_people().await;
    assert!(matches!(result, Err(ClientError::AuthenticationFailed(ref m)) if m == "Token expirado"));
    // The refresh itself succeeded, so the session stays
    assert_eq!(client.store().access_token().unwrap().as_deref(), Some("t2"));
    assert_eq!(redirects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_refresh_endpoint_401_does_not_recurse() {
    let mock_server = MockServer::start().await;
    mount_refresh(&mock_server, ResponseTemplate::new(401), 1).await;

    let (client, redirects) = client_for(&mock_server, ClientConfig::default());

    let result = client.refresh_session().await;
    assert!(matches!(result, Err(ClientError::RefreshFailed(_))));
    assert_eq!(redirects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refresh_timeout_ends_session() {
    let mock_server = MockServer::start().await;
    mount_people(&mock_server, "t1", 401, 1).await;

    Mock::given(method("POST"))
        .and(path("/usuarios/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "t2"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let config = ClientConfig {
        refresh_timeout_secs: 1,
        ..ClientConfig::default()
    };
    let (client, redirects) = client_for(&mock_server, config);

    let result = client.list_people().await;
    assert!(matches!(result, Err(ClientError::RefreshFailed(_))));
    assert_eq!(client.store().get().unwrap(), None);
    assert_eq!(redirects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_logout_during_refresh_discards_result() {
    let mock_server = MockServer::start().await;
    mount_refresh(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(json!({"token": "t2"})),
        1,
    )
    .await;

    let (client, redirects) = client_for(&mock_server, ClientConfig::default());

    let refreshing = client.clone();
    let refresh = tokio::spawn(async move { refreshing.refresh_session().await });
    tokio::time::sleep(REFRESH_DELAY / 4).await;
    client.logout().unwrap();

    assert!(refresh.await.unwrap().is_err());
    assert_eq!(client.store().get().unwrap(), None);
    assert_eq!(redirects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_auto_refresh_keeps_token_fresh() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/usuarios/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t2"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ClientConfig {
        auto_refresh_interval_secs: 1,
        ..ClientConfig::default()
    };
    let (client, _) = client_for(&mock_server, config);

    assert!(client.start_auto_refresh());
    assert!(!client.start_auto_refresh());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(client.store().access_token().unwrap().as_deref(), Some("t2"));

    client.logout().unwrap();
    assert!(!client.is_auto_refreshing());
    assert_eq!(client.store().get().unwrap(), None);
}

#[tokio::test]
async fn test_auto_refresh_failure_logs_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/usuarios/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ClientConfig {
        auto_refresh_interval_secs: 1,
        ..ClientConfig::default()
    };
    let (client, _) = client_for(&mock_server, config);
    client.start_auto_refresh();

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(client.store().get().unwrap(), None);
    assert!(!client.is_auto_refreshing());
}
