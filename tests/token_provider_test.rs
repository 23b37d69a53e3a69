//! Integration tests for the certificate client-credentials flow

mod common;

use chrono::{Duration, Utc};
use common::read_fixture;
use docsift::adapters::graph::{
    http_client, AccessToken, CertificateCredential, GraphClient, TokenProvider,
};
use docsift::domain::{DocsiftError, ShutdownSignal};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use mockito::{Matcher, Server, ServerGuard};
use std::time::Duration as StdDuration;

const TOKEN_PATH: &str = "/tenant/oauth2/v2.0/token";
const REFRESH_WINDOW: StdDuration = StdDuration::from_secs(300);

fn token_url(server: &ServerGuard) -> String {
    format!("{}{}", server.url(), TOKEN_PATH)
}

fn credential(server: &ServerGuard, key: &str) -> Result<CertificateCredential, DocsiftError> {
    CertificateCredential::from_pem(
        "client-id",
        &token_url(server),
        "https://graph.microsoft.com/.default",
        &read_fixture("client.crt"),
        &read_fixture(key),
    )
}

fn provider(server: &ServerGuard) -> TokenProvider {
    TokenProvider::new(
        reqwest::Client::new(),
        credential(server, "client_pkcs8.key").unwrap(),
        REFRESH_WINDOW,
    )
}

fn token_body(token: &str, token_type: &str, expires_in: i64) -> String {
    serde_json::json!({
        "access_token": token,
        "token_type": token_type,
        "expires_in": expires_in,
    })
    .to_string()
}

#[tokio::test]
async fn test_token_is_fetched_once_and_cached() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", TOKEN_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("client_id".into(), "client-id".into()),
            Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
            Matcher::UrlEncoded(
                "client_assertion_type".into(),
                "urn:ietf:params:oauth:client-assertion-type:jwt-bearer".into(),
            ),
            Matcher::UrlEncoded(
                "scope".into(),
                "https://graph.microsoft.com/.default".into(),
            ),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(token_body("tok-1", "Bearer", 3600))
        .expect(1)
        .create_async()
        .await;

    let provider = provider(&server);
    let signal = ShutdownSignal::never();

    let first = provider.get_token(&signal).await.unwrap();
    let second = provider.get_token(&signal).await.unwrap();

    assert_eq!(first.bearer(), "Bearer tok-1");
    assert_eq!(second.bearer(), "Bearer tok-1");
    assert_eq!(first.expires_at(), second.expires_at());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_token_inside_refresh_window_is_replaced() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", TOKEN_PATH)
        .with_status(200)
        .with_body(token_body("fresh", "bearer", 3600))
        .expect(1)
        .create_async()
        .await;

    let provider = provider(&server);
    let stale = AccessToken::new("stale", Utc::now() + Duration::seconds(60));
    provider.set_cached(stale.clone()).await;

    let token = provider.get_token(&ShutdownSignal::never()).await.unwrap();
    assert_eq!(token.bearer(), "Bearer fresh");
    assert!(token.expires_at() > stale.expires_at());
    assert!(token.expires_at() > Utc::now() + Duration::seconds(3000));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_token_outside_refresh_window_is_reused() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", TOKEN_PATH)
        .expect(0)
        .create_async()
        .await;

    let provider = provider(&server);
    provider
        .set_cached(AccessToken::new("cached", Utc::now() + Duration::hours(1)))
        .await;

    let token = provider.get_token(&ShutdownSignal::never()).await.unwrap();
    assert_eq!(token.bearer(), "Bearer cached");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_token_endpoint_error_is_authentication_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", TOKEN_PATH)
        .with_status(401)
        .with_body(r#"{"error":"invalid_client"}"#)
        .create_async()
        .await;

    let err = provider(&server)
        .get_token(&ShutdownSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, DocsiftError::Authentication(_)));
    assert!(err.to_string().contains("invalid_client"));
}

#[tokio::test]
async fn test_non_bearer_token_type_is_rejected() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", TOKEN_PATH)
        .with_status(200)
        .with_body(token_body("tok", "mac", 3600))
        .create_async()
        .await;

    let err = provider(&server)
        .get_token(&ShutdownSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, DocsiftError::Authentication(_)));
    assert!(err.to_string().contains("mac"));
}

#[tokio::test]
async fn test_cancelled_signal_aborts_fetch() {
    let server = Server::new_async().await;
    let (tx, signal) = ShutdownSignal::channel();
    tx.send(true).unwrap();

    let err = provider(&server).get_token(&signal).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_client_assertion_header_and_claims() {
    let server = Server::new_async().await;
    let credential = credential(&server, "client_pkcs8.key").unwrap();
    let assertion = credential.client_assertion().unwrap();

    let header = jsonwebtoken::decode_header(&assertion).unwrap();
    assert_eq!(header.alg, Algorithm::RS256);
    assert_eq!(header.typ.as_deref(), Some("JWT"));
    assert_eq!(header.x5t.as_deref(), Some(credential.thumbprint()));
    // unpadded base64url of a 20-byte digest
    assert_eq!(credential.thumbprint().len(), 27);
    assert!(!credential.thumbprint().contains(['=', '+', '/']));

    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;
    let claims = jsonwebtoken::decode::<serde_json::Value>(
        &assertion,
        &DecodingKey::from_secret(&[]),
        &validation,
    )
    .unwrap()
    .claims;

    assert_eq!(claims["aud"], token_url(&server));
    assert_eq!(claims["iss"], "client-id");
    assert_eq!(claims["sub"], "client-id");
    let nbf = claims["nbf"].as_i64().unwrap();
    let exp = claims["exp"].as_i64().unwrap();
    assert_eq!(exp - nbf, 300);
    assert!(uuid::Uuid::parse_str(claims["jti"].as_str().unwrap()).is_ok());

    let other = credential.client_assertion().unwrap();
    assert_ne!(assertion, other);
}

#[tokio::test]
async fn test_rsa_key_encodings_are_accepted() {
    let server = Server::new_async().await;
    let pkcs1 = credential(&server, "client_pkcs1.key").unwrap();
    let pkcs8 = credential(&server, "client_pkcs8.key").unwrap();
    assert_eq!(pkcs1.thumbprint(), pkcs8.thumbprint());
    assert!(pkcs1.client_assertion().is_ok());
}

#[tokio::test]
async fn test_non_rsa_key_is_configuration_error() {
    let server = Server::new_async().await;
    let err = credential(&server, "ec_pkcs8.key").err().unwrap();
    assert!(matches!(err, DocsiftError::Configuration(_)));
}

#[tokio::test]
async fn test_client_from_config_authenticates_requests() {
    let mut server = Server::new_async().await;
    let scratch = tempfile::TempDir::new().unwrap();
    let config = common::config(&server.url(), scratch.path());

    let token = server
        .mock("POST", TOKEN_PATH)
        .with_status(200)
        .with_body(token_body("issued", "Bearer", 3600))
        .expect(1)
        .create_async()
        .await;
    let listing = server
        .mock("GET", "/drives/drive/root/children")
        .match_header("authorization", "Bearer issued")
        .with_status(200)
        .with_body(r#"{"value":[{"id":"y1","name":"2024","folder":{}}]}"#)
        .expect(2)
        .create_async()
        .await;

    assert!(http_client(&config).is_ok());
    let client = GraphClient::from_config(&config).unwrap();
    let signal = ShutdownSignal::never();
    let first = client.list_root(&signal).await.unwrap();
    let second = client.list_root(&signal).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first[0].name, "2024");
    assert!(first[0].is_folder);
    token.assert_async().await;
    listing.assert_async().await;
}
