use eln_proof_testkit::{StubResponse, StubServer};
use eln_proof_tsa::{
    Error, TimeStampReq, TimestampConfig, TimestampRequestBuilder, TimestampTransport, TsaClient,
    DEFAULT_USER_AGENT,
};
use eln_proof_types::Secret;
use std::time::Duration;
use x509_cert::der::Decode;

const TSR: &[u8] = b"\x30\x03\x02\x01\x00";

fn request_der() -> Vec<u8> {
    TimestampRequestBuilder::new()
        .build(&"5a".repeat(32), "sha256")
        .unwrap()
        .as_der()
        .to_vec()
}

async fn tsa(response: StubResponse) -> StubServer {
    StubServer::start([("/tsr", response)]).await.unwrap()
}

#[tokio::test]
async fn test_posts_binary_request_with_timestamp_headers() {
    let server = tsa(StubResponse::ok("application/timestamp-reply", TSR)).await;
    let config = TimestampConfig::new(server.url("/tsr"), "/certs/tsa.pem");
    let der = request_der();

    let response = TsaClient::new().timestamp(&der, &config).await.unwrap();
    assert_eq!(response, TSR);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.header("content-type"), Some("application/timestamp-query"));
    assert_eq!(request.header("content-transfer-encoding"), Some("base64"));
    assert_eq!(request.header("authorization"), None);

    // The body is raw DER despite the transfer-encoding header.
    assert_eq!(request.body, der);
    let decoded = TimeStampReq::from_der(&request.body).unwrap();
    assert!(decoded.nonce.is_none());
}

#[tokio::test]
async fn test_user_agent_defaults_and_overrides() {
    let server = tsa(StubResponse::ok("application/timestamp-reply", TSR)).await;
    let config = TimestampConfig::new(server.url("/tsr"), "/certs/tsa.pem");

    TsaClient::new().timestamp(&request_der(), &config).await.unwrap();
    TsaClient::new()
        .with_user_agent("lab-notebook/2.1")
        .timestamp(&request_der(), &config)
        .await
        .unwrap();

    let requests = server.requests();
    assert!(DEFAULT_USER_AGENT.starts_with("eln-proof/"));
    assert_eq!(requests[0].header("user-agent"), Some(DEFAULT_USER_AGENT));
    assert_eq!(requests[1].header("user-agent"), Some("lab-notebook/2.1"));
}

#[tokio::test]
async fn test_basic_auth_only_with_both_credentials() {
    let server = tsa(StubResponse::ok("application/timestamp-reply", TSR)).await;
    let config = TimestampConfig::new(server.url("/tsr"), "/certs/tsa.pem")
        .with_credentials(Some("alice".into()), Some(Secret::new("s3cret")))
        .unwrap();

    TsaClient::new().timestamp(&request_der(), &config).await.unwrap();

    let requests = server.requests();
    assert_eq!(
        requests[0].header("authorization"),
        Some("Basic YWxpY2U6czNjcmV0")
    );
}

#[tokio::test]
async fn test_non_success_status_is_unreachable() {
    let server = tsa(StubResponse::status(401)).await;
    let config = TimestampConfig::new(server.url("/tsr"), "/certs/tsa.pem");

    let err = TsaClient::new()
        .timestamp(&request_der(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TsaUnreachable(ref m) if m.contains("401")), "{err}");
    assert_eq!(server.hits("/tsr"), 1);
}

#[tokio::test]
async fn test_empty_body_is_unreachable() {
    let server = tsa(StubResponse::ok("application/timestamp-reply", Vec::new())).await;
    let config = TimestampConfig::new(server.url("/tsr"), "/certs/tsa.pem");

    let err = TsaClient::new()
        .timestamp(&request_der(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TsaUnreachable(_)));
}

#[tokio::test]
async fn test_slow_tsa_times_out() {
    let server = tsa(
        StubResponse::ok("application/timestamp-reply", TSR).with_delay(Duration::from_secs(3)),
    )
    .await;
    let config = TimestampConfig::new(server.url("/tsr"), "/certs/tsa.pem")
        .with_timeout(Duration::from_millis(200));

    let started = std::time::Instant::now();
    let err = TsaClient::new()
        .timestamp(&request_der(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TsaUnreachable(_)));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_connection_refused_is_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = TimestampConfig::new(format!("http://{}/tsr", addr), "/certs/tsa.pem");
    let err = TsaClient::new()
        .send(&request_der(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TsaUnreachable(_)));
}

#[tokio::test]
async fn test_requests_go_through_configured_proxy() {
    let proxy = tsa(StubResponse::ok("application/timestamp-reply", TSR)).await;
    let config = TimestampConfig::new("http://tsa.invalid/tsr", "/certs/tsa.pem")
        .with_proxy(Some(proxy.base_url().to_string()));

    let response = TsaClient::new().timestamp(&request_der(), &config).await.unwrap();
    assert_eq!(response, TSR);

    let requests = proxy.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "http://tsa.invalid/tsr");
}

#[tokio::test]
async fn test_invalid_proxy_is_a_config_error() {
    let config = TimestampConfig::new("http://tsa.invalid/tsr", "/certs/tsa.pem")
        .with_proxy(Some("::not a url::".to_string()));

    let err = TsaClient::new()
        .timestamp(&request_der(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
