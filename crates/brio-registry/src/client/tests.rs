//! Unit tests for registry sources

use super::*;

use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, header};

fn client_for(server: &MockServer) -> HttpRegistry {
    let settings = Settings {
        registry: server.uri(),
        ..Settings::default()
    };
    HttpRegistry::with_config(&settings).unwrap()
}

#[tokio::test]
async fn test_registry_client_creation() {
    let client = HttpRegistry::new().unwrap();
    assert_eq!(client.base_url(), "https://registry.npmjs.org");
}

#[tokio::test]
async fn test_encode_package_name() {
    let client = HttpRegistry::new().unwrap();

    assert_eq!(client.encode_package_name("libA"), "libA");
    assert_eq!(client.encode_package_name("@embedded/hal"), "@embedded%2fhal");
}

#[tokio::test]
async fn test_fetch_package_success() {
    let mock_server = MockServer::start().await;

    let mock_response = serde_json::json!({
        "name": "libA",
        "dist-tags": { "latest": "1.4.2" },
        "versions": {
            "1.0.0": { "name": "libA", "version": "1.0.0" },
            "1.4.2": {
                "name": "libA",
                "version": "1.4.2",
                "dependencies": { "libC": "^0.3.0" },
                "dist": { "tarball": "https://registry.example.com/libA-1.4.2.tgz" }
            }
        }
    });

    Mock::given(method("GET"))
        .and(path("/libA"))
        .and(header("Accept", INSTALL_ACCEPT))
        .respond_with(ResponseTemplate::new(200).set_body_json(&mock_response))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let data = client.fetch_package("libA").await.unwrap();
    assert_eq!(data.name, "libA");
    assert_eq!(data.versions.len(), 2);
    assert_eq!(data.versions["1.4.2"].dependencies["libC"], "^0.3.0");
}

#[tokio::test]
async fn test_fetch_package_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    match client.fetch_package("missing").await {
        Err(BrioError::PackageNotFound { name }) => assert_eq!(name, "missing"),
        other => panic!("Expected PackageNotFound error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_package_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    match client.fetch_package("flaky").await {
        Err(BrioError::Registry { status, url }) => {
            assert_eq!(status, 503);
            assert!(url.ends_with("/flaky"));
        }
        other => panic!("Expected Registry error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_version() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/libB/2.1.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "libB",
            "version": "2.1.5",
            "dependencies": {}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/libB/9.9.9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let record = client.fetch_version("libB", "2.1.5").await.unwrap();
    assert_eq!(record.version, "2.1.5");

    assert!(matches!(
        client.fetch_version("libB", "9.9.9").await,
        Err(BrioError::PackageVersionNotFound { .. })
    ));
}

#[tokio::test]
async fn test_scoped_package_url_encoding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/@embedded%2fhal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "@embedded/hal",
            "versions": {}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let data = client.fetch_package("@embedded/hal").await.unwrap();
    assert_eq!(data.name, "@embedded/hal");
}

#[tokio::test]
async fn test_memory_registry_counts_fetches() {
    let registry = MemoryRegistry::new();
    registry
        .publish("libA", "1.0.0", &[])
        .publish("libA", "1.4.2", &[("libC", "^0.3.0")])
        .tag_latest("libA", "1.4.2");

    let data = registry.fetch_package("libA").await.unwrap();
    assert_eq!(data.versions.len(), 2);
    assert_eq!(data.dist_tags["latest"], "1.4.2");

    let record = registry.fetch_version("libA", "1.4.2").await.unwrap();
    assert_eq!(record.dependencies["libC"], "^0.3.0");

    assert!(registry.fetch_package("libZ").await.is_err());
    assert_eq!(registry.fetch_count("libA"), 2);
    assert_eq!(registry.total_fetches(), 3);
}

#[test]
fn test_shared_source_counts_once_per_fetch() {
    let registry = Arc::new(MemoryRegistry::new());
    registry.publish("libA", "1.0.0", &[]);
    let shared = Arc::clone(&registry);

    let record = tokio_test::block_on(shared.fetch_version("libA", "1.0.0"));
    tokio_test::assert_ok!(&record);
    tokio_test::assert_err!(tokio_test::block_on(shared.fetch_version("libA", "2.0.0")));

    assert_eq!(registry.fetch_count("libA"), 2);
}
