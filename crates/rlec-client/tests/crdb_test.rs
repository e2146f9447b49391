// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Replicated database (CRDB) tests against a mock cluster.

use std::time::Duration;

use serde_json::{Map, Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rlec_client::{ApiClient, ClientConfig, ClientError, DatabaseId, PeerCluster};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(
        ClientConfig::new(server.uri(), "admin@example.com", "secret")
            .with_polling_interval(Duration::from_millis(10)),
    )
    .expect("failed to build client")
}

fn settings(raw: Value) -> Map<String, Value> {
    raw.as_object().unwrap().clone()
}

fn peers() -> Vec<PeerCluster> {
    vec![
        PeerCluster {
            name: "cluster1.example.com".to_string(),
            address: "cluster1.example.com".to_string(),
            username: "user1".to_string(),
            password: "pass1".to_string(),
        },
        PeerCluster {
            name: "cluster2.example.com".to_string(),
            address: "10.0.0.5".to_string(),
            username: "user2".to_string(),
            password: "pass2".to_string(),
        },
    ]
}

#[tokio::test]
async fn test_create_crdb_waits_for_the_task_to_finish() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/crdbs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "task-7",
            "crdb_guid": "guid-1234-abcd",
            "status": "queued",
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/crdb_tasks/task-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "task-7",
            "status": "running",
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/crdb_tasks/task-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "task-7",
            "status": "finished",
        })))
        .mount(&server)
        .await;

    // Credential resolution scans the full database list for the GUID.
    Mock::given(method("GET"))
        .and(path("/v1/bdbs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "uid": 3,
                "status": "active",
                "crdt_guid": "",
                "dns_address_master": "other.example.com:12000",
            },
            {
                "uid": 5,
                "status": "active",
                "crdt_guid": "guid-1234-abcd",
                "authentication_redis_pass": "crdb-pass",
                "endpoints": [
                    {"dns_name": "crdb.example.com", "port": 12005, "addr": ["10.0.0.5"]},
                ],
            },
        ])))
        .mount(&server)
        .await;

    let readiness = client(&server)
        .create_crdb(settings(json!({"name": "mydb", "memory_size": 1024})), &peers())
        .await
        .unwrap();
    let credentials = readiness.await.unwrap();

    assert_eq!(
        credentials.uid,
        DatabaseId::Crdb("guid-1234-abcd".to_string())
    );
    assert_eq!(credentials.host, "crdb.example.com");
    assert_eq!(credentials.port, 12005);
    assert_eq!(credentials.ip_list, vec!["10.0.0.5".to_string()]);
    assert_eq!(credentials.password, "crdb-pass");
}

#[tokio::test]
async fn test_create_crdb_requires_a_name() {
    let server = MockServer::start().await;

    let err = client(&server)
        .create_crdb(settings(json!({"memory_size": 1024})), &peers())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidSettings(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_crdb_builds_one_instance_per_peer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/crdbs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "task-1",
            "crdb_guid": "guid-1",
            "status": "queued",
        })))
        .mount(&server)
        .await;

    // A long polling interval keeps the background poller quiet for the
    // duration of the test.
    let client = ApiClient::new(
        ClientConfig::new(server.uri(), "admin@example.com", "secret")
            .with_polling_interval(Duration::from_secs(60)),
    )
    .unwrap();

    let _readiness = client
        .create_crdb(settings(json!({"name": "mydb", "memory_size": 2048})), &peers())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let body: Value = serde_json::from_slice(&post.body).unwrap();

    assert_eq!(body["name"], json!("mydb"));
    assert_eq!(body["default_db_config"]["memory_size"], json!(2048));

    let instances = body["instances"].as_array().unwrap();
    assert_eq!(instances.len(), 2);
    assert_eq!(
        instances[0]["cluster"]["url"],
        json!("http://cluster1.example.com:8080")
    );
    assert_eq!(
        instances[0]["cluster"]["credentials"]["username"],
        json!("user1")
    );
    assert_eq!(
        instances[1]["cluster"]["name"],
        json!("cluster2.example.com")
    );
    assert_eq!(instances[1]["cluster"]["url"], json!("http://10.0.0.5:8080"));
}

#[tokio::test]
async fn test_create_crdb_surfaces_cluster_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/crdbs"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "cluster_name": "cluster1",
            "error_code": "quorum_lost",
            "description": "not enough participating clusters",
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_crdb(settings(json!({"name": "mydb"})), &peers())
        .await
        .unwrap_err();

    match err {
        ClientError::RemoteRejected(message) => {
            assert_eq!(message, "not enough participating clusters");
        }
        other => panic!("expected RemoteRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_crdb_does_not_wait_for_the_task() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/crdbs/guid-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "task-3",
            "crdb_guid": "guid-1",
            "status": "queued",
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete_crdb("guid-1").await.unwrap();

    let polled = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .any(|r| r.url.path().starts_with("/v1/crdb_tasks"));
    assert!(!polled);
}

#[tokio::test]
async fn test_crdb_credentials_reports_pending_databases() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/bdbs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"uid": 5, "status": "pending", "crdt_guid": "guid-1"},
        ])))
        .mount(&server)
        .await;

    let err = client(&server).crdb_credentials("guid-1").await.unwrap_err();
    assert!(matches!(err, ClientError::NotActive));
}

#[tokio::test]
async fn test_crdb_credentials_requires_a_matching_database() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/bdbs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"uid": 5, "status": "active", "crdt_guid": "someone-else"},
        ])))
        .mount(&server)
        .await;

    let err = client(&server).crdb_credentials("guid-1").await.unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)));
}
