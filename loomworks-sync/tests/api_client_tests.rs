use loomworks_sync::{RemoteStore, RestRowStore, SyncConfig, SyncError};
use loomworks_types::{EntityKind, OwnerId};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> RestRowStore {
    RestRowStore::new(&SyncConfig::for_base_url(server.uri()))
}

fn owner() -> OwnerId {
    OwnerId::new("owner-1")
}

#[tokio::test]
async fn list_fetches_owner_scoped_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/mills"))
        .and(query_param("owner_id", "eq.owner-1"))
        .and(header("apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "1", "name": "Arun" },
            { "id": "2", "name": "Kovai" },
        ])))
        .mount(&server)
        .await;

    let rows = client(&server)
        .list(EntityKind::Mill, &owner())
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "1");
    assert_eq!(rows[1].get_str("name"), Some("Kovai"));
}

#[tokio::test]
async fn insert_returns_the_server_representation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/purchase_orders"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({ "po_number": "PO-104", "owner_id": "owner-1" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([{ "id": "srv-9", "po_number": "PO-104" }])),
        )
        .mount(&server)
        .await;

    let record = client(&server)
        .insert(
            EntityKind::PurchaseOrder,
            &owner(),
            &json!({ "po_number": "PO-104" }),
        )
        .await
        .unwrap();

    assert_eq!(record.id, "srv-9");
}

#[tokio::test]
async fn insert_without_representation_is_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/mills"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = client(&server)
        .insert(EntityKind::Mill, &owner(), &json!({ "name": "Arun" }))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::RemoteRejection { .. }));
}

#[tokio::test]
async fn update_patches_the_row_matching_id_and_owner() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/mills"))
        .and(query_param("id", "eq.7"))
        .and(query_param("owner_id", "eq.owner-1"))
        .and(body_json(json!({ "name": "Kovai" })))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client(&server)
        .update(EntityKind::Mill, &owner(), "7", &json!({ "name": "Kovai" }))
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_targets_the_row_matching_id_and_owner() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/quality_records"))
        .and(query_param("id", "eq.7"))
        .and(query_param("owner_id", "eq.owner-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client(&server)
        .delete(EntityKind::QualityRecord, &owner(), "7")
        .await
        .unwrap();
}

#[tokio::test]
async fn http_failure_status_maps_to_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/mills"))
        .respond_with(ResponseTemplate::new(403).set_body_string("row-level security"))
        .mount(&server)
        .await;

    let err = client(&server)
        .list(EntityKind::Mill, &owner())
        .await
        .unwrap_err();

    match err {
        SyncError::RemoteRejection { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "row-level security");
        }
        other => panic!("expected rejection, got {other}"),
    }
}

#[tokio::test]
async fn unreachable_host_maps_to_connectivity() {
    let config = SyncConfig::for_base_url("http://127.0.0.1:1");
    let err = RestRowStore::new(&config)
        .list(EntityKind::Mill, &owner())
        .await
        .unwrap_err();

    assert!(err.is_connectivity(), "got {err}");
}
