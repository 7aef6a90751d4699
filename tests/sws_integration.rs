//! End-to-end SWS scenarios (S1-S3) driven through `runtime::initialize`
//! and the in-process transport, rather than calling the server's
//! `handle` directly (the unit tests colocated with `wallet::server`
//! already cover that level).

use serde_json::json;

use secwd::config::DaemonConfig;
use secwd::runtime;
use secwd::transport::{in_process, Frame, RequestTransport};

fn write_config(dir: &tempfile::TempDir) -> DaemonConfig {
    let config_path = dir.path().join("configuration.json");
    std::fs::write(
        &config_path,
        serde_json::to_string(&json!([
            {
                "portfolio_name": "default",
                "usages": [
                    {"usage_id": "discovery_monitoring", "supported_types": ["Snmpv3"]}
                ],
                "tags": [],
                "consumers": [
                    {"client_regex": "consumer-.*", "usages": ["discovery_monitoring"]}
                ],
                "producers": [
                    {"client_regex": "producer-.*", "usages": ["discovery_monitoring"]}
                ]
            }
        ]))
        .unwrap(),
    )
    .unwrap();

    DaemonConfig {
        config_path: config_path.to_string_lossy().into_owned(),
        database_path: dir.path().join("database.json").to_string_lossy().into_owned(),
        mapping_path: dir.path().join("mapping.json").to_string_lossy().into_owned(),
        ..DaemonConfig::default()
    }
}

async fn serve_one(transport: &in_process::InProcessTransport, daemon: &runtime::Daemon) {
    let (sender, frame) = transport.recv().await.expect("channel open");
    let result = daemon.sws.handle(&sender, &frame.command, &frame.args);
    let payload = match result {
        Ok(v) => json!({"ok": v}),
        Err(e) => e.to_exception_json(),
    };
    transport.reply(&frame.correlation_id, payload).await;
}

#[tokio::test]
async fn s1_through_s3_over_in_process_transport() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);
    let daemon = runtime::initialize(&config).unwrap();

    let (transport, handle) = in_process::channel();

    let doc = json!({
        "secw_doc_name": "router-credentials",
        "secw_doc_type": "Snmpv3",
        "secw_doc_usages": ["discovery_monitoring"],
        "secw_doc_public": {
            "secw_snmpv3_security_level": 2,
            "secw_snmpv3_security_name": "n",
            "secw_snmpv3_auth_protocol": 0,
            "secw_snmpv3_priv_protocol": 1
        },
        "secw_doc_private": {
            "secw_snmpv3_auth_password": "a",
            "secw_snmpv3_priv_password": "p"
        }
    });

    // S1: create, read with secret, delete.
    handle
        .requests
        .send((
            "producer-1".to_string(),
            Frame {
                correlation_id: "1".into(),
                command: "CREATE".into(),
                args: vec![json!("default"), doc.clone()],
            },
        ))
        .unwrap();
    serve_one(&transport, &daemon).await;
    let (_, reply) = handle.replies.lock().await.recv().await.unwrap();
    let id = reply["ok"].as_str().unwrap().to_string();

    handle
        .requests
        .send((
            "consumer-1".to_string(),
            Frame {
                correlation_id: "2".into(),
                command: "GET_WITH_SECRET".into(),
                args: vec![json!("default"), json!(id)],
            },
        ))
        .unwrap();
    serve_one(&transport, &daemon).await;
    let (_, reply) = handle.replies.lock().await.recv().await.unwrap();
    assert_eq!(reply["ok"]["secw_doc_name"], "router-credentials");

    // S2: a second create with the same name collides.
    handle
        .requests
        .send((
            "producer-1".to_string(),
            Frame {
                correlation_id: "3".into(),
                command: "CREATE".into(),
                args: vec![json!("default"), doc.clone()],
            },
        ))
        .unwrap();
    serve_one(&transport, &daemon).await;
    let (_, reply) = handle.replies.lock().await.recv().await.unwrap();
    assert_eq!(reply["errorCode"], 12); // NameAlreadyExists

    // S3: a sender with no matching consumer rule is denied.
    handle
        .requests
        .send((
            "stranger".to_string(),
            Frame {
                correlation_id: "4".into(),
                command: "GET_WITH_SECRET".into(),
                args: vec![json!("default"), json!(id)],
            },
        ))
        .unwrap();
    serve_one(&transport, &daemon).await;
    let (_, reply) = handle.replies.lock().await.recv().await.unwrap();
    assert_eq!(reply["errorCode"], 10); // IllegalAccess

    // Tear down: delete succeeds for the producer that created it.
    handle
        .requests
        .send((
            "producer-1".to_string(),
            Frame {
                correlation_id: "5".into(),
                command: "DELETE".into(),
                args: vec![json!("default"), json!(id)],
            },
        ))
        .unwrap();
    serve_one(&transport, &daemon).await;
    let (_, reply) = handle.replies.lock().await.recv().await.unwrap();
    assert_eq!(reply["ok"], "OK");

    assert!(dir.path().join("database.json").exists());
}
