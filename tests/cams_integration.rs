//! End-to-end CAMS scenario (S4) driven through `runtime::initialize`
//! and the in-process transport.

use serde_json::json;

use secwd::config::DaemonConfig;
use secwd::runtime;
use secwd::transport::{in_process, Frame, RequestTransport};

fn write_config(dir: &tempfile::TempDir) -> DaemonConfig {
    let config_path = dir.path().join("configuration.json");
    std::fs::write(&config_path, "[]").unwrap();

    DaemonConfig {
        config_path: config_path.to_string_lossy().into_owned(),
        database_path: dir.path().join("database.json").to_string_lossy().into_owned(),
        mapping_path: dir.path().join("mapping.json").to_string_lossy().into_owned(),
        ..DaemonConfig::default()
    }
}

async fn serve_one(transport: &in_process::InProcessTransport, daemon: &runtime::Daemon) {
    let (_sender, frame) = transport.recv().await.expect("channel open");
    let result = daemon.cams.handle(&frame.command, &frame.args);
    let payload = match result {
        Ok(v) => json!({"ok": v}),
        Err(e) => e.to_exception_json(),
    };
    transport.reply(&frame.correlation_id, payload).await;
}

#[tokio::test]
async fn s4_mapping_lifecycle_over_in_process_transport() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);
    let daemon = runtime::initialize(&config).unwrap();
    let (transport, handle) = in_process::channel();

    let mapping = json!({
        "cam_asset": "asset-1",
        "cam_service": "monitoring",
        "cam_protocol": "snmp",
        "cam_port": "161",
        "cam_credential": "cred-1",
        "cam_status": "UNKNOWN",
    });

    handle
        .requests
        .send((
            "any-caller".to_string(),
            Frame {
                correlation_id: "1".into(),
                command: "CREATE_MAPPING".into(),
                args: vec![mapping],
            },
        ))
        .unwrap();
    serve_one(&transport, &daemon).await;
    let (_, reply) = handle.replies.lock().await.recv().await.unwrap();
    assert!(reply.get("errorCode").is_none());

    handle
        .requests
        .send((
            "any-caller".to_string(),
            Frame {
                correlation_id: "2".into(),
                command: "UPDATE_PORT_MAPPING".into(),
                args: vec![json!({
                    "cam_asset": "asset-1",
                    "cam_service": "monitoring",
                    "cam_protocol": "snmp",
                    "cam_port": "162",
                    "cam_credential": "cred-1",
                    "cam_status": "UNKNOWN",
                })],
            },
        ))
        .unwrap();
    serve_one(&transport, &daemon).await;
    let (_, reply) = handle.replies.lock().await.recv().await.unwrap();
    assert_eq!(reply["ok"]["cam_port"], "162");
    assert_eq!(reply["ok"]["cam_status"], "UNKNOWN");

    handle
        .requests
        .send((
            "any-caller".to_string(),
            Frame {
                correlation_id: "3".into(),
                command: "GET_ASSET_MAPPINGS".into(),
                args: vec![json!("asset-1")],
            },
        ))
        .unwrap();
    serve_one(&transport, &daemon).await;
    let (_, reply) = handle.replies.lock().await.recv().await.unwrap();
    assert_eq!(reply["ok"].as_array().unwrap().len(), 1);

    assert!(dir.path().join("mapping.json").exists());
}
