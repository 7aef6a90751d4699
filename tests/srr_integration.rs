//! End-to-end SRR scenarios (S5, S6) against a daemon assembled the same
//! way `secwd::runtime::initialize` assembles one: real on-disk stores,
//! loaded through the same portfolio configuration path.

use serde_json::json;

use secwd::config::DaemonConfig;
use secwd::runtime;
use secwd::srr::{restore_security_wallet, save_security_wallet, FeatureOutcome, StaticHostIdentity};

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

#[test]
fn s5_save_then_restore_round_trips_a_daemon_loaded_wallet() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);
    let daemon = runtime::initialize(&config).unwrap();

    let doc = json!({
        "secw_doc_name": "switch-credentials",
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
    daemon
        .sws
        .handle("producer-1", "CREATE", &[json!("default"), doc])
        .unwrap();

    let saved_db = secwd::wallet::WalletDatabase::load(std::path::Path::new(&config.database_path)).unwrap();
    let host = StaticHostIdentity("host-under-test".into());
    let saved = save_security_wallet(&saved_db, "correct-horse", &host);
    assert_eq!(saved.status.status, FeatureOutcome::Success);

    // S5: wrong passphrase is rejected with the literal "Bad passphrase" error.
    let err = restore_security_wallet(&saved.feature.data, "wrong-passphrase", &host).unwrap_err();
    assert_eq!(err.status.error.as_deref(), Some("Bad passphrase"));

    // S6 (restore half): correct passphrase recovers the secret-bearing document intact.
    let restored = restore_security_wallet(&saved.feature.data, "correct-horse", &host).unwrap();
    let doc = restored.portfolios[0].get_by_name("switch-credentials").unwrap();
    assert!(doc.contains_secret());
}
