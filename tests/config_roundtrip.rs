//! Integration tests: application config persistence and loading.

use geosearch::{AppConfig, AppError, ServerCredentials};
use geosearch_core::{CredentialSource, ProviderId};

#[test]
fn config_roundtrips_via_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("config.toml");

    let mut config = AppConfig::default();
    config.router.providers = vec![ProviderId::Mojeek, ProviderId::Brave];
    config.router.cost.daily_miss_budget = 42;
    config.router.cache_ttl_seconds = 0;
    config.credentials = ServerCredentials {
        mojeek: Some("mk".into()),
        ..Default::default()
    };

    config.save_to_file(&path).expect("save");
    let restored = AppConfig::from_file(&path).expect("load");
    assert_eq!(restored, config);
}

#[test]
fn empty_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "").expect("write");

    let config = AppConfig::from_file(&path).expect("load");
    assert_eq!(config, AppConfig::default());
}

#[test]
fn load_missing_explicit_path_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = AppConfig::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(AppError::Io(_))));
}

#[test]
fn load_rejects_invalid_router_section() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[router]\nproviders = []\n").expect("write");

    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(AppError::Search(_))));
}

#[test]
fn malformed_toml_is_a_config_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[router\ntimeout_seconds = ").expect("write");

    let result = AppConfig::from_file(&path);
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn saved_file_feeds_request_credentials() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[credentials]\nserper = \"srv-key\"\n").expect("write");

    let config = AppConfig::from_file(&path).expect("load");
    let creds = config.credentials_with_user([(ProviderId::Brave, "user-key".to_owned())]);
    assert_eq!(
        creds.get(ProviderId::Serper, CredentialSource::Server),
        Some("srv-key")
    );
    assert_eq!(
        creds.get(ProviderId::Brave, CredentialSource::User),
        Some("user-key")
    );
    assert_eq!(creds.get(ProviderId::Brave, CredentialSource::Server), None);
}
