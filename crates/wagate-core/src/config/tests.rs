use super::*;

#[test]
fn test_defaults_match_documented_values() {
    let cfg = Config::default();
    assert_eq!(cfg.api.host, "0.0.0.0");
    assert_eq!(cfg.api.port, 3001);
    assert!(cfg.api.cors);
    assert_eq!(cfg.whatsapp.auth_dir, "./auth");
    assert_eq!(cfg.whatsapp.reconnect_delay(), Duration::from_secs(3));
    assert_eq!(cfg.whatsapp.relogin_delay(), Duration::from_secs(1));
    assert!(!cfg.whatsapp.print_qr_terminal);
    assert_eq!(cfg.gateway.log_level, "info");
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let toml_str = r#"
        [api]
        port = 8080

        [whatsapp]
        print_qr_terminal = true
    "#;
    let cfg: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(cfg.api.port, 8080);
    assert_eq!(cfg.api.host, "0.0.0.0");
    assert!(cfg.whatsapp.print_qr_terminal);
    assert_eq!(cfg.whatsapp.reconnect_delay_ms, 3000);
    assert_eq!(cfg.gateway.name, "wagate");
}

#[test]
fn test_empty_toml_is_default() {
    let cfg: Config = toml::from_str("").unwrap();
    assert_eq!(cfg.api.port, 3001);
    assert_eq!(cfg.whatsapp.device_name, "wagate");
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let cfg = load("/nonexistent/__wagate_config__.toml").unwrap();
    assert_eq!(cfg.api.port, 3001);
}

#[test]
fn test_load_rejects_invalid_toml() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[api\nport = ").unwrap();

    let err = load(path.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, GatewayError::Config(_)));
}

#[test]
fn test_load_reads_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[whatsapp]\nauth_dir = \"/var/lib/wagate/auth\"\n").unwrap();

    let cfg = load(path.to_str().unwrap()).unwrap();
    assert_eq!(cfg.whatsapp.auth_dir, "/var/lib/wagate/auth");
}

#[test]
fn test_overrides_win_over_file() {
    let mut cfg = Config::default();
    cfg.apply_overrides(Some(4000), Some("/tmp/wa-auth".to_string()));
    assert_eq!(cfg.api.port, 4000);
    assert_eq!(cfg.whatsapp.auth_dir, "/tmp/wa-auth");
}

#[test]
fn test_overrides_none_keep_config() {
    let mut cfg = Config::default();
    cfg.apply_overrides(None, None);
    assert_eq!(cfg.api.port, 3001);
    assert_eq!(cfg.whatsapp.auth_dir, "./auth");
}

#[test]
fn test_shellexpand_home() {
    if let Some(home) = std::env::var_os("HOME") {
        let expanded = shellexpand("~/auth");
        assert_eq!(expanded, format!("{}/auth", home.to_string_lossy()));
    }
    assert_eq!(shellexpand("./auth"), "./auth");
}
