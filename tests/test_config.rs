use rawhttp::config::{Config, ConfigError, ServeMode};
use rawhttp::http::headers::HeaderMatch;
use rawhttp::http::request::Method;

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.server.mode, ServeMode::Static);
    assert_eq!(cfg.framing.allowed_methods, vec![Method::GET, Method::POST]);
    assert_eq!(cfg.framing.buffer_capacity, 4096);
    assert_eq!(cfg.framing.header_match, HeaderMatch::Exact);
    assert_eq!(cfg.static_files.whitelist.len(), 11);
    assert!(cfg.static_files.whitelist.contains(&"/classic.html".to_string()));
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_config_from_yaml() {
    let yaml = r#"
server:
  listen_addr: 0.0.0.0:9999
  workers: 8
  mode: ack
framing:
  allowed_methods: [GET, POST, PUT]
  buffer_capacity: 1024
  header_match: prefix
static_files:
  root: /srv/www
  whitelist: [/index.html]
  templates: []
"#;
    let cfg = Config::from_yaml(yaml).unwrap();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:9999");
    assert_eq!(cfg.server.workers, 8);
    assert_eq!(cfg.server.mode, ServeMode::Ack);
    assert_eq!(cfg.framing.allowed_methods.len(), 3);
    assert_eq!(cfg.framing.buffer_capacity, 1024);
    assert_eq!(cfg.framing.header_match, HeaderMatch::Prefix);
    assert_eq!(cfg.static_files.root.to_str(), Some("/srv/www"));
    assert!(cfg.static_files.templates.is_empty());
}

#[test]
fn test_partial_yaml_keeps_defaults() {
    let cfg = Config::from_yaml("framing:\n  read_timeout_ms: 250\n").unwrap();

    assert_eq!(cfg.framing.read_timeout_ms, 250);
    assert_eq!(cfg.framing.buffer_capacity, 4096);
    assert_eq!(cfg.server.workers, 64);
}

#[test]
fn test_unknown_method_is_rejected() {
    let res = Config::from_yaml("framing:\n  allowed_methods: [BREW]\n");
    assert!(matches!(res, Err(ConfigError::Parse(_))));
}

#[test]
fn test_zero_workers_is_invalid() {
    let res = Config::from_yaml("server:\n  workers: 0\n");
    assert!(matches!(res, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_tiny_buffer_is_invalid() {
    let res = Config::from_yaml("framing:\n  buffer_capacity: 4\n");
    assert!(matches!(res, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_empty_method_set_is_invalid() {
    let res = Config::from_yaml("framing:\n  allowed_methods: []\n");
    assert!(matches!(res, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_relative_whitelist_entry_is_invalid() {
    let res = Config::from_yaml("static_files:\n  whitelist: [index.html]\n");
    assert!(matches!(res, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_missing_file_is_io_error() {
    let res = Config::from_file("/definitely/not/here.yaml");
    assert!(matches!(res, Err(ConfigError::Io { .. })));
}

#[test]
fn test_load_from_env() {
    let dir = std::env::temp_dir().join(format!("rawhttp-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("server.yaml");
    std::fs::write(&path, "server:\n  listen_addr: 127.0.0.1:7000\n  mode: ack\n").unwrap();

    unsafe {
        std::env::set_var("RAWHTTP_CONFIG", &path);
        std::env::remove_var("LISTEN");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.listen_addr, "127.0.0.1:7000");
    assert_eq!(cfg.server.mode, ServeMode::Ack);

    // LISTEN wins over the file
    unsafe {
        std::env::set_var("LISTEN", "0.0.0.0:3000");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:3000");

    unsafe {
        std::env::remove_var("LISTEN");
        std::env::remove_var("RAWHTTP_CONFIG");
    }
    std::fs::remove_dir_all(&dir).unwrap();
}
