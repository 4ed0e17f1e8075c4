use pullmq::load_config;
use std::fs;

#[test]
fn load_full_config() {
    let path = std::env::temp_dir().join("pullmq-config-full.toml");
    fs::write(
        &path,
        r#"
[consumer]
cancellation_timeout_ms = 250

[buffer]
capacity = 8
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.consumer.cancellation_timeout_ms, 250);
    assert_eq!(config.buffer.capacity, 8);

    fs::remove_file(&path).ok();
}

#[test]
fn empty_config_falls_back_to_defaults() {
    let path = std::env::temp_dir().join("pullmq-config-empty.toml");
    fs::write(&path, "").unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.consumer.cancellation_timeout_ms, 1000);
    assert_eq!(config.buffer.capacity, 2);

    fs::remove_file(&path).ok();
}
