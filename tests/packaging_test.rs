use client_side_lb::utils::constants::{DEFAULT_PORT, DEFAULT_VERTICLE, IMAGE_NAME};

fn read_manifest_file(name: &str) -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(name);
    std::fs::read_to_string(path).unwrap()
}

fn dockerfile() -> String {
    read_manifest_file("Dockerfile")
}

/// `1.88.0` -> `1.88`
fn minor_version(version: &str) -> String {
    version.split('.').take(2).collect::<Vec<_>>().join(".")
}

#[test]
fn test_image_exposes_service_port() {
    let content = dockerfile();
    assert_eq!(DEFAULT_PORT, 8080);
    assert!(content.contains(&format!("EXPOSE {}", DEFAULT_PORT)));
    assert!(content.contains(&format!("-t {}", IMAGE_NAME)));
}

#[test]
fn test_entry_point_passes_single_unit_argument() {
    let content = dockerfile();
    let entrypoint = content
        .lines()
        .find(|line| line.starts_with("ENTRYPOINT"))
        .unwrap();

    let args: Vec<&str> = entrypoint
        .trim_start_matches("ENTRYPOINT")
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|arg| arg.trim().trim_matches('"'))
        .collect();

    assert_eq!(args.len(), 2, "binary plus exactly one argument");
    assert_eq!(args[1], DEFAULT_VERTICLE);
}

#[test]
fn test_builder_image_matches_toolchain_pin() {
    let toolchain: toml::Table = read_manifest_file("rust-toolchain.toml").parse().unwrap();
    let channel = toolchain["toolchain"]["channel"].as_str().unwrap().to_string();

    let manifest: toml::Table = read_manifest_file("Cargo.toml").parse().unwrap();
    let package = &manifest["package"];
    let rust_version = package["rust-version"].as_str().unwrap();

    // 依賴版本依 rust-version 挑選，才能在鎖定的工具鏈上編譯
    assert_eq!(package["resolver"].as_str(), Some("3"));
    assert_eq!(minor_version(&channel), rust_version);

    let content = dockerfile();
    let builder = content
        .lines()
        .find(|line| line.starts_with("FROM rust:"))
        .unwrap();
    assert!(
        builder.starts_with(&format!("FROM rust:{}-", rust_version)),
        "builder stage `{}` does not match toolchain {}",
        builder,
        channel
    );
}
