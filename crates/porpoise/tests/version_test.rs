#[test]
fn version_matches_cargo_pkg_version() {
    assert_eq!(porpoise::VERSION, env!("CARGO_PKG_VERSION"));
    assert!(!porpoise::VERSION.is_empty());
}
