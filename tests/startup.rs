use std::process::Command;

#[test]
fn missing_jwt_secret_is_reported_on_startup() {
    let output = Command::new(env!("CARGO_BIN_EXE_knowledge_auth"))
        .env_clear()
        .env("APP_DATABASE__URL", "sqlite::memory:")
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("server binary should run");

    assert!(!output.status.success());
    let logs = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(
        logs.contains("auth.jwt_secret is required"),
        "startup output did not explain the failure: {logs:?}"
    );
}
