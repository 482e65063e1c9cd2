//! Tests for `.env` loading and API key resolution.

use std::collections::BTreeMap;
use std::io::Write;

use phone_recommender::credentials::{load_credentials, resolve_api_key, ApiKey, Credentials};

fn creds(pairs: &[(&str, &str)]) -> Credentials {
    Credentials::from_map(
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn load_credentials_parses_env_file() {
    let mut file = tempfile::NamedTempFile::new().expect("should create temp file");
    writeln!(file, "GOOGLE_API_KEY=AIzaFromFile").expect("should write");
    writeln!(file, "# comment line").expect("should write");
    writeln!(file, "OTHER=\"quoted value\"").expect("should write");

    let loaded = load_credentials(file.path()).expect("env file should load");
    assert_eq!(loaded.get("GOOGLE_API_KEY"), Some("AIzaFromFile"));
    assert_eq!(loaded.get("OTHER"), Some("quoted value"));
    assert_eq!(loaded.get("MISSING"), None);
}

#[test]
fn load_credentials_missing_file_errors() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let err = load_credentials(&tmp.path().join(".env")).expect_err("missing file should fail");
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn credentials_debug_hides_values() {
    let loaded = creds(&[("GOOGLE_API_KEY", "AIzaTopSecret")]);
    let debug = format!("{loaded:?}");
    assert!(debug.contains("GOOGLE_API_KEY"));
    assert!(!debug.contains("AIzaTopSecret"));
}

#[test]
fn api_key_debug_is_redacted() {
    let key = ApiKey::new("AIzaTopSecret");
    assert_eq!(format!("{key:?}"), "ApiKey([REDACTED])");
    assert_eq!(key.expose(), "AIzaTopSecret");
}

#[test]
fn environment_wins_over_file() {
    let file = creds(&[("GOOGLE_API_KEY", "from-file")]);
    let key = resolve_api_key(
        "GOOGLE_API_KEY",
        |var| (var == "GOOGLE_API_KEY").then(|| "from-env".to_owned()),
        Some(&file),
    )
    .expect("key should resolve");
    assert_eq!(key.expose(), "from-env");
}

#[test]
fn file_is_used_when_env_missing_or_blank() {
    let file = creds(&[("GOOGLE_API_KEY", "from-file")]);

    let key = resolve_api_key("GOOGLE_API_KEY", no_env, Some(&file)).expect("file fallback");
    assert_eq!(key.expose(), "from-file");

    let key = resolve_api_key("GOOGLE_API_KEY", |_| Some("   ".to_owned()), Some(&file))
        .expect("blank env falls back");
    assert_eq!(key.expose(), "from-file");
}

#[test]
fn custom_variable_name_is_honoured() {
    let file = creds(&[("GOOGLE_API_KEY", "wrong"), ("MY_KEY", "right")]);
    let key = resolve_api_key("MY_KEY", no_env, Some(&file)).expect("key should resolve");
    assert_eq!(key.expose(), "right");
}

#[test]
fn missing_key_error_names_variable() {
    let err = resolve_api_key("GOOGLE_API_KEY", no_env, None).expect_err("no key anywhere");
    let message = err.to_string();
    assert!(message.contains("missing API key"));
    assert!(message.contains("GOOGLE_API_KEY"));

    let blank = creds(&[("GOOGLE_API_KEY", "")]);
    assert!(resolve_api_key("GOOGLE_API_KEY", no_env, Some(&blank)).is_err());
}
