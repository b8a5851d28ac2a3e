use super::*;

#[test]
fn test_default_timings() {
    let config = Config::default();
    assert_eq!(config.observer.throttle(), Duration::from_millis(500));
    assert_eq!(config.dispatcher.timeout(), Duration::from_secs(30));
    assert_eq!(config.initialization.max_retries, 3);
    assert_eq!(config.initialization.retry_delay(), Duration::from_secs(2));
}

#[test]
fn test_default_languages() {
    let config = Config::default();
    assert_eq!(config.languages.len(), 10);
    assert_eq!(config.language_name("es"), "Spanish");
    assert_eq!(config.language_name("xx"), "xx");
}

#[test]
fn test_default_capabilities() {
    let caps = CapabilitiesConfig::default();
    assert_eq!(caps.writer.max_tokens, 1000);
    assert_eq!(caps.language_model.top_k, Some(3));
    assert_eq!(caps.summarizer.summary_type, "key-points");
    assert_eq!(caps.translator.default_target, "es");
}

#[test]
fn test_host_matches() {
    let host = HostConfig::default();
    assert!(host.matches("https://mail.google.com/mail/u/0/#inbox"));
    assert!(!host.matches("https://example.com"));
}

#[test]
fn test_ui_defaults() {
    let ui = UiConfig::default();
    assert_eq!(ui.marker_attribute, "data-mailmate-tools");
    assert!(!ui.container_class.is_empty());
}
