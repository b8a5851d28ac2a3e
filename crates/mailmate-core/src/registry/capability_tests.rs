use super::*;
use mailmate_protocols::testing::{FakeProvider, FakeResponse};
use mailmate_protocols::{DetectionResult, ProviderError};

fn registry_with(provider: FakeProvider) -> (Arc<FakeProvider>, CapabilityRegistry) {
    let provider = Arc::new(provider);
    let registry = CapabilityRegistry::new(provider.clone(), CapabilityDefaults::default());
    (provider, registry)
}

#[tokio::test]
async fn test_probe_all_available() {
    let (provider, registry) = registry_with(FakeProvider::new());
    let map = registry.probe_all().await;

    assert_eq!(map.available().len(), 6);
    assert!(registry.is_usable());
    // Every probe instance is released.
    assert_eq!(provider.destroyed(), 6);
    assert_eq!(registry.instance_count(), 0);
}

#[tokio::test]
async fn test_probe_without_provider_is_all_false() {
    let registry = CapabilityRegistry::without_provider(CapabilityDefaults::default());
    let map = registry.probe_all().await;

    assert_eq!(map.iter().count(), 6);
    assert!(!map.any_available());
    assert!(!registry.is_usable());
    assert_eq!(registry.capabilities(), Some(map));
}

#[tokio::test]
async fn test_missing_translator_gates_detection() {
    let (provider, registry) = registry_with(FakeProvider::exposing(&[
        CapabilityName::Summarizer,
        CapabilityName::LanguageDetector,
        CapabilityName::Writer,
    ]));
    let map = registry.probe_all().await;

    assert!(!map.get(CapabilityName::Translator));
    assert!(!map.get(CapabilityName::LanguageDetector));
    assert!(map.get(CapabilityName::Summarizer));
    assert!(map.get(CapabilityName::Writer));
    assert!(provider.created_with(CapabilityName::LanguageDetector).is_empty());
}

#[tokio::test]
async fn test_one_failing_probe_does_not_abort_others() {
    let (_provider, registry) =
        registry_with(FakeProvider::new().fail_create(CapabilityName::LanguageModel));
    let map = registry.probe_all().await;

    assert!(!map.get(CapabilityName::LanguageModel));
    assert!(map.get(CapabilityName::Rewriter));
    assert_eq!(map.available().len(), 5);
}

#[tokio::test]
async fn test_probe_uses_minimal_options() {
    let (provider, registry) = registry_with(FakeProvider::new());
    registry.probe_all().await;

    let writer = provider.created_with(CapabilityName::Writer);
    assert_eq!(writer[0].max_tokens, Some(100));
}

#[tokio::test]
async fn test_ensure_instance_requires_probe() {
    let (_provider, registry) = registry_with(FakeProvider::new());
    let result = registry.ensure_instance(CapabilityName::Writer).await;
    assert!(matches!(
        result,
        Err(CapabilityError::Unavailable(CapabilityName::Writer))
    ));
}

#[tokio::test]
async fn test_ensure_instance_is_cached() {
    let (provider, registry) = registry_with(FakeProvider::new());
    registry.probe_all().await;
    let probes = provider.create_calls();

    registry.ensure_instance(CapabilityName::Writer).await.unwrap();
    registry.ensure_instance(CapabilityName::Writer).await.unwrap();

    assert_eq!(provider.create_calls(), probes + 1);
    assert_eq!(registry.instance_count(), 1);
    let options = provider.created_with(CapabilityName::Writer);
    assert_eq!(options.last().unwrap().max_tokens, Some(1000));
}

#[tokio::test]
async fn test_ensure_instance_with_new_options_replaces() {
    let (provider, registry) = registry_with(FakeProvider::new());
    registry.probe_all().await;
    let destroyed = provider.destroyed();

    let defaults = registry.defaults().clone();
    registry
        .ensure_instance_with(
            CapabilityName::Translator,
            defaults.translator_options("es", "en"),
        )
        .await
        .unwrap();
    registry
        .ensure_instance_with(
            CapabilityName::Translator,
            defaults.translator_options("fr", "en"),
        )
        .await
        .unwrap();

    assert_eq!(registry.instance_count(), 1);
    assert_eq!(provider.destroyed(), destroyed + 1);

    // Same options again reuse the cached handle.
    let creates = provider.create_calls();
    registry
        .ensure_instance_with(
            CapabilityName::Translator,
            defaults.translator_options("fr", "en"),
        )
        .await
        .unwrap();
    assert_eq!(provider.create_calls(), creates);
}

#[tokio::test]
async fn test_invoke_returns_output() {
    let (_provider, registry) = registry_with(FakeProvider::new().respond(
        CapabilityName::Summarizer,
        FakeResponse::Text("- budget approved".to_string()),
    ));
    registry.probe_all().await;

    let output = registry
        .invoke(CapabilityName::Summarizer, CapabilityRequest::text("long email"))
        .await
        .unwrap();
    assert_eq!(output.into_text().unwrap(), "- budget approved");
}

#[tokio::test]
async fn test_invoke_classifies_rate_limit() {
    let (_provider, registry) = registry_with(FakeProvider::new().respond(
        CapabilityName::Writer,
        FakeResponse::Error("RESOURCE_EXHAUSTED: try later".to_string()),
    ));
    registry.probe_all().await;

    let result = registry
        .invoke(CapabilityName::Writer, CapabilityRequest::text("hi"))
        .await;
    assert!(matches!(result, Err(CapabilityError::RateLimited(_))));
}

#[tokio::test]
async fn test_invoke_classifies_unknown() {
    let (_provider, registry) = registry_with(FakeProvider::new().respond(
        CapabilityName::Writer,
        FakeResponse::Error("model crashed".to_string()),
    ));
    registry.probe_all().await;

    let result = registry
        .invoke(CapabilityName::Writer, CapabilityRequest::text("hi"))
        .await;
    assert!(matches!(result, Err(CapabilityError::Unknown(_))));
}

#[tokio::test]
async fn test_detection_output() {
    let (_provider, registry) = registry_with(FakeProvider::new().respond(
        CapabilityName::LanguageDetector,
        FakeResponse::Detections(vec![DetectionResult::new("es", 0.92)]),
    ));
    registry.probe_all().await;

    let results = registry
        .invoke(CapabilityName::LanguageDetector, CapabilityRequest::text("Hola"))
        .await
        .unwrap()
        .into_detections()
        .unwrap();
    assert_eq!(results[0].detected_language, "es");
}

#[tokio::test]
async fn test_reset_releases_and_is_idempotent() {
    let (provider, registry) = registry_with(FakeProvider::new());
    registry.probe_all().await;
    registry.ensure_instance(CapabilityName::Writer).await.unwrap();
    registry.ensure_instance(CapabilityName::Rewriter).await.unwrap();
    let destroyed = provider.destroyed();

    registry.reset().await;
    assert_eq!(registry.instance_count(), 0);
    assert_eq!(provider.destroyed(), destroyed + 2);
    assert!(registry.capabilities().is_none());
    assert!(!registry.is_usable());

    registry.reset().await;
    assert_eq!(provider.destroyed(), destroyed + 2);
}

struct FailingDestroy;

#[async_trait::async_trait]
impl CapabilityInstance for FailingDestroy {
    fn capability(&self) -> CapabilityName {
        CapabilityName::Writer
    }

    async fn invoke(
        &self,
        _request: CapabilityRequest,
    ) -> Result<CapabilityOutput, ProviderError> {
        Ok(CapabilityOutput::Text("ok".to_string()))
    }

    async fn destroy(&self) -> Result<(), ProviderError> {
        Err(ProviderError::DestroyFailed("already gone".to_string()))
    }
}

struct FailingDestroyProvider;

#[async_trait::async_trait]
impl CapabilityProvider for FailingDestroyProvider {
    fn id(&self) -> &str {
        "failing-destroy"
    }

    fn exposes(&self, name: CapabilityName) -> bool {
        name == CapabilityName::Writer
    }

    async fn create(
        &self,
        _name: CapabilityName,
        _options: &CapabilityOptions,
    ) -> Result<Box<dyn CapabilityInstance>, ProviderError> {
        Ok(Box::new(FailingDestroy))
    }
}

#[tokio::test]
async fn test_destroy_failures_are_ignored() {
    let registry = CapabilityRegistry::new(
        Arc::new(FailingDestroyProvider),
        CapabilityDefaults::default(),
    );
    let map = registry.probe_all().await;
    assert!(map.get(CapabilityName::Writer));

    registry.ensure_instance(CapabilityName::Writer).await.unwrap();
    registry.reset().await;
    assert_eq!(registry.instance_count(), 0);
}
