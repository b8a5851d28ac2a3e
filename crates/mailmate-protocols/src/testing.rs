//! Scripted capability provider for tests.
//!
//! Enabled with the `testing` feature so downstream crates can share one
//! fake instead of redefining it per test module.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::capability::{
    CapabilityName, CapabilityOptions, CapabilityOutput, CapabilityRequest, DetectionResult,
};
use crate::error::ProviderError;
use crate::provider::{CapabilityInstance, CapabilityProvider};

/// Scripted reply for one capability.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    Text(String),
    Detections(Vec<DetectionResult>),
    Error(String),
}

#[derive(Default)]
struct FakeState {
    failing_create: HashSet<CapabilityName>,
    responses: HashMap<CapabilityName, FakeResponse>,
    delay: Option<Duration>,
    create_delay: Option<Duration>,
    created: Vec<(CapabilityName, CapabilityOptions)>,
    requests: Vec<(CapabilityName, CapabilityRequest)>,
}

/// A provider whose behaviour is configured per capability.
pub struct FakeProvider {
    exposed: HashSet<CapabilityName>,
    state: Arc<Mutex<FakeState>>,
    create_calls: Arc<AtomicUsize>,
    invoke_calls: Arc<AtomicUsize>,
    destroyed: Arc<AtomicUsize>,
}

impl FakeProvider {
    /// Provider exposing every capability.
    pub fn new() -> Self {
        Self::exposing(&CapabilityName::ALL)
    }

    /// Provider exposing only the listed capabilities.
    pub fn exposing(names: &[CapabilityName]) -> Self {
        Self {
            exposed: names.iter().copied().collect(),
            state: Arc::new(Mutex::new(FakeState::default())),
            create_calls: Arc::new(AtomicUsize::new(0)),
            invoke_calls: Arc::new(AtomicUsize::new(0)),
            destroyed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make instance creation fail for a capability.
    pub fn fail_create(self, name: CapabilityName) -> Self {
        self.state.lock().failing_create.insert(name);
        self
    }

    /// Make instance creation fail for every capability.
    pub fn fail_all(self) -> Self {
        {
            let mut state = self.state.lock();
            state.failing_create.extend(CapabilityName::ALL);
        }
        self
    }

    pub fn respond(self, name: CapabilityName, response: FakeResponse) -> Self {
        self.state.lock().responses.insert(name, response);
        self
    }

    /// Delay every invocation.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state.lock().delay = Some(delay);
        self
    }

    /// Delay every instance creation, probes included.
    pub fn with_create_delay(self, delay: Duration) -> Self {
        self.state.lock().create_delay = Some(delay);
        self
    }

    /// Toggle create failures at runtime.
    pub fn set_failing(&self, name: CapabilityName, failing: bool) {
        let mut state = self.state.lock();
        if failing {
            state.failing_create.insert(name);
        } else {
            state.failing_create.remove(&name);
        }
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn invoke_calls(&self) -> usize {
        self.invoke_calls.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Every `(capability, options)` pair passed to `create`.
    pub fn created(&self) -> Vec<(CapabilityName, CapabilityOptions)> {
        self.state.lock().created.clone()
    }

    /// Options of each created instance of one capability.
    pub fn created_with(&self, name: CapabilityName) -> Vec<CapabilityOptions> {
        self.created()
            .into_iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, o)| o)
            .collect()
    }

    /// Every request passed to an instance.
    pub fn requests(&self) -> Vec<(CapabilityName, CapabilityRequest)> {
        self.state.lock().requests.clone()
    }
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityProvider for FakeProvider {
    fn id(&self) -> &str {
        "fake"
    }

    fn exposes(&self, name: CapabilityName) -> bool {
        self.exposed.contains(&name)
    }

    async fn create(
        &self,
        name: CapabilityName,
        options: &CapabilityOptions,
    ) -> Result<Box<dyn CapabilityInstance>, ProviderError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if !self.exposes(name) {
            return Err(ProviderError::NotPresent(name));
        }

        let create_delay = self.state.lock().create_delay;
        if let Some(delay) = create_delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        state.created.push((name, options.clone()));
        if state.failing_create.contains(&name) {
            return Err(ProviderError::CreateFailed {
                capability: name,
                message: "model not ready".to_string(),
            });
        }

        Ok(Box::new(FakeInstance {
            name,
            state: self.state.clone(),
            invoke_calls: self.invoke_calls.clone(),
            destroyed: self.destroyed.clone(),
        }))
    }
}

struct FakeInstance {
    name: CapabilityName,
    state: Arc<Mutex<FakeState>>,
    invoke_calls: Arc<AtomicUsize>,
    destroyed: Arc<AtomicUsize>,
}

#[async_trait]
impl CapabilityInstance for FakeInstance {
    fn capability(&self) -> CapabilityName {
        self.name
    }

    async fn invoke(&self, request: CapabilityRequest) -> Result<CapabilityOutput, ProviderError> {
        self.invoke_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, response) = {
            let mut state = self.state.lock();
            state.requests.push((self.name, request.clone()));
            (state.delay, state.responses.get(&self.name).cloned())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match response {
            Some(FakeResponse::Text(text)) => Ok(CapabilityOutput::Text(text)),
            Some(FakeResponse::Detections(results)) => Ok(CapabilityOutput::Detections(results)),
            Some(FakeResponse::Error(message)) => Err(ProviderError::InvokeFailed(message)),
            None if self.name == CapabilityName::LanguageDetector => Ok(
                CapabilityOutput::Detections(vec![DetectionResult::new("en", 0.9)]),
            ),
            None => Ok(CapabilityOutput::Text(format!("{}: {}", self.name, request.text))),
        }
    }

    async fn destroy(&self) -> Result<(), ProviderError> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_respects_exposure() {
        let provider = FakeProvider::exposing(&[CapabilityName::Writer]);
        let options = CapabilityOptions::new();
        assert!(provider.probe(CapabilityName::Writer, &options).await.is_ok());
        assert!(matches!(
            provider.probe(CapabilityName::Translator, &options).await,
            Err(ProviderError::NotPresent(CapabilityName::Translator))
        ));
    }

    #[tokio::test]
    async fn test_scripted_response() {
        let provider = FakeProvider::new().respond(
            CapabilityName::Summarizer,
            FakeResponse::Text("short".to_string()),
        );
        let instance = provider
            .create(CapabilityName::Summarizer, &CapabilityOptions::new())
            .await
            .unwrap();
        let output = instance.invoke(CapabilityRequest::text("long")).await.unwrap();
        assert_eq!(output, CapabilityOutput::Text("short".to_string()));
        assert_eq!(provider.invoke_calls(), 1);
    }

    #[tokio::test]
    async fn test_failing_create() {
        let provider = FakeProvider::new().fail_create(CapabilityName::Rewriter);
        let result = provider
            .create(CapabilityName::Rewriter, &CapabilityOptions::new())
            .await;
        assert!(result.is_err());
        assert_eq!(provider.created_with(CapabilityName::Rewriter).len(), 1);
    }
}
