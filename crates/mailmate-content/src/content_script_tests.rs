use async_trait::async_trait;
use mailmate_protocols::testing::FakeProvider;
use mailmate_protocols::{CapabilityName, MessageError};

use super::*;
use crate::dom::{Document, Selector};
use crate::fixtures::{compose_window, view_message};
use crate::injector::TYPE_ATTR;

const BODY: &str = "Hello world. This is a test email about the quarterly budget.";

/// Background port that acknowledges everything and keeps a log.
#[derive(Default)]
struct RecordingPort {
    sent: Mutex<Vec<Message>>,
}

impl RecordingPort {
    fn kinds(&self) -> Vec<&'static str> {
        self.sent.lock().iter().map(Message::kind).collect()
    }
}

#[async_trait]
impl MessagePort for RecordingPort {
    async fn request(&self, message: Message) -> Result<Message, MessageError> {
        self.sent.lock().push(message);
        Ok(Message::Ack { success: true })
    }

    async fn notify(&self, message: Message) -> Result<(), MessageError> {
        self.sent.lock().push(message);
        Ok(())
    }
}

struct Setup {
    script: Arc<ContentScript>,
    provider: Option<Arc<FakeProvider>>,
    port: Arc<RecordingPort>,
}

fn setup(provider: Option<FakeProvider>) -> Setup {
    let mut doc = Document::new("https://mail.google.com/mail/u/0/#inbox");
    let root = doc.root();
    doc.append(root, &view_message("Budget", BODY));
    doc.take_mutations();

    let provider = provider.map(Arc::new);
    let port = Arc::new(RecordingPort::default());
    let script = Arc::new(ContentScript::new(
        TabId(7),
        doc.into_shared(),
        Arc::new(Config::default()),
        provider.clone().map(|p| p as Arc<dyn CapabilityProvider>),
        port.clone(),
    ));
    Setup {
        script,
        provider,
        port,
    }
}

fn control(script: &ContentScript, action: &str) -> NodeId {
    let doc = script.document().lock();
    doc.find(doc.root(), &Selector::attr(TOOL_ID_ATTR, action))
        .unwrap()
}

fn is_disabled(script: &ContentScript, node: NodeId) -> bool {
    script.document().lock().has_attribute(node, "disabled")
}

#[tokio::test]
async fn test_initialize_injects_then_enables() {
    let s = setup(Some(FakeProvider::new()));

    let report = s.script.initialize().await;
    assert_eq!(report.injected, 1);
    assert_eq!(s.script.coordinator().state(), InitState::Ready);
    assert!(!is_disabled(&s.script, control(&s.script, "summarize")));
    assert_eq!(s.port.kinds(), vec!["AI_INITIALIZED"]);
}

#[tokio::test(start_paused = true)]
async fn test_without_provider_controls_stay_disabled() {
    let s = setup(None);

    s.script.initialize().await;
    assert_eq!(s.script.coordinator().state(), InitState::Unavailable);
    let summarize = control(&s.script, "summarize");
    assert!(is_disabled(&s.script, summarize));
    assert_eq!(
        s.script.document().lock().attribute(summarize, "title"),
        Some("AI tools not available")
    );

    match s.script.handle_message(Message::GetAiStatus).await {
        Some(Message::AiStatus { available, .. }) => assert!(!available),
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn test_get_ai_status_renotifies_when_ready() {
    let s = setup(Some(FakeProvider::new()));
    s.script.initialize().await;

    let response = s.script.handle_message(Message::GetAiStatus).await;
    match response {
        Some(Message::AiStatus {
            available,
            capabilities,
        }) => {
            assert!(available);
            assert!(capabilities.get(CapabilityName::Summarizer));
        }
        other => panic!("unexpected response: {:?}", other),
    }
    assert_eq!(s.port.kinds(), vec!["AI_INITIALIZED", "AI_INITIALIZED"]);
}

#[tokio::test]
async fn test_get_ai_status_starts_initialization() {
    let s = setup(Some(FakeProvider::new()));
    assert_eq!(s.script.coordinator().state(), InitState::Uninitialized);

    s.script.handle_message(Message::GetAiStatus).await;
    assert_eq!(s.script.coordinator().state(), InitState::Ready);
    assert_eq!(s.port.kinds(), vec!["AI_INITIALIZED"]);
}

#[tokio::test]
async fn test_stale_tab_ready_is_noop() {
    let s = setup(Some(FakeProvider::new()));
    s.script.initialize().await;
    let provider = s.provider.as_ref().unwrap();
    let creates = provider.create_calls();

    assert!(s.script.handle_message(Message::TabReady).await.is_none());
    assert_eq!(provider.create_calls(), creates);
}

#[tokio::test]
async fn test_tab_ready_starts_when_uninitialized() {
    let s = setup(Some(FakeProvider::new()));
    assert!(s.script.handle_message(Message::TabReady).await.is_none());
    assert_eq!(s.script.coordinator().state(), InitState::Ready);
}

#[tokio::test]
async fn test_check_ai_status_reprobes() {
    let s = setup(Some(FakeProvider::new()));
    s.script.initialize().await;
    let attempts = s.script.coordinator().status().attempts;

    let response = s.script.handle_message(Message::CheckAiStatus).await;
    assert!(matches!(response, Some(Message::AiStatus { available: true, .. })));
    assert_eq!(s.script.coordinator().status().attempts, attempts + 1);
}

#[tokio::test]
async fn test_unrelated_message_ignored() {
    let s = setup(Some(FakeProvider::new()));
    assert!(s.script.handle_message(Message::GetReadyTabs).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_new_surface_scanned_from_mutations() {
    let s = setup(Some(FakeProvider::new()));
    s.script.initialize().await;
    s.script.process_mutations().await;

    {
        let mut doc = s.script.document().lock();
        let root = doc.root();
        doc.append(root, &compose_window("Hi", ""));
    }
    // Outside the throttle window of the previous scan.
    tokio::time::sleep(Config::default().observer.throttle()).await;
    let report = s.script.process_mutations().await.unwrap();
    assert_eq!(report.injected, 1);
    assert_eq!(report.already_marked, 1);

    let doc = s.script.document().lock();
    assert!(doc.find(doc.root(), &Selector::attr(TYPE_ATTR, "compose")).is_some());
}

#[tokio::test]
async fn test_navigation_resets_ai_state() {
    let s = setup(Some(FakeProvider::new()));
    s.script.initialize().await;
    let summarize = control(&s.script, "summarize");

    s.script
        .document()
        .lock()
        .set_url("https://mail.google.com/mail/u/0/#inbox/FMfcgz");
    s.script.process_mutations().await;

    assert_eq!(s.script.coordinator().state(), InitState::Uninitialized);
    assert_eq!(s.script.coordinator().registry().instance_count(), 0);
    assert!(is_disabled(&s.script, summarize));
    assert_eq!(s.port.kinds(), vec!["AI_INITIALIZED", "RESET_AI_STATE"]);

    s.script.reinitialize().await;
    assert_eq!(s.script.coordinator().state(), InitState::Ready);
    assert!(!is_disabled(&s.script, summarize));
}

#[tokio::test(start_paused = true)]
async fn test_navigation_during_action_frees_control() {
    let s = setup(Some(FakeProvider::new().with_delay(Duration::from_secs(5))));
    s.script.initialize().await;
    let summarize = control(&s.script, "summarize");

    let (result, ()) = tokio::join!(s.script.activate(summarize), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        s.script
            .document()
            .lock()
            .set_url("https://mail.google.com/mail/u/0/#sent");
        s.script.process_mutations().await;
    });
    assert!(matches!(result, Some(Err(ActionError::Superseded))));

    s.script.reinitialize().await;
    assert_eq!(s.script.coordinator().state(), InitState::Ready);
    assert!(!is_disabled(&s.script, summarize));

    let again = s.script.activate(summarize).await;
    assert_eq!(again.unwrap().unwrap(), format!("summarizer: {}", BODY));
}

#[tokio::test]
async fn test_activate_runs_action() {
    let s = setup(Some(FakeProvider::new()));
    s.script.initialize().await;

    let result = s.script.activate(control(&s.script, "summarize")).await;
    assert_eq!(result.unwrap().unwrap(), format!("summarizer: {}", BODY));
}

#[tokio::test]
async fn test_activate_ignores_non_controls() {
    let s = setup(Some(FakeProvider::new()));
    s.script.initialize().await;
    let root = s.script.document().lock().root();
    assert!(s.script.activate(root).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_activate_ignores_disabled_control() {
    let s = setup(None);
    s.script.initialize().await;
    assert!(s.script.activate(control(&s.script, "summarize")).await.is_none());
}

#[tokio::test]
async fn test_select_language() {
    let s = setup(Some(FakeProvider::new()));
    s.script.initialize().await;
    let picker = {
        let doc = s.script.document().lock();
        doc.find(doc.root(), &Selector::class("language-select")).unwrap()
    };

    assert!(s.script.select_language(picker, "de"));
    assert_eq!(s.script.document().lock().attribute(picker, "value"), Some("de"));
    assert!(!s.script.select_language(picker, "xx"));
    assert!(!s.script.select_language(control(&s.script, "summarize"), "de"));
}
