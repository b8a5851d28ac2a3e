//! `simulate` command: one tab driven end to end in-process.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::info;

use mailmate_config::Config;
use mailmate_content::injector::{TOOL_ID_ATTR, TYPE_ATTR};
use mailmate_content::{ActionId, ContentScript, Document, NodeId, Selector, SurfaceKind};
use mailmate_core::{
    BackgroundService, ChannelTabMessenger, RetryPolicy, StatusMonitor, TabEvent, TabStateStore,
    context_channel,
};
use mailmate_protocols::{CapabilityProvider, MessageSender, TabId};

use crate::demo::{DemoProvider, SAMPLE_URL, sample_page};

const TAB: TabId = TabId(1);

pub(crate) struct SimulateOptions {
    pub action: String,
    pub surface: Option<String>,
    pub language: Option<String>,
    pub no_provider: bool,
}

/// Surface an action is normally clicked on.
fn natural_surface(action: ActionId) -> SurfaceKind {
    match action {
        ActionId::Write | ActionId::Rewrite => SurfaceKind::Compose,
        ActionId::QuickResponse => SurfaceKind::Reply,
        ActionId::Summarize | ActionId::Translate => SurfaceKind::View,
    }
}

/// The tool control and language picker of the first cluster on `kind`.
fn find_control(
    doc: &Document,
    config: &Config,
    kind: SurfaceKind,
    action: ActionId,
) -> Option<(NodeId, Option<NodeId>)> {
    let cluster = doc.find(doc.root(), &Selector::attr(TYPE_ATTR, kind.as_str()))?;
    let control = doc.find(cluster, &Selector::attr(TOOL_ID_ATTR, action.as_str()))?;
    let picker = doc.find(cluster, &Selector::class(&config.ui.language_select_class));
    Some((control, picker))
}

pub(crate) async fn handle_simulate(
    config: Config,
    options: SimulateOptions,
) -> anyhow::Result<()> {
    let action: ActionId = options.action.parse().map_err(anyhow::Error::msg)?;
    let kind: SurfaceKind = match &options.surface {
        Some(surface) => surface.parse().map_err(anyhow::Error::msg)?,
        None => natural_surface(action),
    };
    let config = Arc::new(config);

    // Coordination context.
    let store = Arc::new(TabStateStore::new());
    let messenger = Arc::new(ChannelTabMessenger::new());
    let background = Arc::new(BackgroundService::new(
        store.clone(),
        messenger.clone(),
        config.host.clone(),
    ));
    let (background_endpoint, background_inbox) = context_channel("background", 32);
    let (events, events_rx) = mpsc::channel(8);
    tokio::spawn(background.run(background_inbox, events_rx));

    // Content context.
    let mut doc = Document::new(SAMPLE_URL);
    let root = doc.root();
    for element in sample_page() {
        doc.append(root, &element);
    }
    let provider: Option<Arc<dyn CapabilityProvider>> = if options.no_provider {
        None
    } else {
        Some(Arc::new(DemoProvider))
    };
    let (tab_endpoint, tab_inbox) = context_channel("tab-1", 32);
    messenger.attach(TAB, tab_endpoint);
    let script = Arc::new(ContentScript::new(
        TAB,
        doc.into_shared(),
        config.clone(),
        provider,
        Arc::new(background_endpoint.as_sender(MessageSender::tab(TAB))),
    ));
    tokio::spawn(script.clone().run(tab_inbox));

    events
        .send(TabEvent::Completed {
            tab_id: TAB,
            url: SAMPLE_URL.to_string(),
        })
        .await
        .context("coordination context stopped")?;

    let monitor = StatusMonitor::new(
        Arc::new(background_endpoint),
        RetryPolicy::from(&config.initialization),
    );
    let status = monitor.wait_until_ready(TAB).await;
    println!("Status: {}", status);

    // Scan directly so the controls exist and match the registry.
    let report = script.initialize().await;
    info!(injected = report.injected, already_marked = report.already_marked, "Page scanned");

    let found = {
        let doc = script.document().lock();
        find_control(&doc, &config, kind, action)
    };
    let (control, picker) =
        found.with_context(|| format!("no {} control on the {} surface", action, kind))?;

    if let (Some(code), Some(picker)) = (&options.language, picker) {
        if !script.select_language(picker, code) {
            anyhow::bail!("unknown language: {}", code);
        }
    }

    info!(action = %action, surface = %kind, "Activating tool");
    match script.activate(control).await {
        Some(Ok(text)) => println!("{} result:\n{}", action.label(), text),
        Some(Err(e)) => println!("{}", e.user_message()),
        None => println!("{} is unavailable", action.label()),
    }

    let state = store.get(TAB);
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
