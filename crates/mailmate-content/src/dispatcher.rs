//! Tool action execution.
//!
//! An activation marks its control busy, extracts source text under the
//! document lock, then runs the capability call on a spawned task raced
//! against the configured timeout. The document is locked again only to
//! apply the result, and only if the activation's ticket is still current.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use mailmate_config::Config;
use mailmate_core::CapabilityRegistry;
use mailmate_protocols::{ActionError, CapabilityError, CapabilityName, CapabilityRequest};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::actions::{
    ActionId, ToolActionRequest, clean_generated, format_translation, reply_prompt, write_prompt,
};
use crate::dom::{Document, Element, NodeId, Selector, SharedDocument};
use crate::injector::{TYPE_ATTR, UNAVAILABLE_TITLE};
use crate::strategy::ExtractionStrategy;
use crate::surface::{Surface, SurfaceKind};

/// Placeholder shown in the output region while an action runs.
pub const PROCESSING_MESSAGE: &str = "Processing...";

/// Where an activation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceContext {
    pub surface: Surface,
    pub cluster: NodeId,
    pub control: NodeId,
}

impl SurfaceContext {
    /// Resolve the cluster and marked surface that own `control`.
    pub fn from_control(doc: &Document, config: &Config, control: NodeId) -> Option<Self> {
        let cluster = doc.closest(control, &Selector::class(&config.ui.container_class))?;
        let kind: SurfaceKind = doc.attribute(cluster, TYPE_ATTR)?.parse().ok()?;
        let node = doc.closest(cluster, &Selector::has_attr(&config.ui.marker_attribute))?;
        Some(Self {
            surface: Surface::new(kind, node),
            cluster,
            control,
        })
    }
}

pub struct ToolActionDispatcher {
    document: SharedDocument,
    registry: Arc<CapabilityRegistry>,
    strategy: Arc<dyn ExtractionStrategy>,
    config: Arc<Config>,
    next_ticket: AtomicU64,
    in_flight: Mutex<HashMap<NodeId, u64>>,
}

impl ToolActionDispatcher {
    pub fn new(
        document: SharedDocument,
        registry: Arc<CapabilityRegistry>,
        strategy: Arc<dyn ExtractionStrategy>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            document,
            registry,
            strategy,
            config,
            next_ticket: AtomicU64::new(0),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `control` has an action in flight.
    pub fn is_busy(&self, control: NodeId) -> bool {
        self.in_flight.lock().contains_key(&control)
    }

    /// Forget every in-flight activation. Late results are discarded.
    pub fn invalidate_all(&self) {
        let dropped = {
            let mut in_flight = self.in_flight.lock();
            let count = in_flight.len();
            in_flight.clear();
            count
        };
        if dropped > 0 {
            debug!(dropped, "Invalidated in-flight actions");
        }
    }

    /// Run `action` for the control in `ctx` and render the outcome.
    ///
    /// Returns the text written on success. Errors are rendered into the
    /// output region as well, except [`ActionError::ControlBusy`],
    /// [`ActionError::Superseded`] and [`ActionError::SurfaceDetached`],
    /// which write nothing. A superseded control still leaves its loading
    /// state unless a newer activation owns it.
    pub async fn run_action(
        &self,
        action: ActionId,
        ctx: SurfaceContext,
    ) -> Result<String, ActionError> {
        let (ticket, prepared) = {
            let mut doc = self.document.lock();
            let ticket = self.begin(&mut doc, &ctx)?;
            (ticket, self.prepare(&doc, action, &ctx))
        };

        debug!(action = %action, surface = %ctx.surface.kind, ticket, "Running tool action");
        let outcome = match prepared {
            Ok(request) => self.execute_with_timeout(request).await,
            Err(e) => Err(e),
        };

        self.finish(ticket, action, &ctx, outcome)
    }

    fn begin(&self, doc: &mut Document, ctx: &SurfaceContext) -> Result<u64, ActionError> {
        if !doc.is_attached(ctx.control) || !doc.is_attached(ctx.surface.node) {
            return Err(ActionError::SurfaceDetached);
        }

        let ticket = {
            let mut in_flight = self.in_flight.lock();
            if in_flight.contains_key(&ctx.control) {
                return Err(ActionError::ControlBusy);
            }
            let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
            in_flight.insert(ctx.control, ticket);
            ticket
        };

        doc.add_class(ctx.control, &self.config.ui.loading_class);
        doc.set_attribute(ctx.control, "disabled", "true");
        let output = self.output_region(doc, ctx.cluster);
        doc.set_text(output, PROCESSING_MESSAGE);
        Ok(ticket)
    }

    fn prepare(
        &self,
        doc: &Document,
        action: ActionId,
        ctx: &SurfaceContext,
    ) -> Result<ToolActionRequest, ActionError> {
        let source = self.strategy.extract_text(doc, &ctx.surface).unwrap_or_default();

        if action == ActionId::Write {
            let subject = self.strategy.subject(doc, &ctx.surface).unwrap_or_default();
            if subject.is_empty() && source.is_empty() {
                return Err(ActionError::NoContentFound);
            }
            return Ok(ToolActionRequest::new(action, source).with_subject(subject));
        }

        if source.chars().count() <= self.config.dispatcher.min_content_chars {
            return Err(ActionError::NoContentFound);
        }

        let request = ToolActionRequest::new(action, source);
        if action == ActionId::Translate {
            return Ok(request.with_target_language(self.target_language(doc, ctx.cluster)));
        }
        Ok(request)
    }

    fn target_language(&self, doc: &Document, cluster: NodeId) -> String {
        doc.find(cluster, &Selector::class(&self.config.ui.language_select_class))
            .and_then(|picker| doc.attribute(picker, "value"))
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.config.capabilities.translator.default_target.clone())
    }

    async fn execute_with_timeout(
        &self,
        request: ToolActionRequest,
    ) -> Result<String, ActionError> {
        let registry = self.registry.clone();
        let config = self.config.clone();
        let timeout = self.config.dispatcher.timeout();

        // The provider has no cancellation; on timeout the task is left to
        // finish on its own and its result is dropped.
        let task = tokio::spawn(async move { execute(&registry, &config, request).await });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ActionError::Capability(CapabilityError::Unknown(e.to_string()))),
            Err(_) => Err(ActionError::OperationTimedOut(timeout.as_secs())),
        }
    }

    fn finish(
        &self,
        ticket: u64,
        action: ActionId,
        ctx: &SurfaceContext,
        outcome: Result<String, ActionError>,
    ) -> Result<String, ActionError> {
        let mut doc = self.document.lock();

        let owner = self.in_flight.lock().get(&ctx.control).copied();
        match owner {
            Some(current) if current == ticket => {
                self.in_flight.lock().remove(&ctx.control);
            }
            Some(_) => {
                debug!(action = %action, ticket, "Control owned by a newer action");
                return Err(ActionError::Superseded);
            }
            None => {
                debug!(action = %action, ticket, "Discarding result of superseded action");
                self.release(&mut doc, ctx);
                return Err(ActionError::Superseded);
            }
        }

        if !doc.is_attached(ctx.control) {
            debug!(action = %action, "Control detached before the result arrived");
            return Err(ActionError::SurfaceDetached);
        }

        let output = self.output_region(&mut doc, ctx.cluster);
        let outcome = match outcome {
            Ok(text) if action.writes_editor() => {
                match self.strategy.write_text(&mut doc, &ctx.surface, &text) {
                    Ok(()) => {
                        doc.set_text(output, "");
                        Ok(text)
                    }
                    Err(e) => {
                        debug!(action = %action, error = %e, "Editor write failed");
                        Err(ActionError::SurfaceDetached)
                    }
                }
            }
            Ok(text) => {
                doc.set_text(output, text.as_str());
                Ok(text)
            }
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(_) => info!(action = %action, surface = %ctx.surface.kind, "Tool action completed"),
            Err(e) => {
                warn!(action = %action, error = %e, "Tool action failed");
                doc.set_text(output, e.user_message());
            }
        }

        self.restore_control(&mut doc, ctx.control);
        outcome
    }

    /// Give back a control whose result is discarded. Clears the
    /// placeholder but writes no result.
    fn release(&self, doc: &mut Document, ctx: &SurfaceContext) {
        if !doc.is_attached(ctx.control) {
            return;
        }
        let output = doc
            .find(ctx.cluster, &Selector::class(&self.config.ui.output_class))
            .filter(|o| doc.text_content(*o) == PROCESSING_MESSAGE);
        if let Some(output) = output {
            doc.set_text(output, "");
        }
        self.restore_control(doc, ctx.control);
    }

    /// Leave the loading state, matching the registry's current usability.
    fn restore_control(&self, doc: &mut Document, control: NodeId) {
        doc.remove_class(control, &self.config.ui.loading_class);
        if self.registry.is_usable() {
            doc.remove_attribute(control, "disabled");
            doc.remove_attribute(control, "title");
        } else {
            doc.set_attribute(control, "disabled", "true");
            doc.set_attribute(control, "title", UNAVAILABLE_TITLE);
        }
    }

    /// The cluster's output region, created on first use.
    fn output_region(&self, doc: &mut Document, cluster: NodeId) -> NodeId {
        let class = &self.config.ui.output_class;
        match doc.find(cluster, &Selector::class(class)) {
            Some(output) => output,
            None => doc.append(cluster, &Element::new("div").class(class.as_str())),
        }
    }
}

/// Run the capability calls for one request. No document access.
async fn execute(
    registry: &CapabilityRegistry,
    config: &Config,
    request: ToolActionRequest,
) -> Result<String, ActionError> {
    let ToolActionRequest {
        action_id,
        source_text,
        subject,
        target_language,
    } = request;

    let generated = match action_id {
        ActionId::Translate => {
            let target = target_language
                .unwrap_or_else(|| config.capabilities.translator.default_target.clone());
            return translate(registry, config, &source_text, &target).await;
        }
        ActionId::Write => {
            let prompt = write_prompt(subject.as_deref().unwrap_or(""), &source_text);
            clean_generated(&generate(registry, CapabilityName::Writer, prompt).await?)
        }
        ActionId::QuickResponse => {
            let prompt = reply_prompt(&source_text);
            generate(registry, CapabilityName::Writer, prompt).await?
        }
        ActionId::Rewrite | ActionId::Summarize => {
            generate(registry, action_id.capability(), source_text).await?
        }
    };

    let generated = generated.trim();
    if generated.is_empty() {
        return Err(ActionError::EmptyResult);
    }
    Ok(generated.to_string())
}

async fn generate(
    registry: &CapabilityRegistry,
    capability: CapabilityName,
    text: String,
) -> Result<String, ActionError> {
    let output = registry
        .invoke(capability, CapabilityRequest::text(text))
        .await?;
    Ok(output.into_text().map_err(CapabilityError::from)?)
}

async fn translate(
    registry: &CapabilityRegistry,
    config: &Config,
    text: &str,
    target: &str,
) -> Result<String, ActionError> {
    let detections = registry
        .invoke(CapabilityName::LanguageDetector, CapabilityRequest::text(text))
        .await?
        .into_detections()
        .map_err(CapabilityError::from)?;
    let detected = detections
        .into_iter()
        .next()
        .ok_or(ActionError::DetectionFailed)?;

    let source = detected.detected_language.as_str();
    if source == target {
        return Err(ActionError::SameLanguage(config.language_name(target).to_string()));
    }

    let options = registry.defaults().translator_options(source, target);
    let translated = registry
        .invoke_with(CapabilityName::Translator, options, CapabilityRequest::text(text))
        .await?
        .into_text()
        .map_err(CapabilityError::from)?;
    if translated.trim().is_empty() {
        return Err(ActionError::EmptyResult);
    }

    Ok(format_translation(
        &detected,
        config.language_name(source),
        config.language_name(target),
        &translated,
    ))
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
