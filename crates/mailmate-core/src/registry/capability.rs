//! Registry of capability availability and cached instances.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use mailmate_protocols::{
    CapabilityError, CapabilityInstance, CapabilityMap, CapabilityName, CapabilityOptions,
    CapabilityOutput, CapabilityProvider, CapabilityRequest,
};

use super::defaults::CapabilityDefaults;

#[cfg(test)]
#[path = "capability_tests.rs"]
mod tests;

struct CachedInstance {
    options: CapabilityOptions,
    instance: Arc<dyn CapabilityInstance>,
}

/// Probes the provider and owns every long-lived capability instance.
///
/// At most one instance per capability is cached. Handles handed out by
/// [`ensure_instance`](Self::ensure_instance) are for a single call and
/// must not be retained.
pub struct CapabilityRegistry {
    provider: Option<Arc<dyn CapabilityProvider>>,
    defaults: CapabilityDefaults,
    availability: RwLock<Option<CapabilityMap>>,
    instances: DashMap<CapabilityName, CachedInstance>,
}

impl CapabilityRegistry {
    /// Create a registry backed by a provider.
    pub fn new(provider: Arc<dyn CapabilityProvider>, defaults: CapabilityDefaults) -> Self {
        Self {
            provider: Some(provider),
            defaults,
            availability: RwLock::new(None),
            instances: DashMap::new(),
        }
    }

    /// Create a registry for a context where no provider exists.
    pub fn without_provider(defaults: CapabilityDefaults) -> Self {
        Self {
            provider: None,
            defaults,
            availability: RwLock::new(None),
            instances: DashMap::new(),
        }
    }

    pub fn defaults(&self) -> &CapabilityDefaults {
        &self.defaults
    }

    /// Probe every capability and record the resulting map.
    ///
    /// Each capability is probed on its own; a failure only marks that
    /// capability unavailable. Language detection is only probed when the
    /// provider exposes translation.
    pub async fn probe_all(&self) -> CapabilityMap {
        let mut map = CapabilityMap::unavailable();

        let Some(provider) = &self.provider else {
            warn!("No capability provider present");
            *self.availability.write() = Some(map.clone());
            return map;
        };

        for name in CapabilityName::ALL {
            if name == CapabilityName::LanguageDetector
                && !provider.exposes(CapabilityName::Translator)
            {
                debug!(capability = %name, "Skipping probe, translator not exposed");
                continue;
            }

            let options = self.defaults.probe_options(name);
            match provider.probe(name, &options).await {
                Ok(instance) => {
                    map.set(name, true);
                    if let Err(e) = instance.destroy().await {
                        debug!(capability = %name, error = %e, "Failed to destroy probe instance");
                    }
                }
                Err(e) => {
                    debug!(capability = %name, error = %e, "Capability probe failed");
                }
            }
        }

        info!(
            provider = provider.id(),
            available = ?map.available(),
            "Capability probe complete"
        );
        *self.availability.write() = Some(map.clone());
        map
    }

    /// The map from the last probe, if any.
    pub fn capabilities(&self) -> Option<CapabilityMap> {
        self.availability.read().clone()
    }

    /// Whether the last probe found at least one capability.
    pub fn is_usable(&self) -> bool {
        self.availability
            .read()
            .as_ref()
            .is_some_and(|map| map.any_available())
    }

    pub fn is_available(&self, name: CapabilityName) -> bool {
        self.availability
            .read()
            .as_ref()
            .is_some_and(|map| map.get(name))
    }

    /// Cached instance for `name`, created with default options on first use.
    pub async fn ensure_instance(
        &self,
        name: CapabilityName,
    ) -> Result<Arc<dyn CapabilityInstance>, CapabilityError> {
        let cached = self.instances.get(&name).map(|c| c.instance.clone());
        if let Some(instance) = cached {
            return Ok(instance);
        }
        let options = self.defaults.default_options(name);
        self.ensure_instance_with(name, options).await
    }

    /// Cached instance for `name` created with exactly `options`.
    ///
    /// A cached instance created with different options is replaced and
    /// destroyed.
    pub async fn ensure_instance_with(
        &self,
        name: CapabilityName,
        options: CapabilityOptions,
    ) -> Result<Arc<dyn CapabilityInstance>, CapabilityError> {
        if !self.is_available(name) {
            return Err(CapabilityError::Unavailable(name));
        }

        if let Some(existing) = self.cached_with(name, &options) {
            return Ok(existing);
        }

        let provider = self
            .provider
            .as_ref()
            .ok_or(CapabilityError::Unavailable(name))?;

        debug!(capability = %name, "Creating capability instance");
        let instance: Arc<dyn CapabilityInstance> = provider
            .create(name, &options)
            .await
            .map_err(CapabilityError::classify)?
            .into();

        // Another caller may have filled the slot while we were creating.
        if let Some(existing) = self.cached_with(name, &options) {
            release(name, instance).await;
            return Ok(existing);
        }

        let replaced = self.instances.insert(
            name,
            CachedInstance {
                options,
                instance: instance.clone(),
            },
        );
        if let Some(old) = replaced {
            debug!(capability = %name, "Replacing cached instance");
            release(name, old.instance).await;
        }

        Ok(instance)
    }

    fn cached_with(
        &self,
        name: CapabilityName,
        options: &CapabilityOptions,
    ) -> Option<Arc<dyn CapabilityInstance>> {
        self.instances
            .get(&name)
            .filter(|c| &c.options == options)
            .map(|c| c.instance.clone())
    }

    /// Invoke a capability through its default instance.
    pub async fn invoke(
        &self,
        name: CapabilityName,
        request: CapabilityRequest,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let instance = self.ensure_instance(name).await?;
        Self::run(name, instance, request).await
    }

    /// Invoke a capability through an instance created with `options`.
    pub async fn invoke_with(
        &self,
        name: CapabilityName,
        options: CapabilityOptions,
        request: CapabilityRequest,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let instance = self.ensure_instance_with(name, options).await?;
        Self::run(name, instance, request).await
    }

    async fn run(
        name: CapabilityName,
        instance: Arc<dyn CapabilityInstance>,
        request: CapabilityRequest,
    ) -> Result<CapabilityOutput, CapabilityError> {
        instance.invoke(request).await.map_err(|e| {
            let error = CapabilityError::classify(e);
            warn!(capability = %name, error = %error, "Capability invocation failed");
            error
        })
    }

    /// Release every cached instance and forget availability.
    pub async fn reset(&self) {
        let names: Vec<CapabilityName> = self.instances.iter().map(|e| *e.key()).collect();
        for name in names {
            if let Some((_, cached)) = self.instances.remove(&name) {
                release(name, cached.instance).await;
            }
        }
        *self.availability.write() = None;
        debug!("Capability registry reset");
    }

    /// Number of cached instances.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

async fn release(name: CapabilityName, instance: Arc<dyn CapabilityInstance>) {
    if let Err(e) = instance.destroy().await {
        debug!(capability = %name, error = %e, "Ignoring destroy failure");
    }
}
