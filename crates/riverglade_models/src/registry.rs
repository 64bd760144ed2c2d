use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tokio::sync::watch;

use crate::catalog::{ModelEntry, ModelMetadata};
use crate::error::RegistryError;
use crate::source::ModelSource;
use crate::template::ModelTemplate;

type LoadOutcome = Result<Rc<ModelTemplate>, RegistryError>;

/// Load state of one catalog entry
enum ModelSlot {
    NotStarted,
    /// A load task is running; waiters subscribe to its result
    Loading(watch::Receiver<Option<LoadOutcome>>),
    /// Final outcome, success or failure. Never retried.
    Ready(LoadOutcome),
}

/// Vegetation model lookup with lazy, deduplicated template loading
///
/// Metadata is available immediately from the catalog. Templates are loaded
/// on first request and cached; while a load is in flight every other
/// request for the same name waits on it instead of starting a second one.
///
/// The registry is single-threaded: it lives in an `Rc` and loads run as
/// tasks on the current [`tokio::task::LocalSet`].
pub struct ModelRegistry<S> {
    source: S,
    catalog: HashMap<String, ModelEntry>,
    slots: RefCell<HashMap<String, ModelSlot>>,
    next_instance: Cell<u64>,
}

impl<S: ModelSource + 'static> ModelRegistry<S> {
    pub fn new(source: S, entries: impl IntoIterator<Item = ModelEntry>) -> Self {
        let catalog: HashMap<String, ModelEntry> = entries
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect();
        let slots = catalog
            .keys()
            .map(|name| (name.clone(), ModelSlot::NotStarted))
            .collect();

        log::info!("Model registry created with {} models", catalog.len());

        Self {
            source,
            catalog,
            slots: RefCell::new(slots),
            next_instance: Cell::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn contains(&self, name: &str) -> bool {
        self.catalog.contains_key(name)
    }

    /// Static metadata for a registered model
    pub fn metadata(&self, name: &str) -> Result<ModelMetadata, RegistryError> {
        self.catalog
            .get(name)
            .map(ModelEntry::metadata)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Hand out a fresh id for a new instance
    pub fn next_instance_id(&self) -> u64 {
        let id = self.next_instance.get();
        self.next_instance.set(id + 1);
        id
    }

    /// True once a load for `name` has finished, successfully or not
    pub fn is_resolved(&self, name: &str) -> bool {
        matches!(self.slots.borrow().get(name), Some(ModelSlot::Ready(_)))
    }

    /// Get the shared template for `name`, loading it on first use
    ///
    /// Must be awaited inside a `LocalSet`: the first request spawns the load
    /// as a local task so it completes even if the requester goes away.
    pub async fn materialize(self: &Rc<Self>, name: &str) -> LoadOutcome {
        let mut receiver = {
            let mut slots = self.slots.borrow_mut();
            let slot = slots
                .get_mut(name)
                .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

            match slot {
                ModelSlot::Ready(outcome) => return outcome.clone(),
                ModelSlot::Loading(receiver) => receiver.clone(),
                ModelSlot::NotStarted => {
                    let (sender, receiver) = watch::channel(None);
                    *slot = ModelSlot::Loading(receiver.clone());

                    let registry = Rc::clone(self);
                    let key = name.to_string();
                    tokio::task::spawn_local(async move {
                        registry.run_load(key, sender).await;
                    });
                    receiver
                }
            }
        };

        let outcome = match receiver.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone().unwrap_or_else(|| Err(abandoned(name))),
            Err(_) => Err(abandoned(name)),
        };
        outcome
    }

    async fn run_load(self: Rc<Self>, name: String, sender: watch::Sender<Option<LoadOutcome>>) {
        let outcome = match self.catalog.get(&name) {
            Some(entry) => match self.source.load(entry).await {
                Ok(template) => Ok(Rc::new(template)),
                Err(e) => {
                    log::error!("Error while loading {}: {}", name, e);
                    Err(RegistryError::Load {
                        name: name.clone(),
                        reason: e.to_string(),
                    })
                }
            },
            None => Err(RegistryError::NotFound(name.clone())),
        };

        self.slots
            .borrow_mut()
            .insert(name, ModelSlot::Ready(outcome.clone()));
        sender.send_replace(Some(outcome));
    }
}

fn abandoned(name: &str) -> RegistryError {
    RegistryError::Load {
        name: name.to_string(),
        reason: "load task ended without a result".to_string(),
    }
}
