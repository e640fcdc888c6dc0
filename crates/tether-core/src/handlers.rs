//! Message-type handler registry.
//!
//! Components register interest in a message type at their own startup. Each
//! type maps to a list of entries ordered by descending priority; entries with
//! equal priority keep registration order. The registry never dispatches; it
//! only answers lookups.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("handler for '{message_type}' already registered by '{owner}'")]
    DuplicateHandler { message_type: String, owner: String },
}

/// Options for [`HandlerRegistry::register`].
#[derive(Clone, Copy, Debug)]
pub struct RegisterOptions {
    /// Replace an existing entry from the same owner instead of failing.
    pub allow_replace: bool,
    /// Higher runs first.
    pub priority: i32,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            allow_replace: true,
            priority: 0,
        }
    }
}

impl RegisterOptions {
    pub fn strict() -> Self {
        Self {
            allow_replace: false,
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// One registered handler.
pub struct HandlerEntry<H: ?Sized> {
    pub owner: String,
    pub handler: Arc<H>,
    pub priority: i32,
}

impl<H: ?Sized> Clone for HandlerEntry<H> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            handler: Arc::clone(&self.handler),
            priority: self.priority,
        }
    }
}

impl<H: ?Sized> std::fmt::Debug for HandlerEntry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("owner", &self.owner)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Registry mapping message types to priority-ordered handlers.
pub struct HandlerRegistry<H: ?Sized> {
    entries: RwLock<HashMap<String, Vec<HandlerEntry<H>>>>,
}

impl<H: ?Sized> HandlerRegistry<H> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register `handler` for `message_type` on behalf of `owner`.
    pub fn register(
        &self,
        message_type: &str,
        handler: Arc<H>,
        owner: &str,
        options: RegisterOptions,
    ) -> Result<(), RegistryError> {
        let mut entries = self.entries.write();
        let list = entries.entry(message_type.to_owned()).or_default();

        let entry = HandlerEntry {
            owner: owner.to_owned(),
            handler,
            priority: options.priority,
        };

        match list.iter().position(|e| e.owner == owner) {
            Some(_) if !options.allow_replace => {
                return Err(RegistryError::DuplicateHandler {
                    message_type: message_type.to_owned(),
                    owner: owner.to_owned(),
                });
            }
            Some(index) => {
                tracing::debug!(message_type, owner, "Replacing message handler");
                list[index] = entry;
            }
            None => list.push(entry),
        }

        // Stable sort: equal priorities keep registration order.
        list.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(())
    }

    /// Remove the entry whose handler is `handler` (pointer identity).
    pub fn unregister(&self, message_type: &str, handler: &Arc<H>) -> bool {
        let mut entries = self.entries.write();
        let Some(list) = entries.get_mut(message_type) else {
            return false;
        };
        let before = list.len();
        list.retain(|e| !same_handler(&e.handler, handler));
        let removed = list.len() != before;
        if list.is_empty() {
            entries.remove(message_type);
        }
        removed
    }

    /// All entries for `message_type`, highest priority first. Empty if unknown.
    pub fn handlers(&self, message_type: &str) -> Vec<HandlerEntry<H>> {
        self.entries
            .read()
            .get(message_type)
            .cloned()
            .unwrap_or_default()
    }

    /// The highest-priority handler for `message_type`.
    pub fn primary(&self, message_type: &str) -> Option<Arc<H>> {
        self.entries
            .read()
            .get(message_type)
            .and_then(|list| list.first())
            .map(|e| Arc::clone(&e.handler))
    }

    pub fn has_handlers(&self, message_type: &str) -> bool {
        self.entries
            .read()
            .get(message_type)
            .is_some_and(|list| !list.is_empty())
    }

    pub fn owners(&self, message_type: &str) -> Vec<String> {
        self.handlers(message_type)
            .into_iter()
            .map(|e| e.owner)
            .collect()
    }

    /// Registered message types (sorted).
    pub fn message_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.entries.read().keys().cloned().collect();
        types.sort();
        types
    }
}

impl<H: ?Sized> Default for HandlerRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

fn same_handler<H: ?Sized>(a: &Arc<H>, b: &Arc<H>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
