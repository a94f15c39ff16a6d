//! Process-wide publish/subscribe hub.
//!
//! Handlers are keyed by message type. When the aggregator is bound to a
//! [`Dispatcher`], every handler runs on the UI thread no matter which thread
//! published the message:
//!
//! - [`EventAggregator::send`] blocks until all handlers have run.
//! - [`EventAggregator::post`] queues delivery and returns immediately.
//!
//! An unbound aggregator (see [`EventAggregator::new`]) delivers inline on
//! the publishing thread.
//!
//! There is no ordering contract between handlers of the same type.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dispatcher::{DispatchError, Dispatcher};

type ErasedHandler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Identity of one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Returned by [`EventAggregator::register`]; pass it back to
/// [`EventAggregator::unregister`] to remove the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    message_type: TypeId,
    message_name: &'static str,
    handler: HandlerId,
}

impl Subscription {
    pub fn handler_id(&self) -> HandlerId {
        self.handler
    }

    pub fn message_name(&self) -> &'static str {
        self.message_name
    }
}

#[derive(Clone)]
struct HandlerEntry {
    id: HandlerId,
    call: ErasedHandler,
}

/// Cheap to clone; clones share the same handler table.
#[derive(Clone)]
pub struct EventAggregator {
    inner: Arc<AggregatorInner>,
}

struct AggregatorInner {
    handlers: RwLock<HashMap<TypeId, Vec<HandlerEntry>>>,
    next_id: AtomicU64,
    dispatcher: Option<Dispatcher>,
}

impl EventAggregator {
    /// An aggregator with no UI thread; delivery happens inline.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// An aggregator that delivers on `dispatcher`'s UI thread.
    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self::build(Some(dispatcher))
    }

    fn build(dispatcher: Option<Dispatcher>) -> Self {
        Self {
            inner: Arc::new(AggregatorInner {
                handlers: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                dispatcher,
            }),
        }
    }

    /// Register `handler` for messages of type `M`.
    pub fn register<M, F>(&self, handler: F) -> Subscription
    where
        M: Send + 'static,
        F: Fn(&M) + Send + Sync + 'static,
    {
        let id = HandlerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let call: ErasedHandler = Arc::new(move |message: &dyn Any| {
            if let Some(message) = message.downcast_ref::<M>() {
                handler(message);
            }
        });

        self.inner
            .handlers
            .write()
            .entry(TypeId::of::<M>())
            .or_default()
            .push(HandlerEntry { id, call });

        tracing::trace!(message = type_name::<M>(), handler = id.0, "Registered handler");
        Subscription {
            message_type: TypeId::of::<M>(),
            message_name: type_name::<M>(),
            handler: id,
        }
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn unregister(&self, subscription: &Subscription) -> bool {
        let mut handlers = self.inner.handlers.write();
        let Some(entries) = handlers.get_mut(&subscription.message_type) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|entry| entry.id != subscription.handler);
        let removed = entries.len() != before;
        if entries.is_empty() {
            handlers.remove(&subscription.message_type);
        }

        if removed {
            tracing::trace!(
                message = subscription.message_name,
                handler = subscription.handler.0,
                "Unregistered handler"
            );
        }
        removed
    }

    pub fn handler_count<M: 'static>(&self) -> usize {
        self.inner
            .handlers
            .read()
            .get(&TypeId::of::<M>())
            .map_or(0, Vec::len)
    }

    /// Deliver `message` to every handler for `M` and wait until they ran.
    ///
    /// A panicking handler propagates to the caller and the remaining
    /// handlers for this message are skipped.
    pub fn send<M: Send + 'static>(&self, message: M) -> Result<(), DispatchError> {
        match &self.inner.dispatcher {
            Some(dispatcher) => {
                let inner = Arc::clone(&self.inner);
                dispatcher.invoke(move || inner.deliver(&message))
            }
            None => {
                self.inner.deliver(&message);
                Ok(())
            }
        }
    }

    /// Queue `message` for delivery on the UI thread and return immediately.
    ///
    /// Without a dispatcher this delivers inline before returning.
    pub fn post<M: Send + 'static>(&self, message: M) -> Result<(), DispatchError> {
        match &self.inner.dispatcher {
            Some(dispatcher) => {
                let inner = Arc::clone(&self.inner);
                dispatcher.post(move || inner.deliver(&message))
            }
            None => {
                self.inner.deliver(&message);
                Ok(())
            }
        }
    }

    /// [`send`](Self::send), silently ignoring an absent message.
    pub fn send_optional<M: Send + 'static>(&self, message: Option<M>) -> Result<(), DispatchError> {
        match message {
            Some(message) => self.send(message),
            None => Ok(()),
        }
    }

    /// [`post`](Self::post), silently ignoring an absent message.
    pub fn post_optional<M: Send + 'static>(&self, message: Option<M>) -> Result<(), DispatchError> {
        match message {
            Some(message) => self.post(message),
            None => Ok(()),
        }
    }
}

impl AggregatorInner {
    fn deliver<M: 'static>(&self, message: &M) {
        // Snapshot so handlers can (un)register while we iterate.
        let handlers: Vec<HandlerEntry> = self
            .handlers
            .read()
            .get(&TypeId::of::<M>())
            .cloned()
            .unwrap_or_default();

        tracing::trace!(
            message = type_name::<M>(),
            handlers = handlers.len(),
            "Dispatching message"
        );
        for handler in &handlers {
            (handler.call)(message);
        }
    }
}

impl Default for EventAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers: usize = self.inner.handlers.read().values().map(Vec::len).sum();
        f.debug_struct("EventAggregator")
            .field("handlers", &handlers)
            .field("dispatcher", &self.inner.dispatcher)
            .finish()
    }
}
