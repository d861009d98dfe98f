//! Pub/Sub event bus between the session and UI glue.
//!
//! - `subscribe()` registers a callback per event type
//! - `emit()` runs callbacks synchronously, then queues the event
//! - `poll()` drains the queue for batch processing in the host loop
//!
//! Callback order: FIFO within one event type. No ordering across types.
//!
//! The bus lives on the UI thread together with the session, so state is
//! `Rc<RefCell<..>>` rather than locks. Callbacks may emit further events;
//! the subscriber list is snapshotted before dispatch.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::warn;

/// Maximum events in queue before oldest are evicted
const MAX_QUEUE_SIZE: usize = 256;

/// Marker trait for events.
pub trait Event: Any {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

type Callback = Rc<dyn Fn(&dyn Any)>;

/// Boxed event for queue storage
pub type BoxedEvent = Box<dyn Event>;

#[derive(Default)]
struct Inner {
    subscribers: HashMap<TypeId, Vec<Callback>>,
    queue: Vec<BoxedEvent>,
}

impl Inner {
    fn callbacks(&self, type_id: TypeId) -> Vec<Callback> {
        self.subscribers.get(&type_id).cloned().unwrap_or_default()
    }

    fn enqueue(&mut self, event: BoxedEvent) {
        if self.queue.len() >= MAX_QUEUE_SIZE {
            let evict = self.queue.len() / 2;
            warn!("EventBus queue full ({} events), evicting oldest {}", self.queue.len(), evict);
            self.queue.drain(0..evict);
        }
        self.queue.push(event);
    }
}

fn dispatch<E: Event>(inner: &RefCell<Inner>, event: E) {
    let callbacks = inner.borrow().callbacks(TypeId::of::<E>());
    for cb in &callbacks {
        cb(&event);
    }
    inner.borrow_mut().enqueue(Box::new(event));
}

/// Event bus owner handle.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<Inner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events of type E.
    ///
    /// # Example
    /// ```ignore
    /// bus.subscribe::<SlideChangedEvent, _>(|e| println!("slide {}", e.index));
    /// ```
    pub fn subscribe<E, F>(&self, callback: F)
    where
        E: Event,
        F: Fn(&E) + 'static,
    {
        let wrapped: Callback = Rc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                callback(event);
            }
        });
        self.inner
            .borrow_mut()
            .subscribers
            .entry(TypeId::of::<E>())
            .or_default()
            .push(wrapped);
    }

    /// Invoke callbacks for `event`, then queue it for `poll()`.
    pub fn emit<E: Event>(&self, event: E) {
        dispatch(&self.inner, event);
    }

    /// Drain everything emitted since the last poll.
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut self.inner.borrow_mut().queue)
    }

    /// Emitter handle for components that only publish.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            inner: Some(Rc::clone(&self.inner)),
        }
    }

    pub fn unsubscribe_all<E: Event>(&self) {
        self.inner.borrow_mut().subscribers.remove(&TypeId::of::<E>());
    }

    pub fn queue_len(&self) -> usize {
        self.inner.borrow().queue.len()
    }
}

/// Publish-only handle. `EventEmitter::default()` is detached and drops
/// everything (sessions built without a bus).
#[derive(Clone, Default)]
pub struct EventEmitter {
    inner: Option<Rc<RefCell<Inner>>>,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("attached", &self.inner.is_some())
            .finish()
    }
}

impl EventEmitter {
    pub fn emit<E: Event>(&self, event: E) {
        if let Some(inner) = &self.inner {
            dispatch(inner, event);
        }
    }
}

/// Downcast a queued event to its concrete type.
///
/// Deref to `dyn Event` first: calling `as_any()` on the `Box` itself would hit
/// the blanket impl for `Box<dyn Event>` and the downcast would always fail.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}
