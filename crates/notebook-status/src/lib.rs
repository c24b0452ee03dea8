//! Status messages for notebook-ui hosts.
//!
//! A [`StatusBus`] is an explicit handle: components that report progress or
//! failures receive a clone of it, and views that render a status line
//! subscribe to it. Listeners stay registered for as long as their
//! [`Subscription`] is alive.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Identifier of a published message; increases with every publish
pub type MessageId = u64;

/// Severity of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatusLevel::Info => "info",
            StatusLevel::Success => "success",
            StatusLevel::Warning => "warning",
            StatusLevel::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub id: MessageId,
    pub level: StatusLevel,
    pub text: String,
}

/// Callback type for receiving status messages.
pub type StatusCallback = Box<dyn FnMut(&StatusMessage)>;

#[derive(Default)]
struct BusState {
    next_message_id: MessageId,
    next_listener_id: u64,
    listeners: Vec<(u64, StatusCallback)>,
    current: Option<StatusMessage>,
    queue: VecDeque<StatusMessage>,
    delivering: bool,
    // Listeners removed while their list was checked out for delivery
    removed_during_delivery: Vec<u64>,
}

/// Cloneable, single-threaded publish/subscribe handle.
#[derive(Clone, Default)]
pub struct StatusBus {
    state: Rc<RefCell<BusState>>,
}

impl StatusBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for every message published from now on.
    pub fn subscribe(&self, listener: impl FnMut(&StatusMessage) + 'static) -> Subscription {
        let mut state = self.state.borrow_mut();
        let id = state.next_listener_id;
        state.next_listener_id += 1;
        state.listeners.push((id, Box::new(listener)));
        trace!(listener = id, "status listener subscribed");

        Subscription {
            bus: Rc::downgrade(&self.state),
            id: Some(id),
        }
    }

    /// Publish a message to every listener and make it the current one.
    ///
    /// Called from inside a listener, the message is queued and delivered
    /// once the in-flight delivery finishes.
    pub fn publish(&self, level: StatusLevel, text: impl Into<String>) -> MessageId {
        let message = {
            let mut state = self.state.borrow_mut();
            state.next_message_id += 1;
            let message = StatusMessage {
                id: state.next_message_id,
                level,
                text: text.into(),
            };
            state.queue.push_back(message.clone());
            if state.delivering {
                trace!(id = message.id, "status message queued");
                return message.id;
            }
            state.delivering = true;
            message
        };

        debug!(id = message.id, %level, text = %message.text, "status");
        self.drain();
        message.id
    }

    pub fn info(&self, text: impl Into<String>) -> MessageId {
        self.publish(StatusLevel::Info, text)
    }

    pub fn success(&self, text: impl Into<String>) -> MessageId {
        self.publish(StatusLevel::Success, text)
    }

    pub fn warning(&self, text: impl Into<String>) -> MessageId {
        self.publish(StatusLevel::Warning, text)
    }

    pub fn error(&self, text: impl Into<String>) -> MessageId {
        self.publish(StatusLevel::Error, text)
    }

    /// The most recently delivered message, unless dismissed
    pub fn current(&self) -> Option<StatusMessage> {
        self.state.borrow().current.clone()
    }

    /// Clear the current message if it is `id`. Returns whether it was cleared.
    pub fn dismiss(&self, id: MessageId) -> bool {
        let mut state = self.state.borrow_mut();
        match &state.current {
            Some(message) if message.id == id => {
                state.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn listener_count(&self) -> usize {
        let state = self.state.borrow();
        state.listeners.len()
    }

    fn drain(&self) {
        loop {
            let message = {
                let mut state = self.state.borrow_mut();
                match state.queue.pop_front() {
                    Some(message) => {
                        state.current = Some(message.clone());
                        message
                    }
                    None => {
                        state.delivering = false;
                        return;
                    }
                }
            };

            // Listeners run without the state borrowed so they may publish,
            // subscribe or drop subscriptions.
            let mut listeners = std::mem::take(&mut self.state.borrow_mut().listeners);
            for (id, listener) in listeners.iter_mut() {
                if self.state.borrow().removed_during_delivery.contains(id) {
                    continue;
                }
                listener(&message);
            }

            let mut state = self.state.borrow_mut();
            let removed = std::mem::take(&mut state.removed_during_delivery);
            listeners.retain(|(id, _)| !removed.contains(id));
            listeners.append(&mut state.listeners);
            state.listeners = listeners;
        }
    }
}

impl fmt::Debug for StatusBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("StatusBus")
            .field("listeners", &state.listeners.len())
            .field("current", &state.current)
            .finish()
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    bus: Weak<RefCell<BusState>>,
    id: Option<u64>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let (Some(id), Some(bus)) = (self.id.take(), self.bus.upgrade()) else {
            return;
        };

        let mut state = bus.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|(listener, _)| *listener != id);
        if state.listeners.len() == before && state.delivering {
            state.removed_during_delivery.push(id);
        }
        trace!(listener = id, "status listener unsubscribed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Listener that records every message it sees, for tests and headless hosts
#[derive(Clone, Default)]
pub struct StatusCollector {
    messages: Rc<RefCell<Vec<StatusMessage>>>,
}

impl StatusCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, bus: &StatusBus) -> Subscription {
        let messages = Rc::clone(&self.messages);
        bus.subscribe(move |message| messages.borrow_mut().push(message.clone()))
    }

    pub fn messages(&self) -> Vec<StatusMessage> {
        self.messages.borrow().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.messages.borrow().iter().map(|m| m.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }
}
