//! Input notifications and a subscriber list to deliver them.

use glam::Vec2;

/// Activity transition detected by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Started,
    Ended,
}

/// Notification emitted by the live provider or re-emitted by playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Smoothed direction, sent every tick while input is active.
    Movement(Vec2),
    Started,
    Ended,
}

impl From<Edge> for InputEvent {
    fn from(edge: Edge) -> Self {
        match edge {
            Edge::Started => InputEvent::Started,
            Edge::Ended => InputEvent::Ended,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Box<dyn FnMut(&E)>;

/// Ordered observer list. Each `emit` reaches every subscriber exactly once,
/// in subscription order.
pub struct EventBus<E> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Handler<E>)>,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Returns `false` if the id was never issued or already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, handler) in &mut self.subscribers {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}
