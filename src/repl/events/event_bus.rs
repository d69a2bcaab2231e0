//! # Event Bus
//!
//! Fan-out of session model events to any number of observers, used to
//! trace what the search session is doing without coupling it to logging.

use super::model_events::ModelEvent;

/// Type alias for model event handlers to reduce complexity
pub type ModelEventHandler = Box<dyn Fn(&ModelEvent) + Send + Sync>;

/// Event bus for decoupled communication between components
pub trait EventBus: Send + Sync {
    /// Deliver an event to every subscriber, in subscription order
    fn publish(&mut self, event: &ModelEvent);

    fn subscribe(&mut self, handler: ModelEventHandler);

    fn subscriber_count(&self) -> usize;
}

/// Simple in-memory event bus implementation
#[derive(Default)]
pub struct SimpleEventBus {
    handlers: Vec<ModelEventHandler>,
}

impl SimpleEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus with a subscriber that traces every event at debug level
    pub fn with_tracing() -> Self {
        let mut bus = Self::new();
        bus.subscribe(Box::new(|event| {
            tracing::debug!("model event: {:?}", event);
        }));
        bus
    }
}

impl EventBus for SimpleEventBus {
    fn publish(&mut self, event: &ModelEvent) {
        for handler in &self.handlers {
            handler(event);
        }
    }

    fn subscribe(&mut self, handler: ModelEventHandler) {
        self.handlers.push(handler);
    }

    fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}
