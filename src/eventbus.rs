//! Event fan-out.
//!
//! [`InputEventBus`] delivers [`InputEvent`]s to registered listeners. Each
//! listener has an [`EventFilter`], an optional device tag, and an enabled
//! flag; listeners can be muted and removed by the id returned on
//! registration. Delivery follows registration order.
//!
//! Any `FnMut(&InputEvent)` is a listener.

use std::fmt;

use crate::device::DeviceId;
use crate::event::InputEvent;

/// Receives input events.
pub trait InputListener {
    fn on_input(&mut self, event: &InputEvent);
}

impl<F: FnMut(&InputEvent)> InputListener for F {
    fn on_input(&mut self, event: &InputEvent) {
        self(event)
    }
}

/// Which events a listener wants.
#[derive(Clone, Copy, Debug)]
pub enum EventFilter {
    All,
    /// Press/release edges only.
    PressOnly,
    /// Registration and ambiguity changes only.
    LifecycleOnly,
    Custom(fn(&InputEvent) -> bool),
}

impl EventFilter {
    pub fn accepts(&self, event: &InputEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::PressOnly => event.is_press(),
            EventFilter::LifecycleOnly => event.is_lifecycle(),
            EventFilter::Custom(f) => f(event),
        }
    }
}

/// Handle of a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ListenerEntry {
    id: ListenerId,
    listener: Box<dyn InputListener>,
    enabled: bool,
    filter: EventFilter,
    device: Option<DeviceId>,
}

#[derive(Default)]
pub struct InputEventBus {
    next_id: u64,
    listeners: Vec<ListenerEntry>,
}

impl InputEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. With `device` set, only events of that device
    /// reach it; class-wide notifications carry no device and are skipped.
    pub fn add_listener(
        &mut self,
        listener: impl InputListener + 'static,
        filter: EventFilter,
        device: Option<DeviceId>,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(ListenerEntry {
            id,
            listener: Box::new(listener),
            enabled: true,
            filter,
            device,
        });
        id
    }

    fn entry_mut(&mut self, id: ListenerId) -> Option<&mut ListenerEntry> {
        self.listeners.iter_mut().find(|e| e.id == id)
    }

    pub fn enable(&mut self, id: ListenerId) {
        if let Some(entry) = self.entry_mut(id) {
            entry.enabled = true;
        }
    }

    /// Mute a listener without removing it.
    pub fn disable(&mut self, id: ListenerId) {
        if let Some(entry) = self.entry_mut(id) {
            entry.enabled = false;
        }
    }

    /// Returns whether the listener existed.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|e| e.id != id);
        before != self.listeners.len()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn emit(&mut self, event: &InputEvent) {
        for entry in &mut self.listeners {
            if !entry.enabled {
                continue;
            }
            if entry.device.is_some() && entry.device != event.device {
                continue;
            }
            if entry.filter.accepts(event) {
                entry.listener.on_input(event);
            }
        }
    }

    pub fn emit_all(&mut self, events: &[InputEvent]) {
        for event in events {
            self.emit(event);
        }
    }
}

impl fmt::Debug for InputEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputEventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::InputKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn press(device: DeviceId, feature: &str) -> InputEvent {
        InputEvent::new(
            "pad",
            Some(device),
            InputKind::Pressed {
                feature: feature.into(),
                direction: None,
            },
        )
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl FnMut(&InputEvent)) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |e: &InputEvent| sink.borrow_mut().push(e.to_string()))
    }

    #[test]
    fn test_filters_and_tags() {
        let dev_a = DeviceId::next();
        let dev_b = DeviceId::next();
        let mut bus = InputEventBus::new();

        let (all, l) = recorder();
        bus.add_listener(l, EventFilter::All, None);
        let (lifecycle, l) = recorder();
        bus.add_listener(l, EventFilter::LifecycleOnly, None);
        let (only_b, l) = recorder();
        bus.add_listener(l, EventFilter::PressOnly, Some(dev_b));
        let (custom, l) = recorder();
        bus.add_listener(
            l,
            EventFilter::Custom(|e| e.feature() == Some("x")),
            None,
        );

        bus.emit_all(&[
            press(dev_a, "a"),
            press(dev_b, "x"),
            InputEvent::new("pad", None, InputKind::Ambiguous { count: 2 }),
        ]);

        assert_eq!(all.borrow().len(), 3);
        assert_eq!(lifecycle.borrow().len(), 1);
        assert_eq!(only_b.borrow().len(), 1);
        assert!(only_b.borrow()[0].ends_with("pressed x"));
        assert_eq!(custom.borrow().len(), 1);
    }

    #[test]
    fn test_disable_enable_remove() {
        let dev = DeviceId::next();
        let mut bus = InputEventBus::new();
        let (seen, l) = recorder();
        let id = bus.add_listener(l, EventFilter::All, None);

        bus.disable(id);
        bus.emit(&press(dev, "a"));
        assert!(seen.borrow().is_empty());

        bus.enable(id);
        bus.emit(&press(dev, "a"));
        assert_eq!(seen.borrow().len(), 1);

        assert!(bus.remove_listener(id));
        assert!(!bus.remove_listener(id));
        bus.emit(&press(dev, "a"));
        assert_eq!(seen.borrow().len(), 1);
        assert!(bus.is_empty());
    }
}
