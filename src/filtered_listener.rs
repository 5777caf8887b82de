use crate::event::InputEvent;
use crate::eventbus::InputListener;

/// Forwards events to `inner` only when `predicate` accepts them.
///
/// Unlike [`EventFilter::Custom`](crate::eventbus::EventFilter::Custom), the
/// predicate may capture state.
pub struct FilteredListener {
    predicate: Box<dyn FnMut(&InputEvent) -> bool>,
    inner: Box<dyn InputListener>,
}

impl FilteredListener {
    pub fn new(
        predicate: impl FnMut(&InputEvent) -> bool + 'static,
        inner: impl InputListener + 'static,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner: Box::new(inner),
        }
    }
}

impl InputListener for FilteredListener {
    fn on_input(&mut self, event: &InputEvent) {
        if (self.predicate)(event) {
            self.inner.on_input(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::InputKind;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_only_matching_events_forwarded() {
        let count = Rc::new(Cell::new(0));
        let sink = Rc::clone(&count);
        let mut listener = FilteredListener::new(
            |e: &InputEvent| e.class == "ps4",
            move |_: &InputEvent| sink.set(sink.get() + 1),
        );
        let kind = InputKind::Ambiguous { count: 2 };
        listener.on_input(&InputEvent::new("xbox", None, kind.clone()));
        listener.on_input(&InputEvent::new("ps4", None, kind));
        assert_eq!(count.get(), 1);
    }
}
