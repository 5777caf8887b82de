use crate::event::InputEvent;
use crate::eventbus::InputListener;

/// Listener that writes every event to the `log` facade at info level.
#[derive(Debug, Default)]
pub struct LogListener;

impl LogListener {
    pub fn new() -> Self {
        LogListener
    }
}

impl InputListener for LogListener {
    fn on_input(&mut self, event: &InputEvent) {
        log::info!(target: "stickhal::input", "{event}");
    }
}
