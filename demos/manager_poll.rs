use std::time::Duration;

use stickhal::config::InputConfig;
use stickhal::eventbus::EventFilter;
use stickhal::logger::LogListener;
use stickhal::Manager;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => InputConfig::load(&path).expect("load config"),
        None => InputConfig::default(),
    };

    let mut manager = Manager::discover_with(&config);
    manager
        .bus_mut()
        .add_listener(LogListener, EventFilter::All, None);

    loop {
        if let Err(e) = manager.poll() {
            log::warn!("{e}");
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}
