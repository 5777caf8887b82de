use std::cell::RefCell;
use std::rc::Rc;

use stickhal::backends::virtual_input::{VirtualHub, VirtualPad};
use stickhal::config::InputConfig;
use stickhal::controller::ps4;
use stickhal::{
    Device, DevicePollError, DeviceSeeker, EventFilter, FeatureFault, InputEvent, InputKind,
    Manager, Pressable, Seek, SeekerPollError,
};

fn recorder() -> (Rc<RefCell<Vec<InputEvent>>>, impl FnMut(&InputEvent)) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |e: &InputEvent| sink.borrow_mut().push(e.clone()))
}

fn assert_only_lightbar_unmapped_device(report: DevicePollError) {
    assert!(report.adapter.is_empty());
    assert_eq!(report.faults.len(), 1);
    assert!(matches!(&report.faults[0], FeatureFault::Unmapped(e) if e.feature == "lightbar"));
}

/// A fresh PS4 device on the GLFW layout reports its lightbar once.
fn assert_only_lightbar_unmapped(err: SeekerPollError) {
    assert!(err.seek.is_empty());
    assert_eq!(err.devices.len(), 1);
    for device in err.devices {
        assert_only_lightbar_unmapped_device(device.source);
    }
}

#[test]
fn test_config_applies_to_registered_devices() {
    let config = InputConfig::from_toml_str(
        r#"
        [classes.ps4]
        press_threshold = 0.8

        [classes.ps4.calibration.ls]
        deadzone = 0.2
        "#,
    )
    .unwrap();

    let hub = VirtualHub::ps4();
    let pad = VirtualPad::new("pad");
    hub.attach(pad.clone());
    let mut seeker = DeviceSeeker::new(hub).with_config(config.class("ps4").unwrap().clone());
    assert_only_lightbar_unmapped(seeker.poll().unwrap_err());

    let p = ps4();
    pad.set_axis(0, 0.15);
    pad.set_axis(3, 0.4);
    seeker.poll().unwrap();
    {
        let dev = seeker.iter().next().unwrap();
        assert_eq!(dev.press_threshold(), 0.8);
        let ls = dev.state(&p.ls).unwrap();
        assert_eq!(ls.raw().x, 0.15);
        assert_eq!(ls.position().x, 0.0);
        assert!(!dev.state(&p.lt).unwrap().is_pressed());
    }

    pad.set_axis(3, 0.8);
    seeker.poll().unwrap();
    let dev = seeker.iter().next().unwrap();
    assert!(dev.state(&p.lt).unwrap().is_pressed());
    assert!(dev.state(&p.lt).unwrap().just_pressed());
}

#[test]
fn test_dual_report_ambiguity_is_notified_once() {
    let hub = VirtualHub::ps4().dual_report(true);
    let usb = VirtualPad::new("usb");
    let bt = VirtualPad::new("bluetooth");
    hub.attach(usb.clone());
    hub.attach(bt.clone());

    let mut manager = Manager::new();
    manager.add_seeker(DeviceSeeker::new(hub.clone()));
    let (seen, listener) = recorder();
    manager
        .bus_mut()
        .add_listener(listener, EventFilter::LifecycleOnly, None);

    let err = manager.poll().unwrap_err();
    assert_eq!(err.seekers.len(), 1);
    for device in err.seekers.into_iter().flat_map(|s| s.devices) {
        assert_only_lightbar_unmapped_device(device.source);
    }
    manager.poll().unwrap();
    hub.detach(&bt);
    manager.poll().unwrap();
    manager.poll().unwrap();

    let kinds: Vec<InputKind> = seen.borrow().iter().map(|e| e.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            InputKind::DeviceRegistered { name: "usb".into() },
            InputKind::DeviceRegistered { name: "bluetooth".into() },
            InputKind::Ambiguous { count: 2 },
            InputKind::DeviceUnregistered { name: "bluetooth".into() },
            InputKind::AmbiguityResolved { count: 1 },
        ]
    );
    assert!(seen.borrow()[2].device.is_none());
    assert_eq!(manager.devices().len(), 1);
}

#[test]
fn test_device_tagged_listener() {
    let hub = VirtualHub::xbox();
    let first = VirtualPad::new("first");
    let second = VirtualPad::new("second");
    hub.attach(first.clone());
    hub.attach(second.clone());

    let mut manager = Manager::new();
    manager.add_seeker(DeviceSeeker::new(hub));
    manager.poll().unwrap();

    let target = manager.devices()[0].id;
    let (seen, listener) = recorder();
    manager
        .bus_mut()
        .add_listener(listener, EventFilter::PressOnly, Some(target));

    first.press(3);
    second.press(3);
    manager.poll().unwrap();
    first.release(3);
    manager.poll().unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|e| e.device == Some(target)));
    assert_eq!(seen[0].feature(), Some("y"));
    assert!(matches!(seen[1].kind, InputKind::Released { .. }));
}

#[test]
fn test_reattached_pad_is_a_new_device() {
    let hub = VirtualHub::xbox();
    let pad = VirtualPad::new("pad");
    hub.attach(pad.clone());
    let mut seeker = DeviceSeeker::new(hub.clone());
    seeker.poll().unwrap();
    let before = seeker.devices()[0].id();

    hub.detach(&pad);
    seeker.poll().unwrap();
    assert!(seeker.is_empty());

    hub.attach(pad);
    seeker.poll().unwrap();
    assert_eq!(seeker.len(), 1);
    assert_ne!(seeker.devices()[0].id(), before);
}
