use stickhal::backends::virtual_input::{VirtualHub, VirtualPad};
use stickhal::controller::ps4;
use stickhal::pressable::{Direction, Pressable};
use stickhal::seeker::{DeviceSeeker, Seek};
use stickhal::Device;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let hub = VirtualHub::ps4();
    let pad = VirtualPad::new("Virtual DualShock");
    hub.attach(pad.clone());

    let mut seeker = DeviceSeeker::new(hub.clone());
    // The first poll reports the lightbar, which GLFW cannot drive.
    if let Err(report) = seeker.poll() {
        println!("{report}");
    }

    // Cross down, left stick pushed right.
    pad.press(1);
    pad.set_axis(0, 0.9);
    seeker.poll().expect("poll");

    let p = ps4();
    let id = seeker.iter().next().map(|d| d.id()).expect("registered pad");
    let dev = seeker.get_mut(id).expect("registered pad");
    println!("cross pressed: {}", dev.state(&p.cross).unwrap().is_pressed());
    println!("ls: {:?}", dev.state(&p.ls).unwrap().position());
    println!("ls right: {}", dev.state(&p.ls).unwrap().is_pressed(Direction::Right));

    dev.state_mut(&p.rumble_strong).unwrap().set_force(0.8);
    seeker.poll().expect("poll");
    println!("motors: {:?}", pad.motors());

    for event in seeker.drain_events() {
        println!("{event}");
    }

    hub.detach(&pad);
    seeker.poll().expect("poll");
    for event in seeker.drain_events() {
        println!("{event}");
    }
    println!("{} device(s) left", seeker.len());
}
