use std::{thread, time::Duration};

use relaybox::RelayBox;
use scanio::SerialInstrument;

const PORT: &str = "/dev/ttyACM0";
const BAUD_RATE: u32 = 9600;

fn main() {
    let interface = SerialInstrument::simple(PORT, BAUD_RATE).unwrap();
    let mut relay_box = RelayBox::new(interface);

    println!("Instrument name: {}", relay_box.get_name().unwrap());

    // Toggle every relay once, with a short pause so you can hear them click.
    for idx in 0..4 {
        let mut ch = relay_box.get_channel(idx).unwrap();
        ch.set_state(true).unwrap();
        thread::sleep(Duration::from_millis(500));
        ch.set_state(false).unwrap();
    }

    println!("All states: {:?}", relay_box.get_all_states().unwrap());

    relay_box.all_off().unwrap();
    println!("All off now and done.");
}
