use std::time::Duration;

use keysight_34410a::Ky34410a;
use scanio::TcpIpInstrument;

fn main() {
    // Define the interface using TcpIpInstrument. Port 5025 is the SCPI socket port.
    let interface =
        TcpIpInstrument::try_new("192.168.0.61:5025", Duration::from_secs(1)).unwrap();

    // Now we can open the Keysight 34410A with the TcpIpInstrument interface.
    let mut dmm = Ky34410a::new(interface);

    // Query and print the name of the instrument
    println!("Instrument name: {}", dmm.get_name().unwrap());

    // Set up DC voltage measurements on the 10 V range with 1 NPLC integration time.
    dmm.configure_dc_voltage(Some(10.0), Some(1.0)).unwrap();

    // Take ten readings under the configuration from above.
    for _ in 0..10 {
        println!("Reading: {} V", dmm.measure_dc_voltage().unwrap());
    }

    // One-shot measurement that does not depend on the configuration above.
    println!(
        "One-shot reading: {} V",
        dmm.measure_dc_voltage_once(Some(10.0), None).unwrap()
    );
}
