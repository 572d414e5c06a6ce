//! Tests for the relay box driver.

use rstest::*;

use relaybox::RelayBox;
use scanio::{InstrumentError, LoopbackInterface};

/// Create a new loopback instrument from the given input string slices.
fn crt_inst(host2inst: Vec<&str>, inst2host: Vec<&str>) -> RelayBox<LoopbackInterface> {
    let term = "\n";
    let h2i: Vec<String> = host2inst.iter().map(|s| s.to_string()).collect();
    let i2h: Vec<String> = inst2host.iter().map(|s| s.to_string()).collect();
    let interface = LoopbackInterface::new(h2i, i2h, term);
    RelayBox::new(interface)
}

#[rstest]
pub fn test_all_off() {
    let mut inst = crt_inst(vec!["ALLOFF"], vec![]);

    inst.all_off().unwrap();
}

#[rstest]
fn test_get_all_states() {
    let mut inst = crt_inst(vec!["ALLREL?"], vec!["1,0,1,0"]);

    assert_eq!(inst.get_all_states().unwrap(), vec![true, false, true, false]);
}

#[rstest]
fn test_get_name() {
    let mut inst = crt_inst(vec!["*IDN?"], vec!["RelayBox,4ch,SN1042,0.3.1"]);

    assert_eq!(inst.get_name().unwrap(), "RelayBox,4ch,SN1042,0.3.1");
}

#[rstest]
fn test_verify_serial() {
    let mut inst = crt_inst(vec!["*IDN?"], vec!["RelayBox,4ch,SN1042,0.3.1"]);

    inst.verify_serial("SN1042").unwrap();
}

#[rstest]
fn test_verify_serial_mismatch() {
    let mut inst = crt_inst(vec!["*IDN?"], vec!["RelayBox,4ch,SN9999,0.3.1"]);

    match inst.verify_serial("SN1042") {
        Err(InstrumentError::InstrumentStatus(msg)) => {
            assert!(msg.contains("SN9999"));
            assert!(msg.contains("SN1042"));
        }
        _ => panic!("Expected InstrumentStatus error"),
    }
}

#[rstest]
fn test_get_channel() {
    let mut inst = crt_inst(vec![], vec![]);

    // Get a channel and check that it is created correctly
    assert!(inst.get_channel(0).is_ok());

    // Try to get a channel that is out of range
    match inst.get_channel(4) {
        Err(InstrumentError::ChannelIndexOutOfRange { idx, nof_channels }) => {
            assert_eq!(idx, 4);
            assert_eq!(nof_channels, 4);
        }
        _ => panic!("Expected ChannelIndexOutOfRange error"),
    }

    // Now set the box up so it has 8 channels
    inst.set_num_channels(8);
    assert!(inst.get_channel(7).is_ok());
    assert!(inst.get_channel(8).is_err());
}

#[rstest]
fn test_channel_state() {
    let mut inst = crt_inst(
        vec!["REL0 1", "REL0?", "REL1 0", "REL1?"],
        vec!["1", "0"],
    );

    let mut ch0 = inst.get_channel(0).unwrap();
    ch0.set_state(true).unwrap();
    assert!(ch0.get_state().unwrap());

    let mut ch1 = inst.get_channel(1).unwrap();
    ch1.set_state(false).unwrap();
    assert!(!ch1.get_state().unwrap());
}

#[rstest]
fn test_channel_clone_shares_interface() {
    let mut inst = crt_inst(vec!["REL2 1", "REL2?"], vec!["1"]);

    let mut ch2 = inst.get_channel(2).unwrap();
    let mut ch2_clone = ch2.clone();

    ch2.set_state(true).unwrap();
    assert!(ch2_clone.get_state().unwrap());
}
