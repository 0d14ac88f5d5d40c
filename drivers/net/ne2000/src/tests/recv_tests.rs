use alloc::vec;

use super::sim::SimCard;
use super::{frame, running, BASE, MAC};
use crate::error::NicError;
use crate::recv::RecvStatus;

#[test]
fn test_receive_single_frame() {
    let card = SimCard::ne2000(BASE, MAC);
    let mut nic = running(&card);
    let data = frame(60, 0x30);
    card.inject_frame(&data);

    let mut buf = [0u8; 1514];
    assert_eq!(nic.receive(&mut buf), Ok(RecvStatus::Received(60)));
    assert_eq!(&buf[..60], &data[..]);
    assert_eq!(card.bnry(), 0x4D);
    assert_eq!(nic.stats().rx_packets, 1);

    assert_eq!(nic.receive(&mut buf), Err(NicError::Empty));
}

#[test]
fn test_receive_in_arrival_order() {
    let card = SimCard::ne2000(BASE, MAC);
    let mut nic = running(&card);
    let first = frame(100, 1);
    let second = frame(1500, 2);
    card.inject_frame(&first);
    card.inject_frame(&second);

    let mut buf = [0u8; 1514];
    assert_eq!(nic.receive(&mut buf), Ok(RecvStatus::Received(100)));
    assert_eq!(&buf[..100], &first[..]);
    assert_eq!(nic.receive(&mut buf), Ok(RecvStatus::Received(1500)));
    assert_eq!(&buf[..1500], &second[..]);
    assert_eq!(nic.receive(&mut buf), Err(NicError::Empty));
}

#[test]
fn test_receive_wraps_around_ring_end() {
    let card = SimCard::ne2000(BASE, MAC);
    let mut nic = running(&card);
    card.set_ring_position(0x7F);
    let data = frame(600, 0x55);
    card.inject_frame(&data);
    assert_eq!(card.curr(), 0x4E);

    let mut buf = [0u8; 1514];
    assert_eq!(nic.receive(&mut buf), Ok(RecvStatus::Received(600)));
    assert_eq!(&buf[..600], &data[..]);
    assert_eq!(card.bnry(), 0x4D);
}

#[test]
fn test_boundary_wraps_to_last_page() {
    let card = SimCard::ne2000(BASE, MAC);
    let mut nic = running(&card);
    card.set_ring_position(0x7F);
    card.inject_frame(&frame(100, 0));
    assert_eq!(card.curr(), 0x4C);

    let mut buf = [0u8; 1514];
    assert_eq!(nic.receive(&mut buf), Ok(RecvStatus::Received(100)));
    assert_eq!(card.bnry(), 0x7F);
    assert_eq!(nic.receive(&mut buf), Err(NicError::Empty));
}

#[test]
fn test_receive_short_length_is_malformed() {
    let card = SimCard::ne2000(BASE, MAC);
    let mut nic = running(&card);
    let page = card.inject_raw(0x01, 10, &[0u8; 6]);

    let mut buf = [0u8; 1514];
    assert_eq!(
        nic.receive(&mut buf),
        Err(NicError::Malformed { status: 0x01, next: page + 1, length: 6 })
    );
    assert_eq!(card.bnry(), 0x4C);
    assert_eq!(nic.stats().rx_malformed, 1);
    assert_eq!(nic.stats().rx_packets, 0);
}

#[test]
fn test_receive_oversized_length_is_malformed() {
    let card = SimCard::ne2000(BASE, MAC);
    let mut nic = running(&card);
    card.inject_raw(0x01, 1519, &vec![0u8; 1515]);

    let mut buf = [0u8; 2048];
    assert!(matches!(
        nic.receive(&mut buf),
        Err(NicError::Malformed { length: 1515, .. })
    ));
    assert_eq!(card.bnry(), 0x4C);
}

#[test]
fn test_receive_bad_status_is_malformed() {
    let card = SimCard::ne2000(BASE, MAC);
    let mut nic = running(&card);
    card.inject_raw(0x02, 64, &frame(60, 0));

    let mut buf = [0u8; 1514];
    assert!(matches!(
        nic.receive(&mut buf),
        Err(NicError::Malformed { status: 0x02, length: 60, .. })
    ));
    assert_eq!(card.bnry(), 0x4C);
}

#[test]
fn test_receive_small_buffer_keeps_frame() {
    let card = SimCard::ne2000(BASE, MAC);
    let mut nic = running(&card);
    let data = frame(60, 9);
    card.inject_frame(&data);

    let mut small = [0u8; 10];
    assert_eq!(nic.receive(&mut small), Ok(RecvStatus::NeedsBuffer(60)));
    assert_eq!(nic.receive(&mut []), Ok(RecvStatus::NeedsBuffer(60)));
    assert_eq!(card.bnry(), 0x4C);

    let mut buf = [0u8; 60];
    assert_eq!(nic.receive(&mut buf), Ok(RecvStatus::Received(60)));
    assert_eq!(&buf[..], &data[..]);
}

#[test]
fn test_receive_odd_length_on_wide_bus() {
    let card = SimCard::ne2000(BASE, MAC);
    let mut nic = running(&card);
    let data = frame(61, 0xC0);
    card.inject_frame(&data);

    let mut buf = [0u8; 61];
    assert_eq!(nic.receive(&mut buf), Ok(RecvStatus::Received(61)));
    assert_eq!(&buf[..], &data[..]);
}

#[test]
fn test_receive_on_narrow_card() {
    let card = SimCard::ne1000(BASE, MAC);
    let mut nic = running(&card);
    card.set_ring_position(0x3F);
    let data = frame(301, 0x11);
    card.inject_frame(&data);

    let mut buf = [0u8; 1514];
    assert_eq!(nic.receive(&mut buf), Ok(RecvStatus::Received(301)));
    assert_eq!(&buf[..301], &data[..]);
    assert_eq!(card.bnry(), card.curr() - 1);
}
