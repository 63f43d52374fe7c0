use std::sync::{Arc, Once};
use std::thread;
use std::time::{Duration, Instant};

use twcc_adapter::{already_happened, Delta, FeedbackAdapter, PacketChunk, PacketStatus};
use twcc_adapter::{RtpHeader, SendAttributes, TransportCcExtension, Twcc};

pub fn init_log() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    static START: Once = Once::new();

    START.call_once(|| {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(env_filter)
            .init();
    });
}

const EXT_ID: u8 = 3;

fn attrs() -> SendAttributes {
    SendAttributes {
        twcc_ext_id: Some(EXT_ID),
    }
}

fn header(transport_seq: u16) -> RtpHeader {
    let mut buf = [0_u8; 2];
    TransportCcExtension { transport_seq }.write_to(&mut buf);

    RtpHeader {
        marker: false,
        payload_type: 111.into(),
        sequence_number: transport_seq,
        timestamp: 0,
        ssrc: 0x1234_5678.into(),
        ext: vec![(EXT_ID, buf.to_vec())],
        header_len: 20,
    }
}

#[test]
fn send_then_feedback() {
    init_log();

    let adapter = FeedbackAdapter::new();
    let t0 = Instant::now();

    // Five packets, one millisecond apart.
    for i in 0..5_u16 {
        let sent_at = t0 + Duration::from_millis(i as u64);
        adapter
            .on_sent(sent_at, &header(100 + i), 1000, &attrs())
            .unwrap();
    }

    // One report covering all five: 100 and 101 as a run, 102..105 as an
    // explicit vector with 102 lost.
    use PacketStatus::*;
    let twcc = Twcc {
        sender_ssrc: 0.into(),
        ssrc: 0x1234_5678.into(),
        base_seq: 100,
        status_count: 5,
        reference_time: 1,
        feedback_count: 0,
        chunks: vec![
            PacketChunk::Run(ReceivedSmallDelta, 2),
            PacketChunk::Vector(vec![
                NotReceived,
                ReceivedSmallDelta,
                ReceivedLargeOrNegativeDelta,
            ]),
        ],
        deltas: vec![
            Delta::Small(4),  //  1000 us
            Delta::Small(8),  // +2000 us
            Delta::Small(4),  // +1000 us
            Delta::Large(-4), // -1000 us
        ],
    };

    let handled = t0 + Duration::from_millis(100);
    let acks = adapter.on_transport_cc_feedback(handled, &twcc).unwrap();

    assert_eq!(acks.len(), 5);
    assert_eq!(
        acks.iter().map(|a| a.seq).collect::<Vec<_>>(),
        vec![100, 101, 102, 103, 104]
    );

    // Arrivals accumulate from the 64 ms reference time, the lost packet
    // gets none.
    let base = already_happened() + Duration::from_millis(64);
    let arrivals: Vec<_> = acks.iter().map(|a| a.arrival).collect();
    assert_eq!(
        arrivals,
        vec![
            Some(base + Duration::from_micros(1000)),
            Some(base + Duration::from_micros(3000)),
            None,
            Some(base + Duration::from_micros(4000)),
            Some(base + Duration::from_micros(3000)),
        ]
    );

    // Sizes as sent, rtt against the handling time.
    assert!(acks.iter().all(|a| a.size == 1020));
    assert_eq!(acks[0].rtt, Some(Duration::from_millis(100)));
    assert_eq!(acks[3].rtt, Some(Duration::from_millis(97)));
    assert_eq!(acks[2].rtt, None);
}

#[test]
fn shared_between_send_and_feedback_threads() {
    init_log();

    let adapter = Arc::new(FeedbackAdapter::new());
    let t0 = Instant::now();

    let sender = {
        let adapter = adapter.clone();
        thread::spawn(move || {
            for seq in 0..500_u16 {
                adapter.on_sent(t0, &header(seq), 1000, &attrs()).unwrap();
            }
        })
    };

    let feedback = {
        let adapter = adapter.clone();
        thread::spawn(move || {
            for i in 0..50_u16 {
                let twcc = Twcc {
                    sender_ssrc: 0.into(),
                    ssrc: 0x1234_5678.into(),
                    base_seq: i * 10,
                    status_count: 10,
                    reference_time: 0,
                    feedback_count: i as u8,
                    chunks: vec![PacketChunk::Run(PacketStatus::ReceivedSmallDelta, 10)],
                    deltas: vec![Delta::Small(1); 10],
                };

                // Not-yet-sent packets come back as placeholders; either way
                // every report covers its full range.
                let acks = adapter.on_transport_cc_feedback(t0, &twcc).unwrap();
                assert_eq!(acks.len(), 10);
            }
        })
    };

    sender.join().unwrap();
    feedback.join().unwrap();

    // With all sends in, a report over the newest packets correlates fully.
    let twcc = Twcc {
        sender_ssrc: 0.into(),
        ssrc: 0x1234_5678.into(),
        base_seq: 490,
        status_count: 10,
        reference_time: 0,
        feedback_count: 50,
        chunks: vec![PacketChunk::Run(PacketStatus::ReceivedSmallDelta, 10)],
        deltas: vec![Delta::Small(1); 10],
    };
    let acks = adapter.on_transport_cc_feedback(t0, &twcc).unwrap();

    assert!(acks.iter().all(|a| a.arrival.is_some()));
}
