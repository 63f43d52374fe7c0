//! Transport-wide congestion control feedback handling in Sans-IO style.
//!
//! This crate correlates outgoing RTP packets with the TWCC feedback reports
//! the receiving side sends back, and turns each report into a flat sequence
//! of per-packet [`Acknowledgment`]s. A congestion controller or bandwidth
//! estimator can consume those without knowing anything about the feedback
//! wire format.
//!
//! Like the rest of a Sans-IO stack there are no sockets, no clocks and no
//! internal threads here. Wire parsing happens elsewhere: packets arrive as
//! an already parsed [`RtpHeader`] and feedback as an already parsed [`Twcc`]
//! report. Every operation takes its timestamp from the caller.
//!
//! The flow is:
//!
//! 1. For every packet handed to the transport, call
//!    [`FeedbackAdapter::on_sent`]. The transport-wide sequence number is
//!    read from the header extension negotiated via [`SendAttributes`] and
//!    the packet is remembered in a bounded history.
//! 2. For every TWCC report received, call
//!    [`FeedbackAdapter::on_transport_cc_feedback`]. The report is joined
//!    against the history to produce acknowledgments carrying departure
//!    time, reconstructed arrival time and round-trip time.
//!
//! ```
//! use std::time::{Duration, Instant};
//! use twcc_adapter::{FeedbackAdapter, RtpHeader, SendAttributes};
//! use twcc_adapter::{Delta, PacketChunk, PacketStatus, Twcc};
//!
//! let adapter = FeedbackAdapter::new();
//! let attrs = SendAttributes { twcc_ext_id: Some(3) };
//!
//! // The sending path records each outgoing packet.
//! let header = RtpHeader {
//!     marker: false,
//!     payload_type: 111.into(),
//!     sequence_number: 100,
//!     timestamp: 960,
//!     ssrc: 0x1234_5678.into(),
//!     ext: vec![(3, vec![0x00, 0x2a])], // transport-wide seq 42
//!     header_len: 20,
//! };
//! let sent_at = Instant::now();
//! adapter.on_sent(sent_at, &header, 1180, &attrs).unwrap();
//!
//! // Later, a feedback report covering that packet arrives.
//! let twcc = Twcc {
//!     sender_ssrc: 0.into(),
//!     ssrc: 0x1234_5678.into(),
//!     base_seq: 42,
//!     status_count: 1,
//!     reference_time: 0,
//!     feedback_count: 0,
//!     chunks: vec![PacketChunk::Run(PacketStatus::ReceivedSmallDelta, 1)],
//!     deltas: vec![Delta::Small(4)],
//! };
//!
//! let acks = adapter
//!     .on_transport_cc_feedback(sent_at + Duration::from_millis(80), &twcc)
//!     .unwrap();
//!
//! assert_eq!(acks.len(), 1);
//! assert_eq!(acks[0].size, 1200);
//! assert_eq!(acks[0].rtt, Some(Duration::from_millis(80)));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

use thiserror::Error;

mod adapter;
pub use adapter::{Acknowledgment, FeedbackAdapter};

mod ext;
pub use ext::{SendAttributes, TransportCcExtension};

mod header;
pub use header::RtpHeader;

mod history;

mod id;
pub use id::{Pt, Ssrc};

mod twcc;
pub use twcc::{Delta, PacketChunk, PacketStatus, Twcc};

mod util;
pub use util::already_happened;

/// Errors that can arise when recording sends or applying feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FeedbackError {
    /// The id of the transport-wide sequence number extension has not been
    /// negotiated (absent from the attributes, or the zero sentinel).
    #[error("missing transport cc header extension id")]
    MissingExtensionId,

    /// The header carries no decodable transport-wide sequence number
    /// extension at the negotiated id.
    #[error("missing transport cc header extension")]
    MissingExtension,

    /// A feedback report is inconsistent with itself: a chunk claims more
    /// received packets than there are receive deltas. Such a report cannot
    /// be trusted to delimit chunk boundaries and is discarded whole.
    #[error("invalid feedback")]
    InvalidFeedback,
}
