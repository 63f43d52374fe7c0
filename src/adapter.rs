use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::ext::TransportCcExtension;
use crate::history::FeedbackHistory;
use crate::twcc::{Delta, PacketChunk, PacketStatus, Twcc};
use crate::util::already_happened;
use crate::{FeedbackError, RtpHeader, SendAttributes};

/// Default number of send records kept for feedback correlation.
const DEFAULT_HISTORY: usize = 250;

/// What the sender has learned about the fate of one outgoing packet.
///
/// Reports also cover sequence numbers the history no longer (or never) knew
/// about. Those positions hold the `Default` placeholder record, so the
/// caller can keep the report's positional alignment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgment {
    /// Transport-wide sequence number of the packet.
    pub seq: u16,
    /// Bytes as sent, header and payload together. Set at send time.
    pub size: usize,
    /// When the packet was handed to the transport. Set at send time;
    /// `None` only in placeholder records.
    pub departure: Option<Instant>,
    /// When the remote side received the packet, as an offset from
    /// [`already_happened`]. `None` until a report confirms receipt, and
    /// forever for packets reported lost.
    pub arrival: Option<Instant>,
    /// Time from departure until the report confirming arrival was
    /// processed. Set together with `arrival`, and refreshed by the latest
    /// report covering the packet.
    pub rtt: Option<Duration>,
}

/// Converts TWCC feedback reports into [`Acknowledgment`]s.
///
/// The adapter keeps a bounded history of outgoing packets keyed by their
/// transport-wide sequence number. [`FeedbackAdapter::on_sent`] records
/// packets into it; [`FeedbackAdapter::on_transport_cc_feedback`] joins a
/// report against it. Both paths serialize on an internal lock, so one
/// adapter can be shared between a sending and a receiving thread.
#[derive(Debug)]
pub struct FeedbackAdapter {
    history: Mutex<FeedbackHistory>,
}

impl FeedbackAdapter {
    /// Create an adapter remembering the default 250 sent packets.
    pub fn new() -> Self {
        Self::with_history(DEFAULT_HISTORY)
    }

    /// Create an adapter remembering the last `cap` sent packets.
    ///
    /// Packets older than that are silently dropped from correlation; a
    /// report referencing them produces placeholder records.
    pub fn with_history(cap: usize) -> Self {
        FeedbackAdapter {
            history: Mutex::new(FeedbackHistory::new(cap)),
        }
    }

    /// Record that and when an outgoing packet was sent, for later mapping
    /// to acknowledgments.
    ///
    /// `now` is the send timestamp and `payload_size` the number of bytes
    /// following the header. The transport-wide sequence number is read
    /// from the header extension whose id `attrs` carries.
    pub fn on_sent(
        &self,
        now: Instant,
        header: &RtpHeader,
        payload_size: usize,
        attrs: &SendAttributes,
    ) -> Result<(), FeedbackError> {
        let id = match attrs.twcc_ext_id {
            Some(id) if id != 0 => id,
            _ => return Err(FeedbackError::MissingExtensionId),
        };

        let ext = header
            .extension(id)
            .and_then(TransportCcExtension::parse)
            .ok_or(FeedbackError::MissingExtension)?;

        trace!("Record send: {} {} bytes", ext.transport_seq, header.header_len + payload_size);

        let mut history = self.history.lock().unwrap();

        history.add(Acknowledgment {
            seq: ext.transport_seq,
            size: header.header_len + payload_size,
            departure: Some(now),
            arrival: None,
            rtt: None,
        });

        Ok(())
    }

    /// Convert one incoming TWCC report to acknowledgments.
    ///
    /// `now` is the time the report is being handled; round-trip times are
    /// measured against it. The returned acknowledgments are in the order
    /// the report declares them, one per covered sequence number.
    ///
    /// An inconsistent report aborts the whole call with
    /// [`FeedbackError::InvalidFeedback`] and produces nothing.
    pub fn on_transport_cc_feedback(
        &self,
        now: Instant,
        twcc: &Twcc,
    ) -> Result<Vec<Acknowledgment>, FeedbackError> {
        let history = self.history.lock().unwrap();

        let mut result = Vec::new();
        let mut index = twcc.base_seq;
        let mut ref_time =
            already_happened() + Duration::from_millis(twcc.reference_time as u64 * 64);
        let mut deltas = &twcc.deltas[..];

        for chunk in &twcc.chunks {
            let unpacked = match chunk {
                PacketChunk::Run(status, run_length) => {
                    unpack_run(&history, now, index, ref_time, *status, *run_length, deltas)?
                }
                PacketChunk::Vector(symbols) => {
                    unpack_vector(&history, now, index, ref_time, symbols, deltas)?
                }
            };

            deltas = &deltas[unpacked.consumed..];
            ref_time = unpacked.ref_time;
            index = index.wrapping_add(unpacked.acks.len() as u16);
            result.extend(unpacked.acks);
        }

        trace!(
            "Feedback {} unpacked to {} acknowledgments",
            twcc.feedback_count,
            result.len()
        );

        Ok(result)
    }
}

impl Default for FeedbackAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// What a chunk decoder hands back: how far the shared delta and reference
/// time cursors moved, and one acknowledgment per covered sequence number.
struct Unpacked {
    consumed: usize,
    ref_time: Instant,
    acks: Vec<Acknowledgment>,
}

fn unpack_run(
    history: &FeedbackHistory,
    now: Instant,
    start: u16,
    ref_time: Instant,
    status: PacketStatus,
    run_length: u16,
    deltas: &[Delta],
) -> Result<Unpacked, FeedbackError> {
    let mut unpacked = Unpacked {
        consumed: 0,
        ref_time,
        acks: vec![Acknowledgment::default(); run_length as usize],
    };

    for offset in 0..run_length {
        let seq = start.wrapping_add(offset);
        unpack_status(history, now, seq, status, deltas, offset as usize, &mut unpacked)?;
    }

    Ok(unpacked)
}

fn unpack_vector(
    history: &FeedbackHistory,
    now: Instant,
    start: u16,
    ref_time: Instant,
    symbols: &[PacketStatus],
    deltas: &[Delta],
) -> Result<Unpacked, FeedbackError> {
    let mut unpacked = Unpacked {
        consumed: 0,
        ref_time,
        acks: vec![Acknowledgment::default(); symbols.len()],
    };

    for (offset, status) in symbols.iter().enumerate() {
        let seq = start.wrapping_add(offset as u16);
        unpack_status(history, now, seq, *status, deltas, offset, &mut unpacked)?;
    }

    Ok(unpacked)
}

/// Per-index logic shared by the two chunk encodings.
///
/// A sequence number missing from the history leaves the placeholder in its
/// slot and consumes nothing, so the report's positions stay intact.
fn unpack_status(
    history: &FeedbackHistory,
    now: Instant,
    seq: u16,
    status: PacketStatus,
    deltas: &[Delta],
    slot: usize,
    unpacked: &mut Unpacked,
) -> Result<(), FeedbackError> {
    let Some(found) = history.get(seq) else {
        return Ok(());
    };
    let mut ack = *found;

    if status.received() {
        let Some(delta) = deltas.get(unpacked.consumed) else {
            return Err(FeedbackError::InvalidFeedback);
        };
        unpacked.consumed += 1;
        unpacked.ref_time = advance(unpacked.ref_time, delta.as_micros());

        if let Some(departure) = ack.departure {
            ack.arrival = Some(unpacked.ref_time);
            // Against the handling time, not the remote arrival: how long
            // until we found out.
            ack.rtt = Some(now.saturating_duration_since(departure));
        }
    }

    unpacked.acks[slot] = ack;

    Ok(())
}

fn advance(ref_time: Instant, micros: i64) -> Instant {
    if micros < 0 {
        let dur = Duration::from_micros(micros.unsigned_abs());
        // A report can walk the reference time below what Instant can
        // represent. Saturate at the epoch.
        ref_time.checked_sub(dur).unwrap_or_else(already_happened)
    } else {
        ref_time + Duration::from_micros(micros as u64)
    }
}
