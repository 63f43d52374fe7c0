use crate::Ssrc;

/// Transport Wide Congestion Control feedback report.
///
/// Sent in response to every RTP packet, but does ranges of packets to
/// respond to. Produced by an external RTCP parser; this crate consumes the
/// parsed form and never touches the wire representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Twcc {
    /// Sender of this feedback. Mostly irrelevant, but part of RTCP packets.
    pub sender_ssrc: Ssrc,
    /// The SSRC this report is for.
    pub ssrc: Ssrc,
    /// Start sequence number.
    pub base_seq: u16,
    /// Number of reported statuses.
    pub status_count: u16,
    /// Time the report was produced, in multiples of 64 ms from an epoch
    /// chosen by the remote side. 24 bits on the wire.
    pub reference_time: u32,
    /// Increasing counter for each TWCC. For deduping.
    pub feedback_count: u8,
    /// Ranges received.
    pub chunks: Vec<PacketChunk>,
    /// Delta times for the ranges received, shared across all chunks.
    pub deltas: Vec<Delta>,
}

/// One unit of a report's receive-status encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketChunk {
    /// A single status repeated over a run of consecutive sequence numbers.
    /// The run length is 13 bits on the wire.
    Run(PacketStatus, u16),
    /// One explicit status per sequence number offset. The wire one-bit and
    /// two-bit vector forms both expand to this.
    Vector(Vec<PacketStatus>),
}

/// Receive status of a single packet within a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketStatus {
    /// Packet not received.
    NotReceived = 0b00,
    /// Packet received, with a delta in the small (8 bit) encoding.
    ReceivedSmallDelta = 0b01,
    /// Packet received, with a delta in the large (16 bit, signed) encoding.
    ReceivedLargeOrNegativeDelta = 0b10,
    /// Reserved symbol.
    Unknown = 0b11,
}

impl PacketStatus {
    /// Whether this status reports the packet as received, in which case a
    /// receive delta accompanies it.
    pub fn received(&self) -> bool {
        !matches!(self, PacketStatus::NotReceived)
    }
}

impl From<PacketStatus> for u8 {
    fn from(val: PacketStatus) -> Self {
        val as usize as u8
    }
}

impl From<u8> for PacketStatus {
    fn from(v: u8) -> Self {
        match v {
            0b00 => Self::NotReceived,
            0b01 => Self::ReceivedSmallDelta,
            0b10 => Self::ReceivedLargeOrNegativeDelta,
            _ => Self::Unknown,
        }
    }
}

/// One receive delta. The wire resolution is 250 microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    /// 8 bit unsigned delta.
    Small(u8),
    /// 16 bit signed delta.
    Large(i16),
}

impl Delta {
    /// The delta scaled to microseconds.
    pub fn as_micros(&self) -> i64 {
        match self {
            Delta::Small(v) => 250 * *v as i64,
            Delta::Large(v) => 250 * *v as i64,
        }
    }
}
