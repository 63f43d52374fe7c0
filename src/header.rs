use crate::{Pt, Ssrc};

/// Parsed header from an RTP packet.
///
/// Produced by an external packet parser. This crate only reads it: the
/// sending path looks up the transport-wide sequence number extension and
/// uses `header_len` for size accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpHeader {
    /// For video, this marker signifies the end of a series of packets that
    /// together form a single video frame.
    /// For audio, it marks the beginning of a talkspurt.
    pub marker: bool,
    /// Type of payload being carried. What this correlates to is sent in the SDP.
    pub payload_type: Pt,
    /// Sequence number increasing by 1 for each RTP packet.
    pub sequence_number: u16,
    /// Timestamp in media time for the RTP packet. What the media time base is depends
    /// on the codec.
    pub timestamp: u32,
    /// Sender source identifier.
    pub ssrc: Ssrc,
    /// Raw header extension payloads, keyed by the negotiated extension id.
    pub ext: Vec<(u8, Vec<u8>)>,
    /// Length of the serialized header, including extensions.
    pub header_len: usize,
}

impl RtpHeader {
    /// Raw payload of the header extension with the given id.
    pub fn extension(&self, id: u8) -> Option<&[u8]> {
        self.ext
            .iter()
            .find(|(i, _)| *i == id)
            .map(|(_, v)| v.as_slice())
    }
}
