/// Side-channel attributes following a packet through the send path.
///
/// Values negotiated out of band (typically in the SDP) travel here so the
/// send path does not have to reparse them for every packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendAttributes {
    /// Negotiated id of the transport-wide sequence number extension.
    ///
    /// `None`, as well as an explicit 0, means the extension has not been
    /// negotiated and outgoing packets cannot be correlated with feedback.
    pub twcc_ext_id: Option<u8>,
}

/// Payload of the transport-wide sequence number header extension.
///
/// <http://www.ietf.org/id/draft-holmer-rmcat-transport-wide-cc-extensions-01>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportCcExtension {
    /// Transport-wide sequence number of the packet.
    pub transport_seq: u16,
}

impl TransportCcExtension {
    /// Parse from a raw extension payload.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < 2 {
            return None;
        }

        Some(TransportCcExtension {
            transport_seq: u16::from_be_bytes([buf[0], buf[1]]),
        })
    }

    /// Write the payload to a buffer. Returns the number of bytes written.
    pub fn write_to(&self, buf: &mut [u8]) -> usize {
        buf[..2].copy_from_slice(&self.transport_seq.to_be_bytes());
        2
    }
}
