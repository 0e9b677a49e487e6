use core::fmt;

use crate::checksum::UbxChecksum;
use crate::constants::{UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2};

/// A complete, checksum-validated UBX message: sync bytes and checksum
/// trailer stripped, class/ID/payload retained.
///
/// Frames are only ever constructed by [`FrameSync`](crate::FrameSync) once a
/// full message has been assembled and its checksum verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    class: u8,
    id: u8,
    declared_len: u16,
    payload: Vec<u8>,
}

impl Frame {
    pub(crate) fn new(class: u8, id: u8, declared_len: u16, payload: Vec<u8>) -> Self {
        debug_assert_eq!(usize::from(declared_len), payload.len());
        Self {
            class,
            id,
            declared_len,
            payload,
        }
    }

    pub fn class(&self) -> u8 {
        self.class
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Payload length as declared in the message header. Always equal to
    /// `payload().len()` on a constructed frame.
    pub fn declared_len(&self) -> u16 {
        self.declared_len
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Encode a payload as a complete wire message: sync bytes, class, ID,
/// little-endian length, payload, checksum pair.
pub fn wire_bytes(class: u8, id: u8, payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::with_capacity(8 + payload.len());
    v.push(UBX_SYNC_CHAR_1);
    v.push(UBX_SYNC_CHAR_2);
    v.push(class);
    v.push(id);
    let length = payload.len() as u16;
    v.extend_from_slice(&length.to_le_bytes());
    v.extend_from_slice(payload);

    let mut calc = UbxChecksum::new();
    calc.update(&v[2..]);
    let (ck_a, ck_b) = calc.result();
    v.push(ck_a);
    v.push(ck_b);
    v
}

/// Outcome of one framing decision against the synchronizer cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameResult {
    /// A complete, checksum-valid frame.
    Frame(Frame),
    /// Frame alignment was lost; `skipped` counts the bytes examined and
    /// rejected before rescanning.
    Desync {
        reason: DesyncReason,
        skipped: usize,
    },
    /// No decision can be made until more bytes arrive. [`FrameIter`](crate::FrameIter)
    /// translates this into the end of iteration.
    Incomplete,
}

/// Why the synchronizer rejected buffered bytes and rescanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesyncReason {
    /// The trailing checksum pair did not match the computed one. The cursor
    /// rewinds to just past the sync marker, so a genuine frame starting
    /// inside the rejected span is still found.
    ChecksumMismatch { expected: u16, computed: u16 },
    /// The header declared a payload longer than any valid message.
    OversizeLength { declared: u16 },
    /// The cursor hit its ceiling and the oldest buffered bytes were dropped.
    BufferOverflow,
}

impl fmt::Display for DesyncReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesyncReason::ChecksumMismatch { expected, computed } => write!(
                f,
                "checksum mismatch, expected {expected:#06x}, computed {computed:#06x}"
            ),
            DesyncReason::OversizeLength { declared } => {
                write!(f, "declared payload length {declared} exceeds maximum")
            },
            DesyncReason::BufferOverflow => f.write_str("cursor ceiling reached, oldest bytes dropped"),
        }
    }
}
