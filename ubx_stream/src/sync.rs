use crate::checksum::UbxChecksum;
use crate::constants::{
    DEFAULT_CURSOR_CEILING, MAX_PAYLOAD_LEN, UBX_CHECKSUM_LEN, UBX_CLASS_OFFSET, UBX_HEADER_LEN,
    UBX_LENGTH_OFFSET, UBX_MSG_ID_OFFSET, UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2, UBX_SYNC_LEN,
};
use crate::frame::{DesyncReason, Frame, FrameResult};

/// Streaming frame synchronizer. Bytes arrive in arbitrarily-chunked reads
/// through [`feed`](FrameSync::feed); the synchronizer keeps the unconsumed
/// tail across calls and yields each complete, checksum-valid [`Frame`] in
/// arrival order.
///
/// The internal cursor is bounded: if it ever exceeds the configured ceiling
/// the oldest bytes are dropped and a
/// [`DesyncReason::BufferOverflow`] desync is reported, so sustained garbage
/// input cannot grow memory without limit.
pub struct FrameSync {
    cursor: Vec<u8>,
    ceiling: usize,
    overflow_dropped: Option<usize>,
}

impl Default for FrameSync {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSync {
    pub fn new() -> Self {
        Self::with_ceiling(DEFAULT_CURSOR_CEILING)
    }

    /// A synchronizer with a custom cursor ceiling. The ceiling should be at
    /// least the largest complete wire message expected, or in-flight
    /// messages may be dropped before they can complete.
    pub fn with_ceiling(ceiling: usize) -> Self {
        Self {
            cursor: Vec::new(),
            ceiling,
            overflow_dropped: None,
        }
    }

    /// Append a chunk and iterate the framing decisions it enables. One call
    /// may yield any number of frames and desyncs; iteration ends when the
    /// remaining buffered bytes cannot complete another decision.
    pub fn feed<'a>(&'a mut self, chunk: &[u8]) -> FrameIter<'a> {
        self.cursor.extend_from_slice(chunk);
        if self.cursor.len() > self.ceiling {
            let dropped = self.cursor.len() - self.ceiling;
            self.cursor.drain(..dropped);
            self.overflow_dropped = Some(dropped);
        }
        FrameIter { sync: self }
    }

    /// Number of bytes currently retained in the cursor.
    pub fn buffered(&self) -> usize {
        self.cursor.len()
    }

    /// One framing decision against the current cursor.
    fn advance(&mut self) -> FrameResult {
        if let Some(dropped) = self.overflow_dropped.take() {
            return FrameResult::Desync {
                reason: DesyncReason::BufferOverflow,
                skipped: dropped,
            };
        }

        loop {
            let pos = match self.cursor.iter().position(|&b| b == UBX_SYNC_CHAR_1) {
                Some(pos) => pos,
                None => {
                    // No trace of a sync marker; nothing is worth keeping.
                    self.cursor.clear();
                    return FrameResult::Incomplete;
                },
            };
            self.cursor.drain(..pos);

            if self.cursor.len() < UBX_SYNC_LEN {
                // Trailing first sync byte; the second may arrive next chunk.
                return FrameResult::Incomplete;
            }
            if self.cursor[1] != UBX_SYNC_CHAR_2 {
                self.cursor.drain(..1);
                continue;
            }

            if self.cursor.len() < UBX_HEADER_LEN {
                return FrameResult::Incomplete;
            }

            let declared_len = u16::from_le_bytes([
                self.cursor[UBX_LENGTH_OFFSET],
                self.cursor[UBX_LENGTH_OFFSET + 1],
            ]);
            if declared_len > MAX_PAYLOAD_LEN {
                // Garbage that happened to look like a header; never wait
                // for a payload no valid message can declare.
                self.cursor.drain(..UBX_SYNC_LEN);
                return FrameResult::Desync {
                    reason: DesyncReason::OversizeLength {
                        declared: declared_len,
                    },
                    skipped: UBX_SYNC_LEN,
                };
            }

            let wire_len = UBX_HEADER_LEN + usize::from(declared_len) + UBX_CHECKSUM_LEN;
            if self.cursor.len() < wire_len {
                return FrameResult::Incomplete;
            }

            let mut calc = UbxChecksum::new();
            calc.update(&self.cursor[UBX_CLASS_OFFSET..UBX_HEADER_LEN + usize::from(declared_len)]);
            let received_ck_a = self.cursor[wire_len - 2];
            let received_ck_b = self.cursor[wire_len - 1];
            if !calc.matches(received_ck_a, received_ck_b) {
                let (ck_a, ck_b) = calc.result();
                // The declared length cannot be trusted on a bad checksum:
                // rewind just past the marker so a genuine frame starting
                // inside the rejected span is not skipped over.
                self.cursor.drain(..UBX_SYNC_LEN);
                return FrameResult::Desync {
                    reason: DesyncReason::ChecksumMismatch {
                        expected: u16::from_le_bytes([received_ck_a, received_ck_b]),
                        computed: u16::from_le_bytes([ck_a, ck_b]),
                    },
                    skipped: wire_len - UBX_SYNC_LEN,
                };
            }

            let frame = Frame::new(
                self.cursor[UBX_CLASS_OFFSET],
                self.cursor[UBX_MSG_ID_OFFSET],
                declared_len,
                self.cursor[UBX_HEADER_LEN..UBX_HEADER_LEN + usize::from(declared_len)].to_vec(),
            );
            self.cursor.drain(..wire_len);
            return FrameResult::Frame(frame);
        }
    }
}

/// Iterator over the framing decisions enabled by one [`FrameSync::feed`]
/// call. [`FrameResult::Incomplete`] is mapped to the end of iteration;
/// subsequent `feed` calls continue from the retained cursor.
pub struct FrameIter<'a> {
    sync: &'a mut FrameSync,
}

impl Iterator for FrameIter<'_> {
    type Item = FrameResult;

    fn next(&mut self) -> Option<FrameResult> {
        match self.sync.advance() {
            FrameResult::Incomplete => None,
            result => Some(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::wire_bytes;
    use proptest::prelude::*;

    fn nav_payload(fields: &[i32]) -> Vec<u8> {
        let mut payload = Vec::with_capacity(fields.len() * 4);
        for value in fields {
            payload.extend_from_slice(&value.to_le_bytes());
        }
        payload
    }

    /// A NAV-POSLLH message with distinctive field values.
    fn posllh_message(itow_ms: i32) -> Vec<u8> {
        wire_bytes(
            0x01,
            0x02,
            &nav_payload(&[itow_ms, 1_038_001_290, 13_404_167, 12_000, 11_000, 4_000, 6_000]),
        )
    }

    fn collect(sync: &mut FrameSync, chunk: &[u8]) -> Vec<FrameResult> {
        sync.feed(chunk).collect()
    }

    fn frames_of(results: &[FrameResult]) -> Vec<Frame> {
        results
            .iter()
            .filter_map(|r| match r {
                FrameResult::Frame(frame) => Some(frame.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn whole_message_in_one_chunk() {
        let msg = posllh_message(1000);
        let mut sync = FrameSync::new();
        let results = collect(&mut sync, &msg);
        assert_eq!(results.len(), 1);
        match &results[0] {
            FrameResult::Frame(frame) => {
                assert_eq!(frame.class(), 0x01);
                assert_eq!(frame.id(), 0x02);
                assert_eq!(frame.declared_len(), 28);
                assert_eq!(frame.payload(), &msg[6..msg.len() - 2]);
            },
            other => panic!("expected frame, got {other:?}"),
        }
        assert_eq!(sync.buffered(), 0);
    }

    #[test]
    fn split_at_every_boundary_yields_identical_frame() {
        let msg = posllh_message(1000);
        let mut unsplit = FrameSync::new();
        let reference = frames_of(&collect(&mut unsplit, &msg));
        assert_eq!(reference.len(), 1);

        for split in 0..=msg.len() {
            let mut sync = FrameSync::new();
            let mut results = collect(&mut sync, &msg[..split]);
            results.extend(collect(&mut sync, &msg[split..]));
            let frames = frames_of(&results);
            assert_eq!(frames, reference, "split at {split}");
        }
    }

    #[test]
    fn two_messages_in_one_chunk_come_out_in_order() {
        let mut chunk = posllh_message(1000);
        chunk.extend_from_slice(&posllh_message(2000));
        let mut sync = FrameSync::new();
        let frames = frames_of(&collect(&mut sync, &chunk));
        assert_eq!(frames.len(), 2);
        assert_eq!(&frames[0].payload()[..4], &1000i32.to_le_bytes());
        assert_eq!(&frames[1].payload()[..4], &2000i32.to_le_bytes());
    }

    #[test]
    fn garbage_before_marker_is_discarded() {
        let mut chunk = vec![0x00, 0x17, 0xb5, 0x42]; // stray first sync byte
        chunk.extend_from_slice(&posllh_message(1000));
        let mut sync = FrameSync::new();
        let frames = frames_of(&collect(&mut sync, &chunk));
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn trailing_first_sync_byte_is_retained() {
        let mut sync = FrameSync::new();
        assert!(collect(&mut sync, &[0x20, 0x21, UBX_SYNC_CHAR_1]).is_empty());
        assert_eq!(sync.buffered(), 1);

        let msg = posllh_message(1000);
        // Continue with the rest of the message, minus the byte already fed.
        let frames = frames_of(&collect(&mut sync, &msg[1..]));
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn pure_noise_retains_nothing() {
        let noise: Vec<u8> = (0u16..600).map(|i| (i % 0xb0) as u8).collect();
        let mut sync = FrameSync::new();
        for _ in 0..50 {
            assert!(collect(&mut sync, &noise).is_empty());
            assert_eq!(sync.buffered(), 0);
        }
    }

    #[test]
    fn corrupting_any_header_or_payload_byte_recovers() {
        let msg = posllh_message(1000);
        // Enough valid traffic after the corrupted message to outgrow any
        // length the corruption may have declared.
        let tail: Vec<Vec<u8>> = (1..8).map(|n| posllh_message(n * 1000)).collect();

        for corrupt_at in 2..msg.len() {
            let mut stream = msg.clone();
            stream[corrupt_at] ^= 0xff;
            for m in &tail {
                stream.extend_from_slice(m);
            }

            let mut sync = FrameSync::new();
            let results = collect(&mut sync, &stream);
            let desyncs = results
                .iter()
                .filter(|r| matches!(r, FrameResult::Desync { .. }))
                .count();
            let frames = frames_of(&results);

            assert!(desyncs >= 1, "corruption at {corrupt_at} went unnoticed");
            assert_eq!(frames.len(), tail.len(), "corruption at {corrupt_at}");
            for (frame, original) in frames.iter().zip(&tail) {
                assert_eq!(frame.payload(), &original[6..original.len() - 2]);
            }
        }
    }

    #[test]
    fn checksum_desync_reports_full_rejected_span() {
        let mut msg = posllh_message(1000);
        let last = msg.len() - 1;
        msg[last] ^= 0xff;
        let mut sync = FrameSync::new();
        let results = collect(&mut sync, &msg);
        assert!(matches!(
            results[0],
            FrameResult::Desync {
                reason: DesyncReason::ChecksumMismatch { .. },
                // header minus sync, payload, checksum
                skipped: 34,
            }
        ));
    }

    #[test]
    fn marker_inside_rejected_span_is_not_skipped() {
        // A bogus outer header claims the inner (genuine) message as its
        // payload; the two-byte rewind after the checksum failure must still
        // find the inner frame.
        let inner = posllh_message(1000);
        let mut outer = vec![UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2, 0x01, 0x02];
        outer.extend_from_slice(&(inner.len() as u16).to_le_bytes());
        outer.extend_from_slice(&inner);

        let mut calc = UbxChecksum::new();
        calc.update(&outer[2..]);
        let (ck_a, ck_b) = calc.result();
        outer.push(ck_a.wrapping_add(1)); // deliberately wrong
        outer.push(ck_b);

        let mut sync = FrameSync::new();
        let results = collect(&mut sync, &outer);
        assert!(matches!(
            results[0],
            FrameResult::Desync {
                reason: DesyncReason::ChecksumMismatch { .. },
                ..
            }
        ));
        let frames = frames_of(&results);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), &inner[6..inner.len() - 2]);
    }

    #[test]
    fn oversize_declared_length_resyncs_immediately() {
        let mut chunk = vec![UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2, 0x01, 0x02, 0xff, 0xff];
        chunk.extend_from_slice(&posllh_message(1000));
        let mut sync = FrameSync::new();
        let results = collect(&mut sync, &chunk);
        assert!(matches!(
            results[0],
            FrameResult::Desync {
                reason: DesyncReason::OversizeLength { declared: 0xffff },
                skipped: 2,
            }
        ));
        assert_eq!(frames_of(&results).len(), 1);
    }

    #[test]
    fn cursor_ceiling_drops_oldest_bytes() {
        let mut sync = FrameSync::with_ceiling(64);
        // A plausible header that keeps the synchronizer waiting for a
        // kilobyte of payload that never arrives.
        let mut header = vec![UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2, 0x01, 0x02];
        header.extend_from_slice(&1000u16.to_le_bytes());
        assert!(collect(&mut sync, &header).is_empty());

        let results = collect(&mut sync, &[0xaa; 300]);
        assert!(matches!(
            results[0],
            FrameResult::Desync {
                reason: DesyncReason::BufferOverflow,
                skipped: 242,
            }
        ));
        assert!(sync.buffered() <= 64);

        // The stream is still usable afterwards.
        let frames = frames_of(&collect(&mut sync, &posllh_message(1000)));
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn state_is_per_instance() {
        let msg = posllh_message(1000);
        let mut a = FrameSync::new();
        let mut b = FrameSync::new();
        assert!(collect(&mut a, &msg[..10]).is_empty());
        assert!(frames_of(&collect(&mut b, &msg)).len() == 1);
        assert_eq!(a.buffered(), 10);
    }

    proptest! {
        #[test]
        fn arbitrary_chunking_is_equivalent_to_one_feed(
            itows in proptest::collection::vec(1i32..1_000_000, 1..4),
            chunk_len in 1usize..50,
        ) {
            let mut stream = Vec::new();
            for itow in &itows {
                stream.extend_from_slice(&posllh_message(*itow));
            }

            let mut whole = FrameSync::new();
            let reference = frames_of(&collect(&mut whole, &stream));

            let mut sync = FrameSync::new();
            let mut results = Vec::new();
            for chunk in stream.chunks(chunk_len) {
                results.extend(collect(&mut sync, chunk));
            }
            prop_assert_eq!(frames_of(&results), reference);
        }

        #[test]
        fn arbitrary_noise_never_panics_or_grows(
            chunks in proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 0..600),
                1..20,
            ),
        ) {
            let mut sync = FrameSync::with_ceiling(2048);
            for chunk in &chunks {
                let _ = collect(&mut sync, chunk);
                prop_assert!(sync.buffered() <= 2048);
            }
        }
    }
}
