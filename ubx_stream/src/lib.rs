//! # ubx_stream
//!
//! Streaming frame synchronizer and navigation report decoder for the UBX
//! binary protocol spoken by u-blox GNSS receivers.
//!
//! Transports deliver bytes in fixed-size reads that do not line up with
//! message boundaries. [`FrameSync`] keeps a bounded rolling cursor, locates
//! the `0xB5 0x62` sync marker, and yields each complete, checksum-valid
//! [`Frame`]; after corrupt or truncated input it resynchronizes without
//! losing the valid messages that follow. [`decode`] turns a frame into a
//! typed [`Report`] via a per-kind dispatch table.
//!
//! Feeding bytes and handling the outcomes:
//! ```
//! use ubx_stream::{decode, wire_bytes, FrameResult, FrameSync, Report};
//!
//! // A NAV-POSECEF message: iTOW (ms), X, Y, Z (cm), accuracy (cm).
//! let mut payload = Vec::new();
//! for value in [5000i32, 123_456, -654_300, 4_200, 100] {
//!     payload.extend_from_slice(&value.to_le_bytes());
//! }
//! let bytes = wire_bytes(0x01, 0x01, &payload);
//!
//! let mut sync = FrameSync::new();
//! for result in sync.feed(&bytes) {
//!     match result {
//!         FrameResult::Frame(frame) => match decode(&frame) {
//!             Ok(Report::PositionEcef(pos)) => assert_eq!(pos.x_m, 1234.56),
//!             Ok(report) => println!("{report:?}"),
//!             Err(err) => println!("skipping frame: {err}"),
//!         },
//!         FrameResult::Desync { reason, skipped } => {
//!             eprintln!("lost sync ({reason}), {skipped} bytes skipped");
//!         }
//!         FrameResult::Incomplete => {}
//!     }
//! }
//! ```
//!
//! For a blocking transport, [`StreamPipeline::run`] owns the read loop:
//! it feeds the synchronizer, decodes, delivers reports to a
//! [`ReportSink`] in arrival order, and keeps desync/decode counters in
//! [`StreamStats`]. Each connection owns its own pipeline; nothing is
//! shared between streams.

pub use crate::{
    constants::{DEFAULT_CURSOR_CEILING, MAX_PAYLOAD_LEN, UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2},
    error::{DecodeError, StreamError},
    frame::{wire_bytes, DesyncReason, Frame, FrameResult},
    messages::{decode, PositionEcef, PositionGeodetic, Report},
    stream::{ReportSink, StreamPipeline, StreamStats, Transport},
    sync::{FrameIter, FrameSync},
};

mod checksum;
mod constants;
mod error;
mod frame;
mod messages;
mod stream;
mod sync;
