use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};

use crate::error::{DecodeError, StreamError};
use crate::frame::{DesyncReason, FrameResult};
use crate::messages::{decode, Report};
use crate::sync::FrameSync;

/// Size of the scratch buffer handed to the transport per read.
const READ_BUF_LEN: usize = 1024;

/// Blocking byte source with a bounded timeout per read.
///
/// `Ok(0)` means the timeout elapsed with no data: a transient condition,
/// not end-of-stream. Transport adapters are expected to map their native
/// timeout errors accordingly.
pub trait Transport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;
}

/// Consumer of decoded reports. Delivery is synchronous and in emission
/// order; the pipeline makes no assumption about what the sink does with
/// each report.
pub trait ReportSink {
    fn handle(&mut self, report: Report);
}

/// Any closure can act as a sink.
impl<F: FnMut(Report)> ReportSink for F {
    fn handle(&mut self, report: Report) {
        self(report)
    }
}

/// Counters kept by a pipeline, queryable at any point between runs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    /// Frames that decoded into a report delivered to the sink.
    pub frames: u64,
    pub checksum_mismatches: u64,
    pub oversize_lengths: u64,
    pub buffer_overflows: u64,
    pub unsupported_messages: u64,
    /// Reads that returned no data before their timeout.
    pub timeouts: u64,
}

/// One transport's worth of state: frame synchronizer, counters, shutdown
/// flag. Pipelines are never shared between connections; create one per
/// stream.
pub struct StreamPipeline {
    sync: FrameSync,
    stats: StreamStats,
    shutdown: Arc<AtomicBool>,
}

impl Default for StreamPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamPipeline {
    pub fn new() -> Self {
        Self::with_sync(FrameSync::new())
    }

    /// A pipeline over a custom-configured synchronizer.
    pub fn with_sync(sync: FrameSync) -> Self {
        Self {
            sync,
            stats: StreamStats::default(),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops [`run`](StreamPipeline::run) before its next read.
    /// Clone it into a signal handler or another thread.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Drive transport → synchronizer → decoder → sink until the transport
    /// fails or the shutdown flag is set. Timeouts with no data are counted
    /// and the loop continues; every report decoded before an interruption
    /// has already reached the sink.
    pub fn run<T, S>(&mut self, transport: &mut T, sink: &mut S) -> Result<(), StreamError>
    where
        T: Transport,
        S: ReportSink,
    {
        let mut buf = [0u8; READ_BUF_LEN];
        while !self.shutdown.load(Ordering::Relaxed) {
            let nbytes = transport.read(&mut buf)?;
            if nbytes == 0 {
                self.stats.timeouts += 1;
                debug!("read returned no data before timeout");
                continue;
            }
            self.consume(&buf[..nbytes], sink);
        }
        Ok(())
    }

    /// Feed one chunk through the synchronizer and decoder, delivering
    /// reports to the sink. Exposed for callers that own their read loop.
    pub fn consume<S: ReportSink>(&mut self, chunk: &[u8], sink: &mut S) {
        for result in self.sync.feed(chunk) {
            match result {
                FrameResult::Frame(frame) => match decode(&frame) {
                    Ok(report) => {
                        self.stats.frames += 1;
                        sink.handle(report);
                    },
                    Err(DecodeError::UnsupportedMessage { class, id }) => {
                        self.stats.unsupported_messages += 1;
                        debug!(
                            "ignoring unsupported message, class {:#04x}, id {:#04x}",
                            class, id
                        );
                    },
                },
                FrameResult::Desync { reason, skipped } => {
                    match reason {
                        DesyncReason::ChecksumMismatch { .. } => {
                            self.stats.checksum_mismatches += 1;
                        },
                        DesyncReason::OversizeLength { .. } => {
                            self.stats.oversize_lengths += 1;
                        },
                        DesyncReason::BufferOverflow => {
                            self.stats.buffer_overflows += 1;
                        },
                    }
                    warn!("desync ({}), {} bytes skipped", reason, skipped);
                },
                // FrameIter ends instead of yielding Incomplete.
                FrameResult::Incomplete => {},
            }
        }
    }
}
