//! The events a running sweep emits to its observer.

use std::path::PathBuf;

use crate::record::MeasurementRecord;

/// One notification from the sweep worker.
///
/// The runner emits these over an [`std::sync::mpsc`] channel; the receiving side (a CLI loop, a
/// UI thread, a test) owns all presentation state and decides how to display them. Events for
/// channel `i` are always emitted before the worker moves on to channel `i + 1`, and
/// [`SweepEvent::Completed`] is emitted strictly after the report has been written.
#[derive(Clone, Debug)]
pub enum SweepEvent {
    /// The given channel is being selected and will be measured next.
    Selecting {
        /// Channel index, 0..=7.
        index: usize,
    },
    /// One channel visit finished with this record.
    Row(MeasurementRecord),
    /// A fault occurred. Per-channel faults are followed by more events; a sweep-level fault is
    /// the last event of the sweep.
    Error(String),
    /// The sweep finished and the report was written to the given path.
    Completed(PathBuf),
}
