//! The sweep runner: one ordered pass over all eight channels.

use std::{
    io,
    sync::mpsc::Sender,
    thread::{self, JoinHandle},
};

use log::{debug, error, info, warn};
use thiserror::Error;

use scanio::InstrumentError;

use crate::{
    config::{MeasureStrategy, NUM_CHANNELS, SweepConfig},
    event::SweepEvent,
    meter::DcVoltmeter,
    mux::MuxSelector,
    record::{MeasurementRecord, ReportError, SweepLog},
};

/// Sweep-level faults that terminate the sweep.
///
/// Per-channel faults never show up here; they are reported as [`SweepEvent::Error`] and
/// recorded as failed rows while the sweep continues.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The initial meter configuration failed before any channel was visited.
    #[error("Meter configuration failed: {0}")]
    Configure(#[from] InstrumentError),
    /// The report could not be written after the last channel.
    #[error("Report could not be written: {0}")]
    Report(#[from] ReportError),
}

/// Owns the meter, the selector, and the log for the duration of one sweep.
///
/// The runner visits channels 0 through 7 in order, exactly once each. A fault on a single
/// channel, such as a stuck relay or an unparsable reply, is confined to that channel's record
/// and the sweep carries on. Both dependents are closed on every exit path.
pub struct SweepRunner {
    config: SweepConfig,
    meter: Box<dyn DcVoltmeter>,
    selector: MuxSelector,
    log: SweepLog,
}

impl SweepRunner {
    /// Create a runner from its fully configured parts.
    pub fn new(
        config: SweepConfig,
        meter: Box<dyn DcVoltmeter>,
        selector: MuxSelector,
        log: SweepLog,
    ) -> Self {
        SweepRunner {
            config,
            meter,
            selector,
            log,
        }
    }

    /// Run the sweep on a dedicated worker thread.
    ///
    /// Events arrive on the given sender; the calling thread keeps the receiving end and is
    /// free to block on it. The channel closes when the sweep is done.
    pub fn spawn(self, events: Sender<SweepEvent>) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("sweep".to_string())
            .spawn(move || self.run(&events))
    }

    /// Run the sweep on the current thread.
    ///
    /// Event sends are best effort: a departed receiver never stops the sweep.
    pub fn run(mut self, events: &Sender<SweepEvent>) {
        if let Err(err) = self.sweep(events) {
            let msg = format!("Sweep aborted: {err}");
            error!("{msg}");
            let _ = events.send(SweepEvent::Error(msg));
        }
        // Cleanup runs no matter how the sweep ended.
        self.meter.close();
        self.selector.close();
    }

    fn sweep(&mut self, events: &Sender<SweepEvent>) -> Result<(), SweepError> {
        if self.config.strategy == MeasureStrategy::Configured {
            self.meter
                .configure(self.config.range, self.config.nplc)?;
        }

        for index in 0..NUM_CHANNELS {
            let _ = events.send(SweepEvent::Selecting { index });

            if let Err(err) = self.selector.select_index(index) {
                let msg = format!("Selecting Y{index} failed: {err}");
                error!("{msg}");
                let _ = events.send(SweepEvent::Error(msg));
                // The visit still proceeds against whatever state the lines ended up in.
            }

            let bound = self.config.bounds[index];
            if self.config.use_inst_limits {
                if let Err(err) =
                    self.meter
                        .configure_limits(Some(bound.lower), Some(bound.upper), true)
                {
                    warn!(
                        "Device limit setup failed on Y{index}: {err}. \
                         The program-side check still applies."
                    );
                }
            }

            let mut error = None;
            let value = match self.measure_channel() {
                Ok(value) => value,
                Err(err) => {
                    let msg = format!("Measurement failed on Y{index}: {err}");
                    error!("{msg}");
                    let _ = events.send(SweepEvent::Error(msg.clone()));
                    error = Some(msg);
                    f64::NAN
                }
            };

            let passed = bound.contains(value);
            if value.is_nan() && error.is_none() {
                error = Some("NaN".to_string());
            }

            if self.config.use_inst_limits {
                // Advisory only, never reconciled with the program-side verdict.
                match self.meter.query_limit_fail() {
                    Ok(fail) => debug!(
                        "Device limit verdict on Y{index}: {}",
                        if fail { "FAIL" } else { "PASS" }
                    ),
                    Err(err) => debug!("Device limit verdict unavailable on Y{index}: {err}"),
                }
            }

            let record = MeasurementRecord {
                index,
                value,
                lower: bound.lower,
                upper: bound.upper,
                passed,
                error,
            };
            self.log.add_row(record.clone());
            let _ = events.send(SweepEvent::Row(record));
            info!("Channel Y{index} visit complete.");

            if !self.config.interval.is_zero() {
                thread::sleep(self.config.interval);
            }
        }

        let path = self.log.save_csv()?;
        let _ = events.send(SweepEvent::Completed(path));
        Ok(())
    }

    fn measure_channel(&mut self) -> Result<f64, InstrumentError> {
        match self.config.strategy {
            MeasureStrategy::OneShot => self.meter.measure_once(self.config.range, None),
            MeasureStrategy::Configured => self.meter.measure(),
        }
    }
}
