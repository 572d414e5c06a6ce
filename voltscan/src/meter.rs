//! The voltmeter capability and its simulated implementation.

use keysight_34410a::Ky34410a;
use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};
use scanio::{InstrumentError, InstrumentInterface};

/// Capability of a DC voltmeter as the sweep consumes it.
///
/// [`configure`](DcVoltmeter::configure) and [`measure`](DcVoltmeter::measure) are order
/// dependent: a measurement is taken under the most recent configuration.
/// [`measure_once`](DcVoltmeter::measure_once) is the atomic alternative that does not depend on
/// any prior configuration.
pub trait DcVoltmeter: Send {
    /// Prepare the meter for DC voltage measurements with the given range and integration time.
    fn configure(&mut self, range: Option<f64>, nplc: Option<f64>) -> Result<(), InstrumentError>;

    /// Take one reading under the previously configured settings.
    fn measure(&mut self) -> Result<f64, InstrumentError>;

    /// Configure and read in a single request.
    fn measure_once(
        &mut self,
        range: Option<f64>,
        resolution: Option<f64>,
    ) -> Result<f64, InstrumentError>;

    /// Program the meter's own pass/fail comparator. Advisory only.
    fn configure_limits(
        &mut self,
        lower: Option<f64>,
        upper: Option<f64>,
        enable: bool,
    ) -> Result<(), InstrumentError>;

    /// Fetch the meter's own comparator verdict for the last reading. Advisory only.
    fn query_limit_fail(&mut self) -> Result<bool, InstrumentError>;

    /// Release the meter. Idempotent, never fails; any underlying connection is dropped with the
    /// meter itself.
    fn close(&mut self) {}
}

impl<T: InstrumentInterface + Send> DcVoltmeter for Ky34410a<T> {
    fn configure(&mut self, range: Option<f64>, nplc: Option<f64>) -> Result<(), InstrumentError> {
        self.configure_dc_voltage(range, nplc)
    }

    fn measure(&mut self) -> Result<f64, InstrumentError> {
        self.measure_dc_voltage()
    }

    fn measure_once(
        &mut self,
        range: Option<f64>,
        resolution: Option<f64>,
    ) -> Result<f64, InstrumentError> {
        self.measure_dc_voltage_once(range, resolution)
    }

    fn configure_limits(
        &mut self,
        lower: Option<f64>,
        upper: Option<f64>,
        enable: bool,
    ) -> Result<(), InstrumentError> {
        Ky34410a::configure_limits(self, lower, upper, enable)
    }

    fn query_limit_fail(&mut self) -> Result<bool, InstrumentError> {
        Ky34410a::query_limit_fail(self)
    }

    fn close(&mut self) {
        debug!("Meter released, connection closes on drop.");
    }
}

/// A voltmeter that fabricates plausible readings without any hardware.
///
/// Readings are uniformly distributed in [-10, 10] V and rounded to six decimals, the display
/// resolution of the real meter's reports.
pub struct SimulatedMeter {
    rng: StdRng,
}

impl SimulatedMeter {
    /// Create a simulated meter with a random seed.
    pub fn new() -> Self {
        SimulatedMeter {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a simulated meter with a fixed seed for reproducible readings.
    pub fn with_seed(seed: u64) -> Self {
        SimulatedMeter {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn fabricate(&mut self) -> f64 {
        let value: f64 = self.rng.gen_range(-10.0..=10.0);
        (value * 1e6).round() / 1e6
    }
}

impl Default for SimulatedMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl DcVoltmeter for SimulatedMeter {
    fn configure(&mut self, range: Option<f64>, nplc: Option<f64>) -> Result<(), InstrumentError> {
        debug!("Simulated meter: configure range={range:?} nplc={nplc:?}");
        Ok(())
    }

    fn measure(&mut self) -> Result<f64, InstrumentError> {
        Ok(self.fabricate())
    }

    fn measure_once(
        &mut self,
        _range: Option<f64>,
        _resolution: Option<f64>,
    ) -> Result<f64, InstrumentError> {
        Ok(self.fabricate())
    }

    fn configure_limits(
        &mut self,
        lower: Option<f64>,
        upper: Option<f64>,
        enable: bool,
    ) -> Result<(), InstrumentError> {
        debug!("Simulated meter: limits lower={lower:?} upper={upper:?} enable={enable}");
        Ok(())
    }

    fn query_limit_fail(&mut self) -> Result<bool, InstrumentError> {
        Ok(false)
    }
}
