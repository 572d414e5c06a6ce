//! A rust driver for the Keysight 34410A digital multimeter.
//!
//! The driver covers the DC voltage capabilities of the instrument: configuring function, range,
//! and integration time, triggering readings, and programming the instrument side pass/fail
//! comparator. The 34410A speaks SCPI over a raw socket (port 5025 by default), with every
//! command and reply terminated by `"\n"`.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use scanio::TcpIpInstrument;
//! use keysight_34410a::Ky34410a;
//!
//! let interface = TcpIpInstrument::try_new("192.168.0.61:5025", Duration::from_secs(1)).unwrap();
//! let mut dmm = Ky34410a::new(interface);
//!
//! dmm.configure_dc_voltage(Some(10.0), Some(1.0)).unwrap();
//! println!("Reading: {} V", dmm.measure_dc_voltage().unwrap());
//! ```

#![warn(missing_docs)]

use std::sync::{Arc, Mutex};

use scanio::{InstrumentError, InstrumentInterface};

/// A rust driver for the Keysight 34410A.
///
/// The instrument keeps its measurement configuration between commands. The intended call order
/// for repeated readings is [`Ky34410a::configure_dc_voltage`] once, followed by
/// [`Ky34410a::measure_dc_voltage`] per reading. Alternatively,
/// [`Ky34410a::measure_dc_voltage_once`] configures and reads in a single request and does not
/// depend on any prior configuration.
pub struct Ky34410a<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
}

impl<T: InstrumentInterface> Ky34410a<T> {
    /// Create a new Keysight 34410A instance with the given instrument interface.
    ///
    /// # Arguments
    /// - `interface`: An instrument interface that implements the `InstrumentInterface` trait.
    pub fn new(interface: T) -> Self {
        Ky34410a {
            interface: Arc::new(Mutex::new(interface)),
        }
    }

    /// Query the name, hardware, and firmware version of the device as a string.
    pub fn get_name(&mut self) -> Result<String, InstrumentError> {
        Ok(self.query("*IDN?")?.trim().to_string())
    }

    /// Configure the instrument for DC voltage measurements.
    ///
    /// The status and error queues are cleared first so that leftovers from a previous session
    /// cannot affect the run, then the measurement function is set to DC voltage.
    ///
    /// # Arguments
    /// - `range`: Fixed measurement range in volts. Autorange is left active when `None`.
    /// - `nplc`: Integration time in power-line cycles. One cycle is about 20 ms at 50 Hz and
    ///   about 16.67 ms at 60 Hz; more cycles trade speed for noise rejection.
    pub fn configure_dc_voltage(
        &mut self,
        range: Option<f64>,
        nplc: Option<f64>,
    ) -> Result<(), InstrumentError> {
        self.sendcmd("*CLS")?;
        self.sendcmd("CONF:VOLT:DC")?;
        if let Some(range) = range {
            self.sendcmd(&format!("SENS:VOLT:DC:RANG {range}"))?;
        }
        if let Some(nplc) = nplc {
            self.sendcmd(&format!("SENS:VOLT:DC:NPLC {nplc}"))?;
        }
        Ok(())
    }

    /// Trigger and read back one value under the previously configured settings.
    ///
    /// This sends `READ?` and parses the reply as a float. Call
    /// [`Ky34410a::configure_dc_voltage`] first, otherwise the instrument measures with whatever
    /// configuration it happens to be in.
    pub fn measure_dc_voltage(&mut self) -> Result<f64, InstrumentError> {
        let resp = self.query("READ?")?;
        parse_response(&resp)
    }

    /// Configure and read one DC voltage value in a single request.
    ///
    /// This sends `MEAS:VOLT:DC?`, which temporarily applies the given range and resolution and
    /// does not depend on any prior configuration. When only a resolution is given, the range is
    /// sent as the SCPI default placeholder `DEF`.
    ///
    /// # Arguments
    /// - `range`: Measurement range in volts.
    /// - `resolution`: Measurement resolution in volts.
    pub fn measure_dc_voltage_once(
        &mut self,
        range: Option<f64>,
        resolution: Option<f64>,
    ) -> Result<f64, InstrumentError> {
        let cmd = match (range, resolution) {
            (None, None) => "MEAS:VOLT:DC?".to_string(),
            (Some(range), None) => format!("MEAS:VOLT:DC? {range}"),
            (Some(range), Some(res)) => format!("MEAS:VOLT:DC? {range},{res}"),
            (None, Some(res)) => format!("MEAS:VOLT:DC? DEF,{res}"),
        };
        let resp = self.query(&cmd)?;
        parse_response(&resp)
    }

    /// Program the instrument side pass/fail comparator.
    ///
    /// A missing bound is sent as `MIN`/`MAX`, i.e., the smallest/largest value the instrument
    /// can represent. The comparator verdict can be fetched with
    /// [`Ky34410a::query_limit_fail`].
    ///
    /// # Arguments
    /// - `lower`: Lower limit in volts, `MIN` when `None`.
    /// - `upper`: Upper limit in volts, `MAX` when `None`.
    /// - `enable`: Whether the limit calculation is turned on.
    pub fn configure_limits(
        &mut self,
        lower: Option<f64>,
        upper: Option<f64>,
        enable: bool,
    ) -> Result<(), InstrumentError> {
        self.sendcmd("CALC:FUNC LIM")?;
        self.sendcmd(if enable { "CALC:STAT ON" } else { "CALC:STAT OFF" })?;
        match lower {
            Some(lower) => self.sendcmd(&format!("CALC:LIM:LOW {lower}"))?,
            None => self.sendcmd("CALC:LIM:LOW MIN")?,
        }
        match upper {
            Some(upper) => self.sendcmd(&format!("CALC:LIM:UPP {upper}"))?,
            None => self.sendcmd("CALC:LIM:UPP MAX")?,
        }
        Ok(())
    }

    /// Turn the limit calculation off and return to the plain measurement mode.
    pub fn clear_limits(&mut self) -> Result<(), InstrumentError> {
        self.sendcmd("CALC:STAT OFF")?;
        self.sendcmd("CALC:FUNC NULL")
    }

    /// Query the instrument side comparator verdict of the last reading.
    ///
    /// `CALC:LIM:FAIL?` is tried first (1 = fail, 0 = pass). Not every firmware supports it, so
    /// if the reply is missing or unparsable, the Questionable Data register is inspected
    /// instead: bit 11 flags a low limit failure, bit 12 a high limit failure.
    pub fn query_limit_fail(&mut self) -> Result<bool, InstrumentError> {
        if let Ok(resp) = self.query("CALC:LIM:FAIL?") {
            if let Ok(val) = parse_response(&resp) {
                return Ok(val as i64 == 1);
            }
        }
        let cond = parse_response(&self.query("STAT:QUES:COND?")?)? as i64;
        Ok(cond & (1 << 11) != 0 || cond & (1 << 12) != 0)
    }

    /// Send a command to the instrument.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        self.interface
            .lock()
            .expect("Mutex should not be poisoned")
            .sendcmd(cmd)
    }

    /// Query the instrument with a command and return the response as a String.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.interface
            .lock()
            .expect("Mutex should not be poisoned")
            .query(cmd)
    }
}

/// Parse an instrument reply as a float, e.g., `+4.237010E-01`.
fn parse_response(resp: &str) -> Result<f64, InstrumentError> {
    resp.trim()
        .parse::<f64>()
        .map_err(|_| InstrumentError::ResponseParseError(resp.to_string()))
}
