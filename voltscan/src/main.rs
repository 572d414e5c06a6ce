//! CLI entry point for voltscan.
//!
//! Wires the meter, the selector, and the recorder together, starts a sweep on its worker
//! thread, and renders the incoming events. Connection failures at startup do not abort the
//! run: the affected side falls back to simulation so the sweep still exercises the full path
//! against fabricated data.

use std::{io, path::PathBuf, sync::mpsc, time::Duration};

use anyhow::{Result, bail};
use clap::Parser;
use log::{info, warn};

use keysight_34410a::Ky34410a;
use scanio::TcpIpInstrument;
use voltscan::{
    ChannelLabels, DcVoltmeter, MeasureStrategy, MeasurementRecord, MuxSelector, SimulatedMeter,
    SweepConfig, SweepEvent, SweepLog, SweepRunner,
    config::parse_bounds,
    operator,
};

#[derive(Parser)]
#[command(name = "voltscan")]
#[command(about = "8-channel DC voltage acceptance sweep", long_about = None)]
struct Cli {
    /// DMM host address.
    #[arg(long, default_value = "192.168.0.61")]
    host: String,

    /// DMM SCPI socket port.
    #[arg(long, default_value_t = 5025)]
    port: u16,

    /// Per-operation socket timeout in seconds.
    #[arg(long, default_value_t = 1.0)]
    timeout: f64,

    /// Fixed measurement range in volts; autorange when omitted.
    #[arg(long)]
    range: Option<f64>,

    /// Integration time in power-line cycles.
    #[arg(long, default_value_t = 1.0)]
    nplc: f64,

    /// Pause between channels in seconds.
    #[arg(long, default_value_t = 0.5)]
    interval: f64,

    /// One-shot MEAS:VOLT:DC? per channel instead of configure-once plus READ?.
    #[arg(long)]
    one_shot: bool,

    /// Also program the pass/fail window into the meter's comparator (advisory).
    #[arg(long)]
    inst_limits: bool,

    /// Run without any hardware attached.
    #[arg(long)]
    simulate: bool,

    /// Serial port of the relay box driving the A/B/C lines; selector runs simulated when
    /// omitted.
    #[arg(long)]
    mux_port: Option<String>,

    /// Baud rate of the relay box.
    #[arg(long, default_value_t = 9600)]
    mux_baud: u32,

    /// Expected relay box serial tag, checked against *IDN? before switching anything.
    #[arg(long)]
    mux_serial: Option<String>,

    /// Pass/fail bounds: one 'lower:upper' pair for all channels, or eight comma-separated
    /// pairs.
    #[arg(long, default_value = "-10:10")]
    bounds: String,

    /// Channel label settings file.
    #[arg(long, default_value = "channels.toml")]
    labels: PathBuf,

    /// Directory the report is written into.
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Prompt for operator metadata (OPID/MO/PN) before starting.
    #[arg(long)]
    operator: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = SweepConfig {
        host: cli.host,
        port: cli.port,
        timeout: Duration::from_secs_f64(cli.timeout.max(0.0)),
        range: cli.range,
        nplc: Some(cli.nplc),
        interval: Duration::from_secs_f64(cli.interval.max(0.0)),
        strategy: if cli.one_shot {
            MeasureStrategy::OneShot
        } else {
            MeasureStrategy::Configured
        },
        use_inst_limits: cli.inst_limits,
        bounds: parse_bounds(&cli.bounds)?,
    };

    if cli.operator {
        let stdin = io::stdin();
        match operator::prompt(&mut stdin.lock(), &mut io::stderr())? {
            Some(op) => info!("Operator: OPID={} MO={} PN={}", op.opid, op.mo, op.pn),
            None => {
                info!("Cancelled at the operator prompt.");
                return Ok(());
            }
        }
    }

    let labels = ChannelLabels::load_or_default(&cli.labels);

    let meter: Box<dyn DcVoltmeter> = if cli.simulate {
        warn!("Simulated meter requested, readings are fabricated (uniform +/-10 V).");
        Box::new(SimulatedMeter::new())
    } else {
        match TcpIpInstrument::try_new(config.socket_addr(), config.timeout) {
            Ok(interface) => {
                info!("DMM connected on {}.", config.socket_addr());
                Box::new(Ky34410a::new(interface))
            }
            Err(err) => {
                warn!("DMM connection failed: {err}. Falling back to simulated meter.");
                Box::new(SimulatedMeter::new())
            }
        }
    };

    let selector = if cli.simulate {
        MuxSelector::simulated()
    } else {
        match &cli.mux_port {
            Some(port) => MuxSelector::open_lines(port, cli.mux_baud, cli.mux_serial.as_deref()),
            None => {
                warn!("No relay box port given, selector runs simulated.");
                MuxSelector::simulated()
            }
        }
    };

    let log = SweepLog::new(&cli.log_dir, labels.clone());
    let runner = SweepRunner::new(config, meter, selector, log);

    let (tx, rx) = mpsc::channel();
    let handle = runner.spawn(tx)?;

    let mut report = None;
    for event in rx {
        match event {
            SweepEvent::Selecting { index } => println!("Selecting {} ...", labels.name(index)),
            SweepEvent::Row(row) => println!("{}", format_row(&labels, &row)),
            SweepEvent::Error(message) => eprintln!("ERROR: {message}"),
            SweepEvent::Completed(path) => {
                println!("Report: {}", path.display());
                report = Some(path);
            }
        }
    }

    if handle.join().is_err() {
        bail!("Sweep worker panicked.");
    }
    if report.is_none() {
        bail!("Sweep aborted before a report was written.");
    }
    Ok(())
}

fn format_row(labels: &ChannelLabels, row: &MeasurementRecord) -> String {
    let value = if row.value.is_nan() {
        "-".to_string()
    } else {
        format!("{:.6}", row.value)
    };
    let verdict = if row.passed { "PASS" } else { "FAIL" };
    let error = row.error.as_deref().unwrap_or("");
    format!(
        "{:<16} {:>12}  [{}, {}]  {}  {}",
        labels.name(row.index),
        value,
        row.lower,
        row.upper,
        verdict,
        error
    )
}
