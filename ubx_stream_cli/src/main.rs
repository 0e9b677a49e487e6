use std::io;
use std::sync::atomic::Ordering;
use std::time::Duration;

use clap::{value_parser, Arg, Command};
use log::info;
use ubx_stream::{Report, StreamError, StreamPipeline, Transport};

/// Serial port adapter: timeouts become "no data" reads, permission loss is
/// fatal, everything else surfaces as an I/O error.
struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl Transport for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        match self.port.read(buf) {
            Ok(nbytes) => Ok(nbytes),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(StreamError::PermissionDenied)
            },
            Err(e) => Err(StreamError::Io(e)),
        }
    }
}

fn print_report(report: Report) {
    match report {
        Report::PositionGeodetic(pos) => println!(
            "tow {:>6} s  lat {:>12.7}°  lon {:>12.7}°  hMSL {:>9.3} m  acc ±{} m / ±{} m",
            pos.time_of_week_s,
            pos.latitude_deg,
            pos.longitude_deg,
            pos.height_msl_m,
            pos.horizontal_accuracy_m,
            pos.vertical_accuracy_m,
        ),
        Report::PositionEcef(pos) => println!(
            "tow {:>6} s  ecef [{:>12.2}, {:>12.2}, {:>12.2}] m  acc ±{} m",
            pos.time_of_week_s, pos.x_m, pos.y_m, pos.z_m, pos.position_accuracy_m,
        ),
    }
}

fn main() {
    env_logger::init();

    let matches = Command::new("ubx-stream-cli")
        .about("Stream decoded UBX navigation reports from a u-blox receiver")
        .arg(
            Arg::new("port")
                .required(true)
                .help("Serial port path, e.g. /dev/ttyACM0"),
        )
        .arg(
            Arg::new("baud")
                .long("baud")
                .default_value("9600")
                .value_parser(value_parser!(u32))
                .help("Baud rate"),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .default_value("5000")
                .value_parser(value_parser!(u64))
                .help("Per-read timeout in milliseconds"),
        )
        .get_matches();

    let path = matches.get_one::<String>("port").unwrap();
    let baud = *matches.get_one::<u32>("baud").unwrap();
    let timeout_ms = *matches.get_one::<u64>("timeout-ms").unwrap();

    let port = serialport::new(path, baud)
        .timeout(Duration::from_millis(timeout_ms))
        .open()
        .expect("could not open serial port");
    let mut transport = SerialTransport { port };

    let mut pipeline = StreamPipeline::new();
    let shutdown = pipeline.shutdown_handle();
    ctrlc::set_handler(move || shutdown.store(true, Ordering::Relaxed))
        .expect("could not install Ctrl-C handler");

    info!("reading from {path} at {baud} baud");
    let outcome = pipeline.run(&mut transport, &mut print_report);

    let stats = pipeline.stats();
    info!(
        "session: {} reports, {} checksum mismatches, {} unsupported, {} overflows, {} timeouts",
        stats.frames,
        stats.checksum_mismatches,
        stats.unsupported_messages,
        stats.buffer_overflows,
        stats.timeouts,
    );

    if let Err(e) = outcome {
        eprintln!("transport failed: {e}");
        std::process::exit(1);
    }
}
