//! # Estrellita CLI
//!
//! Command-line interface for portable receipt printers.
//!
//! ## Usage
//!
//! ```bash
//! # Print the sample receipt on a 2-inch printer over Bluetooth
//! estrellita --model 2inch --port BT:/dev/rfcomm0 sample
//!
//! # The Japanese sample receipt
//! estrellita --model 3inch --port BT:/dev/rfcomm0 sample --lang ja
//!
//! # Emphasized, centred text over LAN
//! estrellita --port TCP:192.168.1.50 text "HELLO" --emphasized --align center
//!
//! # Encode a QR code to a file instead of printing
//! estrellita --output qr.bin qr "https://example.com" --level Q
//!
//! # Run a JSON job document
//! estrellita --port USB:/dev/usb/lp0 job receipt.json
//!
//! # Read the device status
//! estrellita --port BT:00:11:62:AA:BB:CC status --json
//!
//! # Show the model name and firmware version
//! estrellita --port TCP:192.168.1.50 firmware
//! ```
//!
//! Logs go to stderr. Set `ESTRELLITA_LOG` (e.g. `estrellita=trace`) or pass
//! `-v` for debug output.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use estrellita::{
    Error, ModelClass,
    job::{self, JobDocument, PrintPrimitive, TrailingAction},
    print::{PrintOptions, check_firmware, print_job},
    printer::{CorrectionLevel, Limits, WidthClass},
    protocol::barcode::Symbology,
    protocol::text::{Alignment, DoubleByteCharset, FormattingState},
    receipt::{self, Language},
    render::{BitmapOptions, Dithering},
    signature,
    transport::{
        PORTABLE_ESCPOS, Port, PortAddress, PortKind, SensorActive, Stage, TransportSession,
        tcp::TcpPort,
    },
};

/// Estrellita - portable receipt printer utility
#[derive(Parser, Debug)]
#[command(name = "estrellita")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Printer model class (2inch, 3inch, 4inch, pos80, or a model name)
    #[arg(long, global = true, default_value = "3inch")]
    model: ModelClass,

    /// Printer address: BT:<device|MAC>, USB:<device>, TCP:<host[:port]>
    #[arg(long, global = true)]
    port: Option<String>,

    /// Port settings string
    #[arg(long, global = true, default_value = PORTABLE_ESCPOS)]
    settings: String,

    /// Write and status timeout in milliseconds
    #[arg(long, global = true, default_value_t = 30_000)]
    timeout_ms: u64,

    /// Port open timeout in milliseconds
    #[arg(long, global = true, default_value_t = 20_000)]
    open_timeout_ms: u64,

    /// Send without checking paper and cover first
    #[arg(long, global = true)]
    skip_preflight: bool,

    /// Drawer sensor level that means "open" (high or low)
    #[arg(long, global = true)]
    sensor_active: Option<SensorActive>,

    /// Write the encoded stream to a file instead of a printer
    #[arg(long, global = true, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the sample receipt for the selected model
    Sample {
        /// Receipt language: en, ja (Shift_JIS), or zh-tw (Big5)
        #[arg(long, value_enum, default_value_t = LangArg::En)]
        lang: LangArg,
    },

    /// Print one line of text
    Text {
        content: String,

        #[arg(long)]
        emphasized: bool,

        #[arg(long)]
        underline: bool,

        #[arg(long)]
        invert: bool,

        #[arg(long)]
        upside_down: bool,

        /// Character height multiplier (1-8)
        #[arg(long, default_value_t = 1)]
        height: u8,

        /// Character width multiplier (1-8)
        #[arg(long, default_value_t = 1)]
        width: u8,

        #[arg(long, value_enum, default_value_t = AlignArg::Left)]
        align: AlignArg,

        /// Print as Shift_JIS or Big5 double-byte text
        #[arg(long, value_enum)]
        charset: Option<CharsetArg>,
    },

    /// Print a linear barcode
    Barcode {
        data: String,

        #[arg(long, value_enum, default_value_t = SymbologyArg::Code39)]
        symbology: SymbologyArg,

        /// Bar height in dots
        #[arg(long, default_value_t = 60)]
        height: u8,

        /// Module width class (0-7)
        #[arg(long, default_value_t = 1)]
        width_class: u8,
    },

    /// Print a QR code
    Qr {
        data: String,

        /// Correction level (L, M, Q, H)
        #[arg(long, default_value = "M")]
        level: CorrectionLevel,

        /// Module size in dots
        #[arg(long, default_value_t = 4)]
        module_size: u8,

        /// Symbol version, 0 for automatic
        #[arg(long, default_value_t = 0)]
        size: u8,
    },

    /// Print a PDF417 code
    Pdf417 {
        data: String,

        #[arg(long, default_value_t = 1)]
        width_class: u8,

        #[arg(long, default_value_t = 4)]
        columns: u8,

        #[arg(long, default_value_t = 2)]
        security: u8,

        #[arg(long, default_value_t = 3)]
        ratio: u8,
    },

    /// Print an image file
    Image {
        path: PathBuf,

        /// Target width in dots (defaults to the paper width)
        #[arg(long)]
        width: Option<u16>,

        /// Use the compressed raster command
        #[arg(long)]
        compress: bool,

        /// Print in page mode
        #[arg(long)]
        page_mode: bool,

        /// threshold, bayer, or floyd-steinberg
        #[arg(long, default_value = "threshold")]
        dither: Dithering,
    },

    /// Print signature-pad strokes from a JSON file
    Signature { path: PathBuf },

    /// Run a JSON job document
    Job { path: PathBuf },

    /// Query and show the device status
    Status {
        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the printer's model name and firmware version
    Firmware {
        /// Print the information as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported model classes
    Models,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AlignArg {
    Left,
    Center,
    Right,
}

impl From<AlignArg> for Alignment {
    fn from(value: AlignArg) -> Self {
        match value {
            AlignArg::Left => Alignment::Left,
            AlignArg::Center => Alignment::Center,
            AlignArg::Right => Alignment::Right,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CharsetArg {
    ShiftJis,
    Big5,
}

impl From<CharsetArg> for DoubleByteCharset {
    fn from(value: CharsetArg) -> Self {
        match value {
            CharsetArg::ShiftJis => DoubleByteCharset::ShiftJis,
            CharsetArg::Big5 => DoubleByteCharset::Big5,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LangArg {
    En,
    Ja,
    ZhTw,
}

impl From<LangArg> for Language {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Language::English,
            LangArg::Ja => Language::Japanese,
            LangArg::ZhTw => Language::TraditionalChinese,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SymbologyArg {
    Code39,
    Code93,
    Itf,
    Code128,
}

impl From<SymbologyArg> for Symbology {
    fn from(value: SymbologyArg) -> Self {
        match value {
            SymbologyArg::Code39 => Symbology::Code39,
            SymbologyArg::Code93 => Symbology::Code93,
            SymbologyArg::Itf => Symbology::Itf,
            SymbologyArg::Code128 => Symbology::Code128,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "estrellita=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("ESTRELLITA_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Error> {
    let limits = cli.model.limits();

    let (primitives, trailing) = match &cli.command {
        Commands::Models => {
            list_models();
            return Ok(());
        }
        Commands::Status { json } => return show_status(&cli, *json),
        Commands::Firmware { json } => return show_firmware(&cli, *json),
        Commands::Sample { lang } => (
            receipt::sample((*lang).into(), &limits, chrono::Local::now().naive_local()),
            receipt::sample_trailing(&limits),
        ),
        Commands::Text {
            content,
            emphasized,
            underline,
            invert,
            upside_down,
            height,
            width,
            align,
            charset,
        } => {
            let format = FormattingState::new()
                .emphasized(*emphasized)
                .underline(*underline)
                .invert(*invert)
                .upside_down(*upside_down)
                .scale(*height, *width)
                .alignment((*align).into());
            let primitive = match charset {
                Some(charset) => PrintPrimitive::DoubleByteText {
                    content: content.clone(),
                    charset: (*charset).into(),
                    format,
                },
                None => PrintPrimitive::text_from_str(content, format)?,
            };
            (vec![primitive], feed())
        }
        Commands::Barcode {
            data,
            symbology,
            height,
            width_class,
        } => (
            vec![PrintPrimitive::Barcode {
                symbology: (*symbology).into(),
                height: *height,
                width: WidthClass::try_from(*width_class)?,
                payload: data.clone().into_bytes(),
            }],
            feed(),
        ),
        Commands::Qr {
            data,
            level,
            module_size,
            size,
        } => (
            vec![PrintPrimitive::QrCode {
                correction_level: *level,
                module_size: *module_size,
                size_by_ec_level: *size,
                payload: data.clone().into_bytes(),
            }],
            feed(),
        ),
        Commands::Pdf417 {
            data,
            width_class,
            columns,
            security,
            ratio,
        } => (
            vec![PrintPrimitive::Pdf417 {
                width: WidthClass::try_from(*width_class)?,
                columns: *columns,
                security_level: *security,
                ratio: *ratio,
                payload: data.clone().into_bytes(),
            }],
            feed(),
        ),
        Commands::Image {
            path,
            width,
            compress,
            page_mode,
            dither,
        } => {
            let image = image::open(path)
                .map_err(|e| Error::Image(format!("{}: {}", path.display(), e)))?;
            let options = BitmapOptions {
                target_width_dots: width.unwrap_or(limits.max_dot_width),
                compression: *compress,
                page_mode: *page_mode,
                dithering: *dither,
            };
            (vec![PrintPrimitive::Bitmap { image, options }], feed())
        }
        Commands::Signature { path } => {
            let strokes = signature::parse(&fs::read_to_string(path)?)?;
            (vec![signature::primitive(&strokes, &limits)], feed())
        }
        Commands::Job { path } => {
            let doc = JobDocument::from_json(&fs::read_to_string(path)?)?;
            let base = path.parent().unwrap_or(Path::new("."));
            doc.into_parts(base, &limits)?
        }
    };

    let job = job::compose(&primitives, &trailing, &limits)?;
    info!(model = %cli.model, bytes = job.len(), "job composed");

    if let Some(output) = &cli.output {
        fs::write(output, job.as_bytes())?;
        println!("Wrote {} bytes to {}", job.len(), output.display());
        return Ok(());
    }

    let address = address(&cli)?;
    let options = PrintOptions {
        skip_preflight: cli.skip_preflight,
        sensor_active: cli.sensor_active.unwrap_or_default(),
        open_timeout: Some(Duration::from_millis(cli.open_timeout_ms)),
        status_timeout: None,
        cancel: None,
    };
    let timeout = Duration::from_millis(cli.timeout_ms);
    let len = job.len();

    let outcome = match address.kind {
        PortKind::Lan => print_job(&TcpPort::new(), &address, job, timeout, &options)?,
        #[cfg(unix)]
        PortKind::Bluetooth | PortKind::Usb => print_job(
            &estrellita::transport::serial::SerialPort::new(),
            &address,
            job,
            timeout,
            &options,
        )?,
        #[cfg(not(unix))]
        _ => {
            return Err(Error::Address(format!(
                "{address}: serial ports are not supported on this platform"
            )));
        }
    };
    println!("Printed {} bytes. Printer: {}", len, outcome.final_status);
    Ok(())
}

fn feed() -> Vec<TrailingAction> {
    vec![TrailingAction::Feed { lines: 3 }]
}

fn address(cli: &Cli) -> Result<PortAddress, Error> {
    let port = cli
        .port
        .as_deref()
        .ok_or_else(|| Error::Address("no --port or --output given".to_string()))?;
    let address: PortAddress = port.parse().map_err(Error::Address)?;
    Ok(address.with_settings(cli.settings.clone()))
}

fn list_models() {
    println!("{:<10} {:<18} {:>6} {:>7}  extras", "class", "name", "dots", "mm");
    for model in ModelClass::ALL {
        let limits: Limits = model.limits();
        let mut extras = Vec::new();
        if limits.has_cutter {
            extras.push("cutter");
        }
        if limits.has_drawer {
            extras.push("drawer");
        }
        println!(
            "{:<10} {:<18} {:>6} {:>7.1}  {}",
            model.to_string(),
            limits.name,
            limits.max_dot_width,
            limits.max_dot_width as f32 / limits.dots_per_mm(),
            extras.join(", ")
        );
        println!("{:<10} aliases: {}", "", model.aliases().join(", "));
    }
}

fn show_status(cli: &Cli, json: bool) -> Result<(), Error> {
    let address = address(cli)?;
    let open_timeout = Duration::from_millis(cli.open_timeout_ms);
    let timeout = Duration::from_millis(cli.timeout_ms);
    let sensor = cli.sensor_active.unwrap_or_default();

    fn query<P: Port>(
        port: &P,
        address: &PortAddress,
        open_timeout: Duration,
        timeout: Duration,
        sensor: SensorActive,
    ) -> Result<estrellita::transport::DeviceStatus, Error> {
        let mut session =
            TransportSession::open(port, address, open_timeout)?.with_sensor_active(sensor);
        let status = session.query_status(Stage::Preflight, timeout)?;
        session.close();
        Ok(status)
    }

    let status = match address.kind {
        PortKind::Lan => query(&TcpPort::new(), &address, open_timeout, timeout, sensor)?,
        #[cfg(unix)]
        PortKind::Bluetooth | PortKind::Usb => query(
            &estrellita::transport::serial::SerialPort::new(),
            &address,
            open_timeout,
            timeout,
            sensor,
        )?,
        #[cfg(not(unix))]
        _ => {
            return Err(Error::Address(format!(
                "{address}: serial ports are not supported on this platform"
            )));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{}: {}", address, status);
    }
    Ok(())
}

fn show_firmware(cli: &Cli, json: bool) -> Result<(), Error> {
    let address = address(cli)?;
    let open_timeout = Duration::from_millis(cli.open_timeout_ms);
    let timeout = Duration::from_millis(cli.timeout_ms);

    let info = match address.kind {
        PortKind::Lan => check_firmware(&TcpPort::new(), &address, open_timeout, timeout)?,
        #[cfg(unix)]
        PortKind::Bluetooth | PortKind::Usb => check_firmware(
            &estrellita::transport::serial::SerialPort::new(),
            &address,
            open_timeout,
            timeout,
        )?,
        #[cfg(not(unix))]
        _ => {
            return Err(Error::Address(format!(
                "{address}: serial ports are not supported on this platform"
            )));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("Model Name: {}", info.model_name);
        println!("Firmware Version: {}", info.firmware_version);
    }
    Ok(())
}
