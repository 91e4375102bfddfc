use clap::{Parser, Subcommand};
use heatboard::config::{parse_samples, DemoConfig, KeyboardConfig, PrintConfig};
use heatboard::demo;
use heatboard::descriptor::WidgetDescriptor;
use heatboard::error::Result;
use heatboard::keymap::{self, ROWS};
use heatboard::settings::Settings;
use heatboard::tap::NullSource;
use heatboard::terminal::Terminal;
use heatboard::widget::{Area, HeatKeyboard};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Colour preset the demo starts with unless configured otherwise
const DEMO_PRESET: u8 = 8;

#[derive(Parser)]
#[command(name = "heatboard")]
#[command(author = "Terminal Art Generator")]
#[command(version = "0.1.0")]
#[command(about = "On-screen keyboard with a keystroke heat map and press glow", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log file (default: <cache dir>/heatboard/heatboard.log)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Settings file (default: <config dir>/heatboard/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive demo window
    Demo {
        /// Do not listen to the physical keyboard
        #[arg(long)]
        no_track: bool,

        /// Start with the heat map hidden
        #[arg(long)]
        no_heat: bool,

        /// Frame time in seconds
        #[arg(short, long, default_value = "0.03")]
        time: f32,

        /// Initial counts, e.g. A=3,S=1,Space=7
        #[arg(short, long)]
        samples: Option<String>,

        /// Colour preset (0-9)
        #[arg(short, long)]
        preset: Option<u8>,
    },

    /// Render the keyboard once to stdout
    Print {
        /// Counts to show, e.g. A=3,S=1
        #[arg(short, long)]
        samples: Option<String>,

        /// Width in terminal cells
        #[arg(short = 'W', long, default_value = "114")]
        width: u16,

        /// Height in terminal cells
        #[arg(short = 'H', long, default_value = "18")]
        height: u16,

        /// Colour preset (0-9)
        #[arg(short, long)]
        preset: Option<u8>,
    },

    /// List every key of the layout
    Keys,

    /// Print the form designer descriptor
    Describe {
        /// JSON instead of TOML
        #[arg(long)]
        json: bool,

        /// Print the form snippet instead
        #[arg(long, conflicts_with = "json")]
        xml: bool,
    },
}

fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("heatboard")
        .join("heatboard.log")
}

/// Log to a file; stdout belongs to the UI
fn init_logging(verbose: bool, log_file: Option<PathBuf>) {
    let path = log_file.unwrap_or_else(default_log_path);
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("heatboard: logging disabled, cannot open {}: {}", path.display(), e);
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load_from(path),
        None => Ok(Settings::load()),
    }
}

fn samples_arg(samples: Option<&str>) -> Result<HashMap<keymap::Key, u32>> {
    samples.map(parse_samples).transpose().map(Option::unwrap_or_default)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Demo {
            no_track,
            no_heat,
            time,
            samples,
            preset,
        } => {
            let settings = load_settings(cli.config.as_ref())?;
            let samples = samples_arg(samples.as_deref())?;
            let mut keyboard_settings = settings.keyboard;
            keyboard_settings.preset = keyboard_settings.preset.or(Some(DEMO_PRESET));
            keyboard_settings.track_physical &= !no_track;
            keyboard_settings.heat_map &= !no_heat;

            let keyboard = KeyboardConfig::from_settings(&keyboard_settings, preset);
            let config = DemoConfig::from_settings(keyboard, &settings.demo, samples, time)?;
            debug!(?config, "demo configuration");

            let widget = HeatKeyboard::new();
            let mut term = Terminal::new(true)?;
            demo::run(&mut term, widget, &config)?;
        }
        Commands::Print {
            samples,
            width,
            height,
            preset,
        } => {
            let settings = load_settings(cli.config.as_ref())?;
            let config = PrintConfig {
                keyboard: KeyboardConfig::from_settings(&settings.keyboard, preset),
                samples: samples_arg(samples.as_deref())?,
                width: width.max(1),
                height: height.max(1),
            };

            let mut keyboard = HeatKeyboard::with_source(Box::new(NullSource));
            config.keyboard.apply(&mut keyboard);
            keyboard.set_heat_samples(config.samples);

            let mut term = Terminal::offscreen(config.width, config.height);
            keyboard.paint(&mut term, Area::new(0, 0, config.width, config.height));
            term.print_to_stdout();
        }
        Commands::Keys => {
            println!("{:<4} {:<10} {:<10} {:<12} {}", "ROW", "LABEL", "NAME", "CODE", "SPAN");
            for (row, specs) in ROWS.iter().enumerate() {
                for spec in specs.iter() {
                    println!(
                        "{:<4} {:<10} {:<10} 0x{:<10x} {}x{}",
                        row,
                        spec.label,
                        spec.key.name(),
                        spec.key.0,
                        spec.column_span,
                        spec.row_span
                    );
                }
            }
        }
        Commands::Describe { json, xml } => {
            let mut descriptor = WidgetDescriptor::default();
            descriptor.initialize();
            let text = if xml {
                descriptor.dom_xml()
            } else if json {
                descriptor.to_json()?
            } else {
                descriptor.to_toml()?
            };
            println!("{}", text.trim_end());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.clone());
    info!(version = env!("CARGO_PKG_VERSION"), "heatboard starting");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("heatboard: {}", e);
            ExitCode::FAILURE
        }
    }
}
