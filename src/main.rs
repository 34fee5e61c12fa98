use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use gadget_tree::config::{self, Options};
use gadget_tree::configfs;
use gadget_tree::gadget::State;

/// Log level for the application
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Verbose,
    Debug,
    Trace,
}

/// gadget-tree command line arguments
#[derive(Parser, Debug)]
#[command(name = "gadget-tree")]
#[command(version, about = "Inspect and compose USB gadgets through configfs", long_about = None)]
struct CliArgs {
    /// Gadget root directory (overrides options file)
    #[arg(short = 'r', long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// UDC class directory (overrides options file)
    #[arg(long, value_name = "DIR")]
    udc_class: Option<PathBuf>,

    /// Options file (JSON)
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, verbose, debug, trace)
    #[arg(short = 'l', long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Increase verbosity (-v for verbose, -vv for debug, -vvv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the gadget tree
    Show {
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create gadgets from a layout file
    Apply {
        #[arg(value_name = "LAYOUT")]
        layout: PathBuf,
    },
    /// Bind a gadget to a UDC
    Enable {
        gadget: String,
        /// UDC to bind to (default: first available)
        #[arg(long, value_name = "NAME")]
        udc: Option<String>,
    },
    /// Unbind a gadget from its UDC
    Disable { gadget: String },
    /// List available UDCs
    Udcs,
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    init_logging(args.log_level, args.verbose, args.log_json);

    let options = resolve_options(&args)?;
    tracing::debug!("Options: {:?}", options);

    let mount = Path::new(configfs::CONFIGFS_MOUNT);
    if options.gadget_root == mount.join(configfs::GADGET_SUBDIR)
        && !configfs::is_configfs_available(mount)
    {
        tracing::warn!(
            "ConfigFS USB gadget support not found. Is configfs mounted at {}?",
            mount.display()
        );
    }

    match args.command {
        Command::Show { json } => {
            let state = State::load_with_options(options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&state.snapshot())?);
            } else {
                print_tree(&state)?;
            }
        }
        Command::Apply { layout } => {
            let layouts = config::load_layouts(&layout)?;
            let mut state = State::load_with_options(options)?;
            for layout in &layouts {
                state
                    .apply_layout(layout)
                    .with_context(|| format!("Failed to set up gadget {}", layout.name))?;
            }
        }
        Command::Enable { gadget, udc } => {
            let mut state = State::load_with_options(options)?;
            let id = state
                .get_gadget(&gadget)
                .with_context(|| format!("No such gadget: {}", gadget))?;
            state.enable_gadget(id, udc.as_deref())?;
        }
        Command::Disable { gadget } => {
            let mut state = State::load_with_options(options)?;
            let id = state
                .get_gadget(&gadget)
                .with_context(|| format!("No such gadget: {}", gadget))?;
            state.disable_gadget(id)?;
        }
        Command::Udcs => {
            for udc in configfs::list_udcs(&options.udc_class_path)? {
                println!("{}", udc);
            }
        }
    }

    Ok(())
}

/// Options file first, then command line overrides
fn resolve_options(args: &CliArgs) -> anyhow::Result<Options> {
    let mut options = match &args.config {
        Some(path) => config::load_options(path)?,
        None => Options::default(),
    };
    if let Some(root) = &args.root {
        options.gadget_root = root.clone();
    }
    if let Some(udc_class) = &args.udc_class {
        options.udc_class_path = udc_class.clone();
    }
    Ok(options)
}

fn print_tree(state: &State) -> anyhow::Result<()> {
    println!("{}", state.configfs_path().display());
    for g in state.gadgets() {
        let gadget = state.gadget(g)?;
        if gadget.is_bound() {
            println!("  {} [{}]", gadget.name(), gadget.udc());
        } else {
            println!("  {}", gadget.name());
        }

        for f in state.functions(g) {
            let function = state.function(f)?;
            println!(
                "    function {} ({})",
                function.name(),
                function.function_type().description()
            );
        }

        for c in state.configs(g) {
            println!("    config {}", state.config(c)?.name());
            for b in state.bindings(c) {
                let binding = state.binding(b)?;
                match binding.target() {
                    Some(f) => println!("      {} -> {}", binding.name(), state.function(f)?.name()),
                    None => println!("      {} -> ?", binding.name()),
                }
            }
        }
    }
    Ok(())
}

/// Initialize logging with tracing
fn init_logging(level: LogLevel, verbose_count: u8, json: bool) {
    // Verbose count overrides log level
    let effective_level = match verbose_count {
        0 => level,
        1 => LogLevel::Verbose,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    let filter = match effective_level {
        LogLevel::Error => "gadget_tree=error",
        LogLevel::Warn => "gadget_tree=warn",
        LogLevel::Info => "gadget_tree=info",
        LogLevel::Verbose => "gadget_tree=debug",
        LogLevel::Debug => "gadget_tree=debug",
        LogLevel::Trace => "gadget_tree=trace",
    };

    // Environment variable takes highest priority
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    // Logs go to stderr so `show --json` output stays parseable
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
    {
        eprintln!("failed to initialize tracing: {}", err);
    }
}
