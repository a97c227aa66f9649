use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use f2dot::graph::{self, Graph};
use f2dot::parser::{FsSource, ModelCompiler, Sdf3Compiler};
use f2dot::settings::{self, Overrides, Settings};
use log::{LevelFilter, debug, info};
use std::str::FromStr;

const LOG_FILE_NAME: &str = "f2dot.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Hierarchical ForSyDe-XML process network
    Forsyde,
    /// SDF3 application graph
    Sdf3,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Plot ForSyDe-XML and SDF3 models as Graphviz graphs", long_about = None)]
struct Cli {
    /// Root model file
    #[arg(value_name = "INPUT", required_unless_present = "generate_config")]
    input: Option<String>,

    /// Kind of model in INPUT
    #[arg(short, long, value_enum, default_value_t = Mode::Forsyde)]
    mode: Mode,

    /// Output directory (default: the input folder)
    #[arg(short, long)]
    output: Option<String>,

    /// Configuration file (default: f2dot.toml in the input folder)
    #[arg(short, long)]
    config: Option<String>,

    /// Write the default configuration file and exit
    #[arg(short, long)]
    generate_config: bool,

    /// Plot direction: LR or TB
    #[arg(long)]
    dir: Option<String>,

    /// Detail level; composites at this depth are drawn as boxes
    #[arg(long)]
    level: Option<i64>,

    /// Graphviz layout program
    #[arg(long)]
    prog: Option<String>,

    /// Graphviz output format
    #[arg(long)]
    format: Option<String>,

    /// Write the DOT source without running Graphviz
    #[arg(long)]
    raw: bool,

    /// Print the compiled graph as JSON instead of writing a file
    #[arg(long)]
    dump_graph: bool,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write a debug log to f2dot.log in the input folder
    #[arg(short, long)]
    log: bool,
}

fn init_logging(cli: &Cli) -> Result<()> {
    let mut log_level = LevelFilter::from_str(&cli.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", cli.log_level);
        LevelFilter::Warn
    });
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if let (true, Some(input)) = (cli.log, &cli.input) {
        let dir = Utf8Path::new(input)
            .parent()
            .filter(|p| !p.as_str().is_empty())
            .unwrap_or(Utf8Path::new("."));
        let path = dir.join(LOG_FILE_NAME);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create log file {}", path))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
        log_level = log_level.max(LevelFilter::Debug);
    }
    builder.filter_level(log_level).init();
    info!(log_level:?; "Starting f2dot");
    debug!("Parsed arguments: {:?}", cli);
    Ok(())
}

fn compile(settings: &Settings, mode: Mode) -> Result<Graph> {
    let graph = match mode {
        Mode::Forsyde => ModelCompiler::new(settings, FsSource).compile(),
        Mode::Sdf3 => Sdf3Compiler::new(settings, FsSource).compile(),
    };
    graph.with_context(|| format!("Failed to compile {}", settings.input))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let output_dir = cli.output.as_deref().map(Utf8PathBuf::from);
    if cli.generate_config {
        let dir = output_dir.unwrap_or_else(|| Utf8PathBuf::from("."));
        let path = settings::generate_config(&dir)?;
        println!("Configuration written to {}", path);
        return Ok(());
    }
    let Some(input) = cli.input.as_deref() else {
        anyhow::bail!("No input model given");
    };

    let overrides = Overrides {
        direction: cli.dir.clone(),
        level: cli.level,
        format: cli.format.clone(),
        prog: cli.prog.clone(),
    };
    let settings = Settings::load(
        input,
        output_dir.as_deref(),
        cli.config.as_deref().map(Utf8Path::new),
        &overrides,
    )?;

    let graph = compile(&settings, cli.mode)?;

    if cli.dump_graph {
        println!("{}", serde_json::to_string_pretty(&graph)?);
        return Ok(());
    }
    let source = graph::dot::to_dot(&graph);
    if cli.raw {
        graph::render::write_source(&source, &settings.output_file("dot"))?;
    } else {
        let cfg = &settings.config;
        graph::render::render_to_file(&source, &cfg.prog, &cfg.format, &settings.output_file(&cfg.format))?;
    }
    info!("Completed successfully");
    Ok(())
}
