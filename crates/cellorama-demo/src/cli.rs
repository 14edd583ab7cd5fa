use std::path::PathBuf;
use std::time::{Duration, Instant};

use cellorama_core::SizeClass;
use cellorama_layout::{IntrinsicSurface, LayoutNode, PassStats};
use cellorama_runtime::{
    CelloramaError, HostScreen, OptionChange, Options, Result, Settings, TabStyle,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(
    name = "cellorama",
    about = "Headless driver for the Cellorama nested collection layout engine",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a tree, churn it and report the final layout.
    Run(RunArgs),

    /// Print the tab style names.
    #[command(name = "list-styles")]
    ListStyles,

    /// Print the default settings as TOML.
    #[command(name = "print-config")]
    PrintConfig,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Tab style: zone, grid, carousel, stack, tab or mixed.
    #[arg(long, default_value = "mixed")]
    pub style: String,

    /// Screen width in points.
    #[arg(long, default_value_t = cellorama_runtime::DEFAULT_WIDTH)]
    pub width: f32,

    /// Settings file (TOML, or JSON with a `.json` extension).
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub sections: Option<usize>,

    /// Leaves per section.
    #[arg(long)]
    pub items: Option<usize>,

    /// Leaf size class: small, medium, large, xlarge or dynamic.
    #[arg(long)]
    pub size: Option<String>,

    #[arg(long)]
    pub columns: Option<u16>,

    /// Use the flow family instead of the compositional one.
    #[arg(long)]
    pub legacy: bool,

    /// Re-roll section arrangements on every tick.
    #[arg(long)]
    pub transitions: bool,

    /// Randomization rounds to apply synchronously.
    #[arg(long, default_value_t = 0)]
    pub ticks: usize,

    /// Additionally run the animation timer for this long.
    #[arg(long)]
    pub animate_for_ms: Option<u64>,

    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Emit a JSON summary instead of text.
    #[arg(long)]
    pub json: bool,
}

/// What a run reports.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub style: TabStyle,
    pub family: String,
    pub width: f32,
    pub height: f32,
    pub sections: usize,
    pub leaves: usize,
    pub visible_leaves: usize,
    pub ticks: usize,
    pub edits: usize,
    pub batches: usize,
    pub stats: PassStats,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => {
            let json = args.json;
            let summary = run_screen(&args)?;
            print_summary(&summary, json)
        }
        Commands::ListStyles => {
            for style in TabStyle::ALL {
                println!("{style}");
            }
            Ok(())
        }
        Commands::PrintConfig => {
            print!("{}", Settings::default().to_toml_string()?);
            Ok(())
        }
    }
}

/// Resolve options for `args`: file settings first, then flags.
pub fn resolve_options(args: &RunArgs) -> Result<(TabStyle, Options)> {
    let style: TabStyle = args.style.parse()?;
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let mut options = *settings.get(style);
    if let Some(sections) = args.sections {
        options.sections = sections;
    }
    if let Some(items) = args.items {
        options.items = items;
    }
    if let Some(size) = &args.size {
        options.size = size.parse::<SizeClass>().map_err(CelloramaError::invalid)?;
    }
    if let Some(columns) = args.columns {
        options.columns = columns;
    }
    options.legacy |= args.legacy;
    options.transitions |= args.transitions;
    // The timer only runs when asked for explicitly.
    options.animate = false;

    let problems = options.validate();
    if !problems.is_empty() {
        return Err(CelloramaError::InvalidOptions { problems });
    }
    if !args.width.is_finite() || args.width <= 0.0 {
        return Err(CelloramaError::invalid(format!(
            "width must be a positive number, got {}",
            args.width
        )));
    }
    Ok((style, options))
}

/// Build the screen, churn it and summarize the last layout.
pub fn run_screen(args: &RunArgs) -> Result<RunSummary> {
    let (style, options) = resolve_options(args)?;
    let mut screen = HostScreen::new(IntrinsicSurface::new(), style, options, args.seed);
    screen.resize(args.width);

    for step in 0..args.ticks {
        let kind = screen.tick();
        tracing::debug!(step, %kind, nodes = screen.stats().total, "tick");
    }
    let mut ticks = args.ticks;

    if let Some(ms) = args.animate_for_ms {
        screen.set_option(OptionChange::Animate(true));
        let deadline = Instant::now() + Duration::from_millis(ms);
        while let Some(left) = deadline.checked_duration_since(Instant::now()) {
            ticks += screen.pump_timeout(left);
        }
        screen.stop_animation();
        ticks += screen.pump();
    }

    // Anything still pending after the timer stopped.
    let edits = screen.apply_snapshot();
    let node = screen.apply_layout().clone();
    Ok(summarize(&screen, &node, ticks, edits))
}

fn summarize(
    screen: &HostScreen<IntrinsicSurface>,
    node: &LayoutNode,
    ticks: usize,
    edits: usize,
) -> RunSummary {
    RunSummary {
        style: screen.style(),
        family: screen.context().config().family.to_string(),
        width: node.frame.width,
        height: node.frame.height,
        sections: screen.shown().sections.len(),
        leaves: screen.root().leaf_count(),
        visible_leaves: node.visible_leaf_count(),
        ticks,
        edits,
        batches: screen.surface().batches(),
        stats: screen.stats(),
    }
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    println!("style:    {} ({})", summary.style, summary.family);
    println!("frame:    {} x {}", summary.width, summary.height);
    println!(
        "content:  {} sections, {} leaves ({} visible)",
        summary.sections, summary.leaves, summary.visible_leaves
    );
    println!("churn:    {} ticks, {} batches", summary.ticks, summary.batches);
    println!(
        "last pass: {} recomputed, {} cached, {} leaves measured",
        summary.stats.recomputed, summary.stats.cached, summary.stats.leaves_measured
    );
    Ok(())
}
