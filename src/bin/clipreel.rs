use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clipreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the timeline to a video or GIF (requires `ffmpeg` and `ffprobe`).
    Render(RenderArgs),
    /// Render the frame at a given time as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input config JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path, overriding `outPath` from the config.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Low resolution, low frame rate preview.
    #[arg(long)]
    fast: bool,

    /// Keep the temporary working directory.
    #[arg(long)]
    keep_tmp: bool,

    /// Debug logging.
    #[arg(long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input config JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Time in seconds.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Debug logging.
    #[arg(long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "clipreel=debug" } else { "clipreel=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn read_config(path: &std::path::Path) -> anyhow::Result<clipreel::RenderConfig> {
    clipreel::RenderConfig::from_path(path)
        .with_context(|| format!("load config '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = read_config(&args.in_path)?;
    init_tracing(args.verbose || config.verbose);
    if let Some(out) = args.out {
        config.out_path = out;
    }
    config.fast |= args.fast;
    config.keep_tmp |= args.keep_tmp;
    for bin in [&config.ffmpeg_path, &config.ffprobe_path] {
        anyhow::ensure!(clipreel::is_available(bin), "'{bin}' is not runnable");
    }

    let report = clipreel::Editor::new(config).render()?;
    eprintln!(
        "wrote {} ({}x{} @ {} fps, {} frames)",
        report.out_path.display(),
        report.canvas.width,
        report.canvas.height,
        report.fps.framerate_str(),
        report.stats.frames_written
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = read_config(&args.in_path)?;
    init_tracing(args.verbose || config.verbose);
    clipreel::Editor::new(config).render_single_frame(args.time, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
