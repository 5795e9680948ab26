use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;

use chainterm::articles::ContentProvider;
use chainterm::chain::{compute_lighting, ChainFrame, Compositor};
use chainterm::config::{load_or_default, AppConfig};
use chainterm::easing::{EasingCurve, EASE_IN_OUT, EASE_OUT};
use chainterm::error_codes::{
    envelope_for, find_coded_error, CodedError, ARTICLE_NOT_FOUND, PROGRESS_RANGE, SPEED_RANGE,
};
use chainterm::logging;
use chainterm::progress::{ProgressOptions, ProgressSource, ScrollProgress, ScrollRegion};
use chainterm::spring::SpringConfig;
use chainterm::terminal::{LineKind, TerminalSession};

#[derive(Debug, Parser)]
#[command(name = "chainterm")]
#[command(version = env!("CHAINTERM_VERSION"))]
#[command(about = "Scroll-driven chain backdrop and scripted terminal, headless")]
struct Cli {
    /// YAML settings file. Stock settings are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print machine-readable JSON on stdout.
    #[arg(long, global = true)]
    json: bool,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compose every chain layer at one progress value.
    Frame {
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        progress: f32,
    },
    /// Simulate the smoothing springs following a scroll jump.
    Scroll(ScrollArgs),
    /// Shade a chain element twisted by the given angle.
    Lighting {
        #[arg(long, allow_negative_numbers = true)]
        angle: f32,
    },
    /// Play the intro script, then read commands from stdin.
    Terminal {
        /// Reveal the whole intro at once.
        #[arg(long)]
        skip: bool,
        #[arg(long)]
        reduced_motion: bool,
        /// Playback rate of the intro, 0.01 to 100; 2 plays twice as fast.
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
    Articles {
        #[command(subcommand)]
        command: ArticleCommands,
    },
    /// Validate the settings file and summarize it.
    Check,
}

#[derive(Debug, Subcommand)]
enum ArticleCommands {
    /// Newest first.
    List {
        #[arg(long)]
        tag: Option<String>,
    },
    Show {
        slug: String,
    },
    Tags,
}

#[derive(Debug, Args)]
struct ScrollArgs {
    /// Target progress in [0, 1].
    #[arg(long, conflicts_with = "scroll_top", allow_negative_numbers = true)]
    to: Option<f32>,
    /// Target scroll offset in pixels; needs the page and viewport heights.
    #[arg(long, requires_all = ["content_height", "viewport_height"])]
    scroll_top: Option<f32>,
    #[arg(long)]
    content_height: Option<f32>,
    #[arg(long)]
    viewport_height: Option<f32>,
    #[arg(long, value_enum, default_value_t = SpringPreset::Chain)]
    spring: SpringPreset,
    #[arg(long, value_enum, default_value_t = EasePreset::Linear)]
    ease: EasePreset,
    #[arg(long, default_value_t = 120)]
    frames: usize,
    #[arg(long, default_value_t = 1000.0 / 60.0)]
    frame_ms: f64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SpringPreset {
    Chain,
    Scroll,
    Hero,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EasePreset {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    SiteOut,
    SiteInOut,
}

impl EasePreset {
    fn curve(self) -> EasingCurve {
        match self {
            Self::Linear => EasingCurve::Linear,
            Self::EaseIn => EasingCurve::EaseIn,
            Self::EaseOut => EasingCurve::EaseOut,
            Self::EaseInOut => EasingCurve::EaseInOut,
            Self::SiteOut => EasingCurve::CubicBezier(EASE_OUT),
            Self::SiteInOut => EasingCurve::CubicBezier(EASE_IN_OUT),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(error) = logging::init(cli.verbose) {
        eprintln!("warning: {error:#}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => report_error(&error, cli.json),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_or_default(cli.config.as_deref())?;
    match &cli.command {
        Commands::Frame { progress } => run_frame(&config, *progress, cli.json),
        Commands::Scroll(args) => run_scroll(&config, args, cli.json),
        Commands::Lighting { angle } => run_lighting(*angle, cli.json),
        Commands::Terminal {
            skip,
            reduced_motion,
            speed,
        } => run_terminal(&config, *skip, *reduced_motion, *speed, cli.json),
        Commands::Articles { command } => run_articles(&config, command, cli.json),
        Commands::Check => run_check(cli, &config),
    }
}

fn report_error(error: &anyhow::Error, json: bool) -> ExitCode {
    if json {
        match serde_json::to_string_pretty(&envelope_for(error)) {
            Ok(rendered) => println!("{rendered}"),
            Err(_) => eprintln!("error: {error:#}"),
        }
    } else {
        eprintln!("error: {error:#}");
    }
    let code = find_coded_error(error).map_or(1, |coded| coded.kind.exit_code());
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to serialize JSON output")?;
    println!("{rendered}");
    Ok(())
}

fn checked_progress(value: f32) -> Result<f32> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        return Ok(value);
    }
    Err(anyhow!(CodedError::usage(
        PROGRESS_RANGE,
        format!("progress must be within [0, 1], got {value}"),
    )
    .with_details(json!({ "provided": value, "allowed": [0.0, 1.0] }))))
}

const SPEED_BOUNDS: (f64, f64) = (0.01, 100.0);

fn checked_speed(value: f64) -> Result<f64> {
    if value.is_finite() && (SPEED_BOUNDS.0..=SPEED_BOUNDS.1).contains(&value) {
        return Ok(value);
    }
    Err(anyhow!(CodedError::usage(
        SPEED_RANGE,
        format!(
            "speed must be within [{}, {}], got {value}",
            SPEED_BOUNDS.0, SPEED_BOUNDS.1
        ),
    )
    .with_details(json!({ "provided": value, "allowed": [SPEED_BOUNDS.0, SPEED_BOUNDS.1] }))))
}

fn run_frame(config: &AppConfig, progress: f32, json: bool) -> Result<()> {
    let progress = checked_progress(progress)?;
    let compositor = Compositor::new(config.layer_registry()?);
    let frame = compositor.compose(progress);
    if json {
        return print_json(&frame);
    }
    print_frame(&frame);
    Ok(())
}

fn print_frame(frame: &ChainFrame) {
    println!(
        "progress {:.3}: {} layers, {} elements (back to front)",
        frame.progress,
        frame.layers.len(),
        frame.element_count()
    );
    for layer in &frame.layers {
        let twist = layer
            .elements
            .iter()
            .map(|element| element.transform.twist_angle_degrees);
        let (low, high) = twist.fold((f32::INFINITY, f32::NEG_INFINITY), |(low, high), angle| {
            (low.min(angle), high.max(angle))
        });
        println!(
            "  {:<12} y {:>5.1}%  offset {:>8.1}  scale {:.2}  opacity {:.2}  blur {:.1}  twist {:>6.1}..{:<6.1}  x{}",
            layer.id,
            layer.vertical_position_percent,
            layer.chain_offset,
            layer.scale,
            layer.opacity,
            layer.blur_amount,
            low,
            high,
            layer.elements.len()
        );
    }
}

#[derive(Debug, Serialize)]
struct ScrollRow {
    frame: usize,
    at_ms: f64,
    #[serde(flatten)]
    progress: ScrollProgress,
    smooth_velocity: f32,
    eased: f32,
}

#[derive(Debug, Serialize)]
struct ScrollReport {
    target: f32,
    spring: SpringConfig,
    easing: EasingCurve,
    settled_frame: Option<usize>,
    frames: Vec<ScrollRow>,
}

fn run_scroll(config: &AppConfig, args: &ScrollArgs, json: bool) -> Result<()> {
    let target = match (args.to, args.scroll_top) {
        (Some(to), _) => checked_progress(to)?,
        (None, Some(scroll_top)) => {
            let region = ScrollRegion::Page {
                content_height: args.content_height.unwrap_or_default(),
                viewport_height: args.viewport_height.unwrap_or_default(),
            };
            region.fraction(scroll_top)
        }
        (None, None) => 1.0,
    };
    let options = match args.spring {
        SpringPreset::Chain => config.chain_progress_options(),
        SpringPreset::Scroll => config.scroll,
        SpringPreset::Hero => ProgressOptions {
            spring: SpringConfig::hero(),
            ..config.scroll
        },
    };
    let easing = args.ease.curve();

    let mut source = ProgressSource::new(options);
    source.observe_scroll(target, 0.0);
    let mut rows = Vec::with_capacity(args.frames);
    let mut settled_frame = None;
    for frame in 0..args.frames {
        let at_ms = frame as f64 * args.frame_ms;
        let progress = source.on_frame(at_ms);
        rows.push(ScrollRow {
            frame,
            at_ms,
            progress,
            smooth_velocity: source.smooth_velocity(),
            eased: easing.apply(progress.smoothed),
        });
        if source.is_settled() {
            settled_frame = Some(frame);
            break;
        }
    }

    let report = ScrollReport {
        target,
        spring: options.spring,
        easing,
        settled_frame,
        frames: rows,
    };
    if json {
        return print_json(&report);
    }

    println!(
        "target {:.3}  spring k={} c={} m={}",
        report.target, report.spring.stiffness, report.spring.damping, report.spring.mass
    );
    for row in &report.frames {
        println!(
            "{:>4} {:>8.1}ms  raw {:.3}  smoothed {:.4}  eased {:.4}  velocity {:>7.3}",
            row.frame,
            row.at_ms,
            row.progress.raw,
            row.progress.smoothed,
            row.eased,
            row.progress.velocity
        );
    }
    match report.settled_frame {
        Some(frame) => println!("settled at frame {frame}"),
        None => println!("not settled after {} frames", report.frames.len()),
    }
    Ok(())
}

fn run_lighting(angle: f32, json: bool) -> Result<()> {
    let lighting = compute_lighting(angle);
    let palette = lighting.palette();
    if json {
        return print_json(&json!({
            "angle": angle,
            "lighting": lighting,
            "palette": palette,
            "drop_shadow_alpha": lighting.drop_shadow_alpha(),
            "rim_alpha": lighting.rim_alpha(),
        }));
    }
    println!(
        "angle {angle}: brightness {}  highlight {:.3}  shadow {:.3}  gradient {:.1}deg",
        lighting.brightness,
        lighting.highlight_intensity,
        lighting.shadow_intensity,
        lighting.gradient_rotation
    );
    println!(
        "palette: dark {}  mid {}  light {}  highlight {}",
        palette.dark, palette.mid, palette.light, palette.highlight
    );
    Ok(())
}

fn run_terminal(
    config: &AppConfig,
    skip: bool,
    reduced_motion: bool,
    speed: f64,
    json: bool,
) -> Result<()> {
    let speed = checked_speed(speed)?;
    let mut options = config.session_options();
    options.reduced_motion |= reduced_motion;
    let mut session = TerminalSession::new(options, Default::default());
    let mut printed = 0;
    let echo = !json;

    session.start();
    if skip {
        session.request_skip();
    }
    while !session.typewriter_phase().is_finished() {
        let Some(deadline) = session.next_deadline() else {
            break;
        };
        let wait_ms = deadline.saturating_sub(session.now_ms());
        thread::sleep(Duration::from_secs_f64(wait_ms as f64 / 1000.0 / speed));
        session.tick(wait_ms);
        flush_lines(&session, &mut printed, echo)?;
    }
    flush_lines(&session, &mut printed, echo)?;

    if echo {
        println!("try: {}", session.suggested_commands().join(" | "));
    }
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        if line.trim() == "exit" {
            break;
        }
        session.submit(&line);
        flush_lines(&session, &mut printed, echo)?;
    }

    session.unmount();
    if json {
        return print_json(session.state());
    }
    Ok(())
}

/// Prints settled lines not yet shown. A cleared history starts over.
fn flush_lines(session: &TerminalSession, printed: &mut usize, echo: bool) -> Result<()> {
    let history = session.state().history();
    if history.len() < *printed {
        *printed = 0;
    }
    let mut stdout = io::stdout().lock();
    for line in &history[*printed..] {
        if line.still_typing {
            break;
        }
        if echo {
            match line.kind {
                LineKind::Error => writeln!(stdout, "! {}", line.text)?,
                _ => writeln!(stdout, "{}", line.text)?,
            }
        }
        *printed += 1;
    }
    stdout.flush()?;
    Ok(())
}

fn run_articles(config: &AppConfig, command: &ArticleCommands, json: bool) -> Result<()> {
    let store = config.article_store();
    match command {
        ArticleCommands::List { tag } => {
            let articles = match tag {
                Some(tag) => store.articles_by_tag(tag)?,
                None => store.list_articles()?,
            };
            if json {
                return print_json(&articles);
            }
            for article in &articles {
                println!(
                    "{}  {:<28} {} ({} min)",
                    article.date, article.slug, article.title, article.reading_time_minutes
                );
            }
            Ok(())
        }
        ArticleCommands::Show { slug } => {
            let Some(article) = store.article_by_slug(slug)? else {
                return Err(anyhow!(CodedError::not_found(
                    ARTICLE_NOT_FOUND,
                    format!("no article with slug '{slug}'"),
                )
                .with_details(json!({
                    "slug": slug,
                    "articles_dir": store.root().display().to_string(),
                }))));
            };
            if json {
                return print_json(&article);
            }
            println!("{}", article.title);
            println!(
                "{} · {} · {} min read · {}",
                article.date,
                article.author,
                article.reading_time_minutes,
                article.tags.join(", ")
            );
            println!();
            println!("{}", article.body_text);
            Ok(())
        }
        ArticleCommands::Tags => {
            let tags = store.list_tags()?;
            if json {
                return print_json(&tags);
            }
            for tag in tags {
                println!("{tag}");
            }
            Ok(())
        }
    }
}

fn run_check(cli: &Cli, config: &AppConfig) -> Result<()> {
    config.validate()?;
    let registry = config.layer_registry()?;
    let source = cli
        .config
        .as_ref()
        .map_or_else(|| "stock settings".to_owned(), |path| path.display().to_string());

    if cli.json {
        return print_json(&json!({
            "ok": true,
            "source": source,
            "layers": registry.layers().len(),
            "elements": registry.total_elements(),
            "script_items": config.terminal.sequence.len(),
            "articles_dir": config.content.articles_dir.display().to_string(),
        }));
    }
    println!(
        "OK: {} ({} layers, {} elements, {} script items)",
        source,
        registry.layers().len(),
        registry.total_elements(),
        config.terminal.sequence.len()
    );
    println!("Articles: {}", config.content.articles_dir.display());
    Ok(())
}
