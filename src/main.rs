use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use issuepulse_analytics::activity::{self, ActivityFilters};
use issuepulse_analytics::categories::{self, CategoryFilters};
use issuepulse_analytics::{contributors, impact, resolution};
use issuepulse_core::{Category, Issue, OutputFormat, PulseConfig, TimeWindow, WindowPreset};
use issuepulse_store::LoadStats;

#[derive(Parser)]
#[command(
    name = "issuepulse",
    version,
    about = "Issue tracker analytics from a static export",
    long_about = "issuepulse derives analytical views from a static export of issue-tracking\n\
                   records: per-issue activity scores, category distribution, cross-area\n\
                   impact, contributor activity, and resolution-time trends.\n\n\
                   Examples:\n  \
                     issuepulse activity --window 12m --top 10   Most active issues this year\n  \
                     issuepulse categories --year 2024           Category share and open/closed split\n  \
                     issuepulse impact --window 6m               Issues spanning multiple areas\n  \
                     issuepulse contributors --top 20            Most active users\n  \
                     issuepulse resolution                       Triage timing vs time-to-close\n  \
                     issuepulse doctor                           Check setup and data file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .issuepulse.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the issues JSON export (overrides config and ISSUEPULSE_DATA)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables and summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Rank issues by normalized cross-event activity
    #[command(long_about = "Rank issues by normalized cross-event activity.\n\n\
        Counts each issue's in-window events per kind (opened, commented, labeled,\n\
        assigned, closed, referenced), normalizes each count against the population\n\
        maximum, and sums the terms. Rewards breadth of engagement over a single\n\
        dominant signal.\n\n\
        Examples:\n  issuepulse activity --window 12m\n  issuepulse activity --category Bug,Feature --top 10")]
    Activity {
        /// Window preset: 3m, 6m, 12m, 18m, 24m, or all
        #[arg(long)]
        window: Option<String>,

        /// Explicit window start (RFC 3339, overrides --window)
        #[arg(long)]
        start: Option<String>,

        /// Explicit window end (RFC 3339, overrides --window)
        #[arg(long)]
        end: Option<String>,

        /// Maximum issues to show
        #[arg(long)]
        top: Option<usize>,

        /// Filter by category (comma-separated: Bug, Feature, Docs, Dependency, Infra, Other)
        #[arg(long)]
        category: Option<String>,

        /// Filter by raw labels (comma-separated, case-insensitive substring)
        #[arg(long)]
        labels: Option<String>,
    },
    /// Category share and open/closed distribution
    #[command(long_about = "Category share and open/closed distribution.\n\n\
        Classifies every windowed issue into one of six categories (Bug, Feature,\n\
        Docs, Dependency, Infra, Other), reports each category's share and its\n\
        open/closed split, and breaks down what hides inside the Other bucket.\n\n\
        Examples:\n  issuepulse categories --year 2024\n  issuepulse categories --start-year 2022 --end-year 2024 --labels kind/bug")]
    Categories {
        /// Window preset: 3m, 6m, 12m, 18m, 24m, or all
        #[arg(long)]
        window: Option<String>,

        /// Explicit window start (RFC 3339, overrides --window)
        #[arg(long)]
        start: Option<String>,

        /// Explicit window end (RFC 3339, overrides --window)
        #[arg(long)]
        end: Option<String>,

        /// Single creation year to analyze
        #[arg(long)]
        year: Option<i32>,

        /// Start of creation-year range (use with --end-year)
        #[arg(long)]
        start_year: Option<i32>,

        /// End of creation-year range (use with --start-year)
        #[arg(long)]
        end_year: Option<i32>,

        /// Filter by category (comma-separated)
        #[arg(long)]
        category: Option<String>,

        /// Filter by raw labels (comma-separated, case-insensitive substring)
        #[arg(long)]
        labels: Option<String>,

        /// How many labels/families to surface from the Other bucket
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Issues spanning two or more areas
    #[command(long_about = "Issues spanning two or more areas.\n\n\
        Finds issues carrying two or more distinct area/ labels, ranks them by how\n\
        many areas they touch, and tabulates per-area frequency plus a monthly\n\
        creation timeline.\n\n\
        Examples:\n  issuepulse impact\n  issuepulse impact --window 6m")]
    Impact {
        /// Window preset: 3m, 6m, 12m, 18m, 24m, or all
        #[arg(long)]
        window: Option<String>,

        /// Explicit window start (RFC 3339, overrides --window)
        #[arg(long)]
        start: Option<String>,

        /// Explicit window end (RFC 3339, overrides --window)
        #[arg(long)]
        end: Option<String>,
    },
    /// Rank contributors by created, closed, and commented actions
    Contributors {
        /// Maximum contributors to show
        #[arg(long)]
        top: Option<usize>,
    },
    /// Correlate triage timing with time-to-close
    #[command(long_about = "Correlate triage timing with time-to-close.\n\n\
        For every closed issue, measures days from creation to the first labeled\n\
        and assigned events versus days to close, and fits a least-squares trend\n\
        to each relationship. Reports correlation only — no causal claim.")]
    Resolution,
    /// Create a default .issuepulse.toml configuration file
    #[command(long_about = "Create a default .issuepulse.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .issuepulse.toml already exists.")]
    Init,
    /// Check your issuepulse setup and data file
    #[command(long_about = "Check your issuepulse setup and data file.\n\n\
        Runs diagnostics for the config file, data file presence, export shape,\n\
        and timestamp coverage. Use --format json for machine-readable output.")]
    Doctor,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1m\x1b[33m~\x1b[0m \x1b[1missuepulse\x1b[0m v{version} — issue tracker analytics from a static export\n");

        println!("Quick start:");
        println!("  \x1b[36missuepulse init\x1b[0m                 Create a .issuepulse.toml config file");
        println!("  \x1b[36missuepulse doctor\x1b[0m               Check setup and data file");
        println!("  \x1b[36missuepulse activity --top 10\x1b[0m    Rank the most active issues\n");

        println!("All commands:");
        println!("  \x1b[32mactivity\x1b[0m      Rank issues by normalized cross-event activity");
        println!("  \x1b[32mcategories\x1b[0m    Category share and open/closed distribution");
        println!("  \x1b[32mimpact\x1b[0m        Issues spanning two or more areas");
        println!("  \x1b[32mcontributors\x1b[0m  Most active users");
        println!("  \x1b[32mresolution\x1b[0m    Triage timing vs time-to-close trends");
        println!("  \x1b[32mdoctor\x1b[0m        Check your setup and data file");
        println!("  \x1b[32minit\x1b[0m          Create default configuration\n");
    } else {
        println!("issuepulse v{version} — issue tracker analytics from a static export\n");

        println!("Quick start:");
        println!("  issuepulse init                 Create a .issuepulse.toml config file");
        println!("  issuepulse doctor               Check setup and data file");
        println!("  issuepulse activity --top 10    Rank the most active issues\n");

        println!("All commands:");
        println!("  activity      Rank issues by normalized cross-event activity");
        println!("  categories    Category share and open/closed distribution");
        println!("  impact        Issues spanning two or more areas");
        println!("  contributors  Most active users");
        println!("  resolution    Triage timing vs time-to-close trends");
        println!("  doctor        Check your setup and data file");
        println!("  init          Create default configuration\n");
    }

    println!("Run 'issuepulse <command> --help' for details.");
}

/// Resolve the analysis window: explicit bounds win over a preset, and the
/// preset falls back to the configured default.
fn resolve_window(
    window: &Option<String>,
    start: &Option<String>,
    end: &Option<String>,
    config: &PulseConfig,
) -> Result<TimeWindow> {
    if start.is_some() || end.is_some() {
        let all = TimeWindow::all_time();
        let start = match start {
            Some(raw) => parse_bound(raw)?,
            None => all.start,
        };
        let end = match end {
            Some(raw) => parse_bound(raw)?,
            None => all.end,
        };
        if start > end {
            miette::bail!("window start {start} is after window end {end}");
        }
        return Ok(TimeWindow { start, end });
    }

    let preset_name = window.clone().unwrap_or_else(|| config.analysis.window.clone());
    let preset: WindowPreset = preset_name.parse().map_err(|e: String| {
        miette::miette!(help = "Use one of: 3m, 6m, 12m, 18m, 24m, all", "{e}")
    })?;
    Ok(preset.resolve(Utc::now()))
}

fn parse_bound(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            miette::miette!(
                help = "Use RFC 3339, e.g. 2024-01-01T00:00:00Z",
                "invalid timestamp '{raw}': {e}"
            )
        })
}

fn parse_category_list(raw: &Option<String>) -> Result<Option<Vec<Category>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let mut categories = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let category: Category = part.parse().map_err(|e: String| {
            miette::miette!(
                help = "Categories: Bug, Feature, Docs, Dependency, Infra, Other",
                "{e}"
            )
        })?;
        categories.push(category);
    }
    Ok((!categories.is_empty()).then_some(categories))
}

fn parse_label_list(raw: &Option<String>) -> Option<Vec<String>> {
    let raw = raw.as_ref()?;
    let needles: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!needles.is_empty()).then_some(needles)
}

fn year_range(
    year: Option<i32>,
    start_year: Option<i32>,
    end_year: Option<i32>,
) -> Result<Option<(i32, i32)>> {
    match (year, start_year, end_year) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
            miette::bail!("--year cannot be combined with --start-year/--end-year")
        }
        (Some(y), None, None) => Ok(Some((y, y))),
        (None, Some(start), Some(end)) if start <= end => Ok(Some((start, end))),
        (None, Some(start), Some(end)) => {
            miette::bail!("--start-year {start} is after --end-year {end}")
        }
        (None, Some(_), None) | (None, None, Some(_)) => {
            miette::bail!("--start-year and --end-year must be given together")
        }
        (None, None, None) => Ok(None),
    }
}

/// Load the issue export, with a spinner on interactive terminals.
fn load_data(config: &PulseConfig, cli_data: Option<&Path>) -> Result<(Vec<Issue>, LoadStats)> {
    let path = config.resolve_data_path(cli_data);

    if !path.exists() {
        miette::bail!(miette::miette!(
            help = "Point --data at an issues JSON export, set ISSUEPULSE_DATA,\n       or configure [data] path in .issuepulse.toml",
            "Data file not found: {}",
            path.display()
        ));
    }

    let spinner = if std::io::stderr().is_terminal() {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("spinner template"),
        );
        pb.set_message(format!("Loading {}...", path.display()));
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let result = issuepulse_store::load_issues(&path);

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let (issues, stats) = result.into_diagnostic()?;
    eprintln!("Loaded {} issues from {}.", stats.issues, path.display());
    if stats.skipped_issues > 0 || stats.skipped_events > 0 {
        eprintln!(
            "Skipped {} malformed issue records and {} malformed events.",
            stats.skipped_issues, stats.skipped_events,
        );
    }
    Ok((issues, stats))
}

#[derive(serde::Serialize)]
struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn info(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "info",
            detail: detail.into(),
            hint: None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn run_doctor(
    config: &PulseConfig,
    cli_data: Option<&Path>,
    format: OutputFormat,
    use_color: bool,
) -> Result<()> {
    let mut checks: Vec<CheckResult> = Vec::new();

    // 1. Config file
    let config_path = Path::new(".issuepulse.toml");
    if config_path.exists() {
        checks.push(CheckResult::pass("config_file", ".issuepulse.toml found"));
    } else {
        checks.push(CheckResult::fail(
            "config_file",
            ".issuepulse.toml not found",
            "run 'issuepulse init' to create a default config",
        ));
    }

    // 2. Data file presence
    let data_path = config.resolve_data_path(cli_data);
    if !data_path.exists() {
        checks.push(CheckResult::fail(
            "data_file",
            format!("{} not found", data_path.display()),
            "point --data or ISSUEPULSE_DATA at an issues JSON export",
        ));
    } else {
        checks.push(CheckResult::pass(
            "data_file",
            format!("found at {}", data_path.display()),
        ));

        // 3. Export shape
        match issuepulse_store::load_issues(&data_path) {
            Ok((issues, stats)) => {
                let events: usize = issues.iter().map(|i| i.events.len()).sum();
                let detail = if stats.skipped_issues > 0 || stats.skipped_events > 0 {
                    format!(
                        "{} issues, {} events ({} issue records and {} events skipped)",
                        stats.issues, events, stats.skipped_issues, stats.skipped_events,
                    )
                } else {
                    format!("{} issues, {} events", stats.issues, events)
                };
                checks.push(CheckResult::pass("export_shape", detail));

                // 4. Timestamp coverage
                let years: Vec<i32> = issues.iter().map(|i| i.created_at.year()).collect();
                match (years.iter().min(), years.iter().max()) {
                    (Some(first), Some(last)) => checks.push(CheckResult::info(
                        "coverage",
                        format!("issues created {first}–{last}"),
                    )),
                    _ => checks.push(CheckResult::info("coverage", "no issues in export")),
                }

                let closed = issues.iter().filter(|i| i.is_closed()).count();
                checks.push(CheckResult::info(
                    "states",
                    format!("{} open, {} closed", issues.len() - closed, closed),
                ));
            }
            Err(e) => {
                checks.push(CheckResult::fail(
                    "export_shape",
                    format!("failed to parse: {e}"),
                    "the export must be a JSON array of issue records",
                ));
            }
        }
    }

    match format {
        OutputFormat::Json => {
            let version = env!("CARGO_PKG_VERSION");
            let json = serde_json::json!({
                "version": version,
                "checks": checks,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        _ => {
            let version = env!("CARGO_PKG_VERSION");
            println!("issuepulse v{version} — Environment Check\n");

            for check in &checks {
                let sym = if use_color {
                    check.colored_symbol()
                } else {
                    check.symbol().to_string()
                };
                let label = check.name.replace('_', " ");
                println!("  {sym} {label:<16} {}", check.detail);
                if let Some(hint) = &check.hint {
                    println!("    hint: {hint}");
                }
            }

            let passed = checks.iter().filter(|c| c.status == "pass").count();
            let failed = checks.iter().filter(|c| c.status == "fail").count();
            let info = checks.iter().filter(|c| c.status == "info").count();
            println!("\n{passed} checks passed, {failed} failed, {info} info");
        }
    }

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# issuepulse configuration
# See: https://github.com/issuepulse/issuepulse

[data]
# Path to the issues JSON export (also settable via ISSUEPULSE_DATA)
# path = "./issues.json"

[analysis]
# How many top issues/contributors to show
# top_n = 5

# Default window preset: 3m | 6m | 12m | 18m | 24m | all
# window = "all"

# How many labels/families to surface from the 'Other' bucket
# other_top_k = 10
"#;

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PulseConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = Path::new(".issuepulse.toml");
            if default_path.exists() {
                PulseConfig::from_file(default_path).into_diagnostic()?
            } else {
                PulseConfig::default()
            }
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    if cli.verbose {
        eprintln!("format: {}", cli.format);
        eprintln!(
            "data path: {}",
            config.resolve_data_path(cli.data.as_deref()).display()
        );
    }

    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Activity {
            ref window,
            ref start,
            ref end,
            top,
            ref category,
            ref labels,
        }) => {
            let resolved = resolve_window(window, start, end, &config)?;
            let filters = ActivityFilters {
                categories: parse_category_list(category)?,
                label_needles: parse_label_list(labels),
            };
            let (issues, _) = load_data(&config, cli.data.as_deref())?;

            let mut report = activity::score_activity(&issues, resolved, &filters);
            report.ranked.truncate(top.unwrap_or(config.analysis.top_n));

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&report).into_diagnostic()?
                    );
                }
                OutputFormat::Markdown => print!("{}", report.to_markdown()),
                OutputFormat::Text => print!("{report}"),
            }
        }
        Some(Command::Categories {
            ref window,
            ref start,
            ref end,
            year,
            start_year,
            end_year,
            ref category,
            ref labels,
            top_k,
        }) => {
            let resolved = resolve_window(window, start, end, &config)?;
            let filters = CategoryFilters {
                year_range: year_range(year, start_year, end_year)?,
                categories: parse_category_list(category)?,
                label_needles: parse_label_list(labels),
            };
            let (issues, _) = load_data(&config, cli.data.as_deref())?;

            let report = categories::aggregate(
                &issues,
                resolved,
                &filters,
                top_k.unwrap_or(config.analysis.other_top_k),
            );

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&report).into_diagnostic()?
                    );
                }
                OutputFormat::Markdown => print!("{}", report.to_markdown()),
                OutputFormat::Text => print!("{report}"),
            }
        }
        Some(Command::Impact {
            ref window,
            ref start,
            ref end,
        }) => {
            let resolved = resolve_window(window, start, end, &config)?;
            let (issues, _) = load_data(&config, cli.data.as_deref())?;

            let report = impact::analyze_impact(&issues, resolved);

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&report).into_diagnostic()?
                    );
                }
                OutputFormat::Markdown => print!("{}", report.to_markdown()),
                OutputFormat::Text => print!("{report}"),
            }
        }
        Some(Command::Contributors { top }) => {
            let (issues, _) = load_data(&config, cli.data.as_deref())?;

            let mut report = contributors::rank_contributors(&issues);
            report.ranked.truncate(top.unwrap_or(config.analysis.top_n));

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&report).into_diagnostic()?
                    );
                }
                OutputFormat::Markdown => print!("{}", report.to_markdown()),
                OutputFormat::Text => print!("{report}"),
            }
        }
        Some(Command::Resolution) => {
            let (issues, _) = load_data(&config, cli.data.as_deref())?;

            let report = resolution::analyze_resolution(&issues);

            if cli.verbose {
                eprintln!(
                    "Label samples: {} | Assignment samples: {} | Excluded: {}",
                    report.label_samples.len(),
                    report.assign_samples.len(),
                    report.excluded,
                );
            }

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&report).into_diagnostic()?
                    );
                }
                OutputFormat::Markdown => print!("{}", report.to_markdown()),
                OutputFormat::Text => print!("{report}"),
            }
        }
        Some(Command::Init) => {
            let path = Path::new(".issuepulse.toml");
            if path.exists() {
                miette::bail!(".issuepulse.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .issuepulse.toml with default configuration");
        }
        Some(Command::Doctor) => {
            run_doctor(&config, cli.data.as_deref(), cli.format, use_color)?;
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "issuepulse", &mut std::io::stdout());
        }
    }

    Ok(())
}
