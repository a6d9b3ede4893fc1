use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use fedgen::changes::{ChangeSet, CollectionChanges};
use fedgen::config::{self, ProjectConfig, OUTPUT_ENV};
use fedgen::report::{FileChange, LineKind};
use fedgen::spec::{self, SpecFormat};
use fedgen::wiring::DEFAULT_REMOTE_HOST;
use fedgen::{logging, Orchestrator, RegionIndex, RunOptions, RunReport};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Unchanged lines shown around each hunk.
const DIFF_CONTEXT: usize = 3;

#[derive(Parser)]
#[command(name = "fedgen")]
#[command(about = "Specification-driven micro-frontend project generator", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging and full error chains
    #[arg(long, global = true)]
    debug: bool,

    /// Project config file (defaults to fedgen.toml next to the spec)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every component of a specification
    Generate {
        /// Specification document (YAML or JSON)
        spec: PathBuf,

        /// Output root
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show what would change without writing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Replace component directories that already exist
        #[arg(short, long)]
        force: bool,

        /// Show a diff of every file written
        #[arg(short, long)]
        diff: bool,
    },

    /// Patch a generated project to match an updated specification
    Update {
        /// Specification document (YAML or JSON)
        spec: PathBuf,

        /// Output root
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show what would change without writing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show a diff of every file written
        #[arg(short, long)]
        diff: bool,
    },

    /// Print the change set between the baseline and a specification
    Plan {
        /// Specification document (YAML or JSON)
        spec: PathBuf,

        /// Output root
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the managed regions of a file
    Regions {
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(cli.debug);

    let result = match cli.command {
        Commands::Generate {
            spec,
            output,
            dry_run,
            force,
            diff,
        } => cmd_generate(&spec, output, cli.config.as_deref(), dry_run, force, diff),

        Commands::Update {
            spec,
            output,
            dry_run,
            diff,
        } => cmd_update(&spec, output, cli.config.as_deref(), dry_run, diff),

        Commands::Plan { spec, output } => cmd_plan(&spec, output, cli.config.as_deref()),

        Commands::Regions { file } => cmd_regions(&file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {}", "error:".red().bold(), error);
            if cli.debug {
                for cause in error.chain().skip(1) {
                    eprintln!("  {} {}", "caused by:".dimmed(), cause);
                }
            }
            ExitCode::FAILURE
        }
    }
}

/// Explicit `--config`, otherwise `fedgen.toml` beside the spec.
fn load_config(explicit: Option<&Path>, spec_path: &Path) -> Result<Option<ProjectConfig>> {
    let config = match explicit {
        Some(path) => Some(config::load_from_path(path)?),
        None => config::discover(spec_path)?,
    };
    Ok(config)
}

fn build_orchestrator(
    spec_path: &Path,
    output: Option<PathBuf>,
    config_path: Option<&Path>,
    dry_run: bool,
    force: bool,
) -> Result<Orchestrator> {
    let config = load_config(config_path, spec_path)?;
    let env_output = env::var_os(OUTPUT_ENV).map(PathBuf::from);

    let mut options = RunOptions::new(config::resolve_output(output, env_output, config.as_ref()));
    options.dry_run = dry_run;
    options.force = force;
    options.format = SpecFormat::from_path(spec_path);
    options.remote_host = config
        .as_ref()
        .map_or(DEFAULT_REMOTE_HOST, ProjectConfig::remote_host)
        .to_string();

    let orchestrator = Orchestrator::new(options);
    Ok(match &config {
        Some(config) => orchestrator.with_generators(config.generator_set()),
        None => orchestrator,
    })
}

fn cmd_generate(
    spec_path: &Path,
    output: Option<PathBuf>,
    config_path: Option<&Path>,
    dry_run: bool,
    force: bool,
    show_diff: bool,
) -> Result<()> {
    let spec = spec::load_from_path(spec_path)?;
    let orchestrator = build_orchestrator(spec_path, output, config_path, dry_run, force)?;

    println!("Spec: {} ({})", spec.name, spec_path.display());
    println!("Output: {}", orchestrator.options().output.display());
    println!();

    let report = orchestrator.generate(&spec)?;
    print_report(&report, show_diff);
    Ok(())
}

fn cmd_update(
    spec_path: &Path,
    output: Option<PathBuf>,
    config_path: Option<&Path>,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    let spec = spec::load_from_path(spec_path)?;
    let orchestrator = build_orchestrator(spec_path, output, config_path, dry_run, false)?;

    println!("Spec: {} ({})", spec.name, spec_path.display());
    println!("Output: {}", orchestrator.options().output.display());
    println!();

    let report = orchestrator.update(&spec)?;
    print_change_set(&report.change_set);
    print_report(&report, show_diff);
    Ok(())
}

fn cmd_plan(spec_path: &Path, output: Option<PathBuf>, config_path: Option<&Path>) -> Result<()> {
    let spec = spec::load_from_path(spec_path)?;
    let orchestrator = build_orchestrator(spec_path, output, config_path, true, false)?;
    let change_set = orchestrator.plan(&spec)?;
    print_change_set(&change_set);
    Ok(())
}

fn cmd_regions(file: &Path) -> Result<()> {
    let text =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let index = RegionIndex::new(&text);

    if index.regions().is_empty() {
        println!("{}", "No managed regions".yellow());
        return Ok(());
    }

    for region in index.regions() {
        let id = region.id.as_deref().unwrap_or("(anonymous)");
        let lines = region.body.lines().count();
        println!(
            "{} {} {}",
            id.bold(),
            format!("lines {}-{}", region.start_line + 1, region.end_line + 1).dimmed(),
            format!("({lines} body lines)").dimmed()
        );
    }
    Ok(())
}

fn print_collection(label: &str, changes: &CollectionChanges) {
    if changes.is_empty() {
        return;
    }
    println!("{}", label.bold());
    for name in &changes.added {
        println!("  {} {}", "+".green(), name);
    }
    for delta in &changes.modified {
        let fields: Vec<_> = delta.fields.iter().map(|f| f.as_str()).collect();
        println!("  {} {} ({})", "~".yellow(), delta.name, fields.join(", ").dimmed());
    }
    for name in &changes.removed {
        println!("  {} {}", "-".red(), name);
    }
}

fn print_change_set(change_set: &ChangeSet) {
    if change_set.is_empty() {
        println!("{}", "No changes".dimmed());
        println!();
        return;
    }
    if !change_set.shell.is_empty() {
        let fields: Vec<_> = change_set.shell.iter().map(|f| f.as_str()).collect();
        println!("{} {}", "shell:".bold(), fields.join(", "));
    }
    print_collection("remotes:", &change_set.remotes);
    print_collection("apis:", &change_set.apis);
    println!();
}

fn display_change(change: &FileChange) {
    println!(
        "\n{}",
        format!("--- {} ({})", change.path.display(), change.action).dimmed()
    );
    println!("{}", format!("+++ {}", change.path.display()).dimmed());

    for hunk in change.hunks(DIFF_CONTEXT) {
        println!(
            "{}",
            format!("@@ -{} +{} @@", hunk.old_start, hunk.new_start).cyan()
        );
        for line in &hunk.lines {
            let rendered = line.to_string();
            match line.kind {
                LineKind::Add => println!("{}", rendered.green()),
                LineKind::Remove => println!("{}", rendered.red()),
                LineKind::Context => println!("{}", rendered.normal()),
            }
        }
    }
}

fn print_report(report: &RunReport, show_diff: bool) {
    let verb = |done: &'static str, pending: &'static str| {
        if report.dry_run {
            pending
        } else {
            done
        }
    };

    if report.dry_run {
        println!("{}", "[DRY RUN - nothing was written]".cyan());
    }
    for dir in &report.generated {
        println!(
            "{} {} {}",
            "✓".green(),
            verb("Generated", "Would generate"),
            dir.display()
        );
    }
    for dir in &report.pending {
        println!(
            "{} {}: generator cannot preview, skipped",
            "⊙".yellow(),
            dir.display()
        );
    }
    for file in &report.patched {
        println!(
            "{} {} {}",
            "✓".green(),
            verb("Patched", "Would patch"),
            file.display()
        );
    }
    for dir in &report.removed {
        println!(
            "{} {} {}",
            "✗".red(),
            verb("Removed", "Would remove"),
            dir.display()
        );
    }
    for warning in &report.warnings {
        eprintln!("{} {}", "⚠".yellow(), warning);
    }

    if report.dry_run || show_diff {
        for change in &report.changes {
            display_change(change);
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} files changed", format!("{}", report.changes.len()).green());
    println!(
        "  {} components generated",
        format!("{}", report.generated.len()).green()
    );
    println!("  {} files patched", format!("{}", report.patched.len()).green());
    println!("  {} components removed", format!("{}", report.removed.len()).red());
    println!("  {} warnings", format!("{}", report.warnings.len()).yellow());
}
