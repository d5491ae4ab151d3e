//! `health` — the CLI dispatcher (§6, C10). A thin shell around
//! [`repohealth_engine`]: parses flags with `clap`, wires them into
//! [`config::Config`] overrides, drives the [`engine::Engine`], and maps
//! the result to a process exit code via [`reporter::exit_code`].
//!
//! Grounded on `5dlabs-cto/cli`'s `clap` derive style and its use of
//! `colored` for status output (here delegated to [`reporter`]).
//!
//! The `clone`/`rm`/`run`/`pr`/`init` subcommands are out of scope per
//! spec §1 ("a trivial shell around the engine") but are implemented here
//! as thin wrappers over [`collaborators`] so the binary is a complete,
//! runnable surface rather than a library with no entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use repohealth_engine::{collaborators, config::Config, engine, reporter};

/// Multi-repository operations tool: bulk clone/run/pr plus a health
/// orchestration engine (git, dependency, security, documentation, CI,
/// and complexity checks) across a declarative repository inventory.
#[derive(Parser)]
#[command(name = "health", version, about)]
struct Cli {
    /// Path to the repository inventory YAML (spec §6 `config.yaml`).
    #[arg(long, global = true, default_value = "config.yaml")]
    inventory: PathBuf,

    /// Path to the optional health configuration overlay (spec §4.6).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Comma-separated category filter (spec §4.6 stage 3).
    #[arg(long, global = true, value_delimiter = ',')]
    category: Vec<String>,

    /// Run checkers with inner-repository parallelism where configured.
    #[arg(long, global = true)]
    parallel: bool,

    /// Global run timeout in seconds (spec §4.7).
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Print per-check metrics and warnings in addition to issues.
    #[arg(long, global = true)]
    verbose: bool,

    /// Load the inventory and print what would run without executing checkers.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print the registered checker categories and exit.
    #[arg(long, global = true)]
    list_categories: bool,

    /// Override every language's complexity threshold (spec §9 Open Question 2).
    #[arg(long, global = true)]
    max_complexity: Option<u32>,

    /// Render the report as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run only the cyclomatic-complexity checker, optionally filtered by tag.
    CyclomaticComplexity {
        #[arg(long)]
        max_complexity: Option<u32>,
        #[arg(long)]
        tag: Vec<String>,
    },
    /// Write a built-in-defaults config file to disk.
    Genconfig {
        #[arg(long, default_value = "health.yaml")]
        output: PathBuf,
        #[arg(long)]
        overwrite: bool,
    },
    /// Clone every inventoried repository locally.
    Clone,
    /// Remove every inventoried repository's local clone.
    Rm,
    /// Run an arbitrary shell command in every inventoried repository.
    Run {
        command: String,
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,
    },
    /// Open a pull request in every inventoried repository with local changes.
    Pr {
        #[arg(long, default_value = "health/automated-change")]
        branch: String,
        #[arg(long, default_value = "automated change")]
        message: String,
        #[arg(long, default_value = "Automated change")]
        title: String,
        #[arg(long)]
        token: Option<String>,
    },
    /// Write a starter inventory file to disk.
    Init {
        #[arg(long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(3)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if cli.list_categories {
        let registry = repohealth_engine::checker_registry::CheckerRegistry::with_builtins();
        let mut categories: Vec<&str> = registry.all().iter().map(|c| c.category()).collect();
        categories.sort_unstable();
        categories.dedup();
        for category in categories {
            println!("{category}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    match cli.command {
        Some(Commands::Genconfig { output, overwrite }) => return genconfig(&output, overwrite),
        Some(Commands::Init { output }) => return init_inventory(&output),
        Some(Commands::Clone) => return clone_all(&cli.inventory),
        Some(Commands::Rm) => return rm_all(&cli.inventory),
        Some(Commands::Run { command, log_dir }) => return run_shell(&cli.inventory, &command, &log_dir),
        Some(Commands::Pr { branch, message, title, token }) => {
            return open_prs(&cli.inventory, &branch, &message, &title, token)
        }
        Some(Commands::CyclomaticComplexity { max_complexity, tag }) => {
            return run_health(&cli, Some(vec!["quality".to_owned()]), max_complexity.or(cli.max_complexity), &tag)
        }
        None => {}
    }

    run_health(&cli, None, cli.max_complexity, &[])
}

fn run_health(
    cli: &Cli,
    forced_category: Option<Vec<String>>,
    max_complexity: Option<u32>,
    tags: &[String],
) -> anyhow::Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("configuration-invalid: {e}"))?;

    let category_filter = forced_category.unwrap_or_else(|| cli.category.clone());
    config.apply_category_filter(&category_filter);
    config.apply_max_complexity_override(max_complexity);

    let inventory = collaborators::Inventory::load(&cli.inventory)
        .map_err(|e| anyhow::anyhow!("configuration-invalid: {e}"))?;
    let repositories = inventory.filtered_by_tags(tags);

    if cli.dry_run {
        for repository in &repositories {
            println!("{} -> {}", repository.name, repository.resolved_path());
        }
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(secs) = cli.timeout {
        config.engine.timeout = Some(std::time::Duration::from_secs(secs));
    }
    if cli.parallel {
        for checker_config in config.checkers.values_mut() {
            checker_config
                .options
                .entry("innerParallel".to_owned())
                .or_insert(serde_json::json!(true));
        }
    }

    let engine = engine::Engine::new(&config);
    let handle = engine::RunHandle::new();
    let report = engine.execute(&config, &repositories, &handle);

    if cli.json {
        println!("{}", reporter::render_json(&report)?);
    } else {
        println!("{}", reporter::render_text(&report, cli.verbose));
    }

    Ok(ExitCode::from(reporter::exit_code(&report) as u8))
}

fn genconfig(output: &PathBuf, overwrite: bool) -> anyhow::Result<ExitCode> {
    if output.exists() && !overwrite {
        anyhow::bail!("'{}' already exists; pass --overwrite to replace it", output.display());
    }
    let defaults = Config::defaults();
    let rendered = render_default_overlay(&defaults);
    std::fs::write(output, rendered)?;
    println!("wrote {}", output.display());
    Ok(ExitCode::SUCCESS)
}

/// Render [`Config::defaults`] as a YAML overlay matching spec §6's
/// schema, so `genconfig` output fed back as `--config` reproduces the
/// built-in default behavior (spec §8 property 6).
fn render_default_overlay(config: &Config) -> String {
    let mut ids: Vec<&String> = config.checkers.keys().collect();
    ids.sort();
    let mut out = String::from("engine:\n");
    out.push_str(&format!("  maxConcurrency: {}\n", config.engine.max_concurrency));
    out.push_str(&format!("  cacheEnabled: {}\n", config.engine.cache_enabled));
    out.push_str(&format!("  cacheTTL: {}\n", config.engine.cache_ttl.as_secs()));
    out.push_str("checkers:\n");
    for id in ids {
        let checker = &config.checkers[id];
        out.push_str(&format!("  {id}:\n"));
        out.push_str(&format!("    enabled: {}\n", checker.enabled));
        out.push_str(&format!("    severity: {}\n", checker.severity));
        out.push_str(&format!("    timeout: {}\n", checker.timeout.as_secs()));
    }
    out
}

fn init_inventory(output: &PathBuf) -> anyhow::Result<ExitCode> {
    if output.exists() {
        anyhow::bail!("'{}' already exists", output.display());
    }
    std::fs::write(
        output,
        "repositories:\n  - name: example\n    url: https://github.com/example/example.git\n    tags: []\n",
    )?;
    println!("wrote {}", output.display());
    Ok(ExitCode::SUCCESS)
}

fn clone_all(inventory_path: &PathBuf) -> anyhow::Result<ExitCode> {
    let inventory = collaborators::Inventory::load(inventory_path)?;
    for repository in inventory.filtered_by_tags(&[]) {
        let status = std::process::Command::new("git")
            .args(["clone", &repository.url, &repository.resolved_path()])
            .args(repository.branch.as_deref().map(|b| ["--branch", b]).into_iter().flatten())
            .status();
        match status {
            Ok(s) if s.success() => println!("{}: cloned", repository.name),
            Ok(s) => println!("{}: git clone exited with {s}", repository.name),
            Err(e) => println!("{}: failed to run git: {e}", repository.name),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn rm_all(inventory_path: &PathBuf) -> anyhow::Result<ExitCode> {
    let inventory = collaborators::Inventory::load(inventory_path)?;
    for repository in inventory.filtered_by_tags(&[]) {
        let path = repository.resolved_path();
        match std::fs::remove_dir_all(&path) {
            Ok(()) => println!("{}: removed {path}", repository.name),
            Err(e) => println!("{}: {e}", repository.name),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_shell(inventory_path: &PathBuf, command: &str, log_dir: &PathBuf) -> anyhow::Result<ExitCode> {
    let inventory = collaborators::Inventory::load(inventory_path)?;
    let repositories = inventory.filtered_by_tags(&[]);
    let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    let outcomes = collaborators::run_in_repositories(&repositories, command, log_dir, &timestamp);
    let any_failed = outcomes.iter().any(|o| o.exit_code.map(|c| c != 0).unwrap_or(true));
    Ok(if any_failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn open_prs(
    inventory_path: &PathBuf,
    branch: &str,
    message: &str,
    title: &str,
    token: Option<String>,
) -> anyhow::Result<ExitCode> {
    let token = token.or_else(|| std::env::var("GITHUB_TOKEN").ok());
    let inventory = collaborators::Inventory::load(inventory_path)?;
    for repository in inventory.filtered_by_tags(&[]) {
        match collaborators::open_pull_request(&repository, branch, message, title, token.as_deref()) {
            Ok(collaborators::PrOutcome::Opened { url }) => println!("{}: opened {url}", repository.name),
            Ok(collaborators::PrOutcome::NoChanges) => println!("{}: no changes, skipped", repository.name),
            Err(e) => println!("{}: {e}", repository.name),
        }
    }
    Ok(ExitCode::SUCCESS)
}
