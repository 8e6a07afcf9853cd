use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

use codesnap::cfg::{self, Config, CONFIG_FILE_NAME};
use codesnap::error::PrerequisiteError;
use codesnap::extensions::CodeCli;
use codesnap::platform::{PlatformProfile, SystemInfo};
use codesnap::snapshots::{self, Snapshot, SnapshotContents, SnapshotStore, Workspace};
use codesnap::ui;

/// Codesnap - snapshot and restore your VS Code settings, keybindings, snippets and extensions
#[derive(Parser)]
#[command(name = "codesnap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root holding Configs/ (defaults to the parent of the binary's directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Path to config file (defaults to <root>/codesnap.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Do not open the result in the file browser
    #[arg(long, global = true)]
    no_open: bool,

    /// Without a subcommand, asks which mode to run
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect VS Code config into Configs/<timestamp>/
    Collect,

    /// Sync the latest snapshot into the VS Code user directory
    Sync,

    /// List snapshots
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show platform, editor and storage information
    Info,
}

fn main() {
    let cli = Cli::parse();
    ui::init(cli.verbose);

    if let Err(e) = run(cli) {
        ui::error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
}

/// Settings resolved once per run and shared by every command.
struct RunContext {
    config: Config,
    profile: PlatformProfile,
    store: SnapshotStore,
    open_after: bool,
}

fn run(cli: Cli) -> Result<()> {
    let root = match cli.root {
        Some(root) => root,
        None => project_root()?,
    };
    let config_path = cli.config.unwrap_or_else(|| root.join(CONFIG_FILE_NAME));
    let config = cfg::load_or_default(&config_path)?;

    let profile = PlatformProfile::detect()?.with_overrides(&config);
    let store = SnapshotStore::new(config.configs_dir(&root));
    let open_after = config.general.open_after && !cli.no_open;

    let ctx = RunContext {
        config,
        profile,
        store,
        open_after,
    };

    match cli.command {
        None => cmd_interactive(&ctx),
        Some(Commands::Collect) => {
            let (code, _) = check_prerequisites(&ctx)?;
            cmd_collect(&ctx, &code)
        }
        Some(Commands::Sync) => {
            let (code, _) = check_prerequisites(&ctx)?;
            cmd_sync(&ctx, &code)
        }
        Some(Commands::List { json }) => cmd_list(&ctx, json),
        Some(Commands::Info) => cmd_info(&ctx),
    }
}

/// Parent of the directory holding the binary, so a `Tools/codesnap`
/// layout keeps `Configs/` next to `Tools/`.
fn project_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    let exe_dir = exe
        .parent()
        .context("Executable path has no parent directory")?;
    Ok(exe_dir.parent().unwrap_or(exe_dir).to_path_buf())
}

/// The editor CLI must answer `--version` and the user directory must exist.
fn check_prerequisites(ctx: &RunContext) -> Result<(CodeCli, String)> {
    let code = CodeCli::resolve(&ctx.profile, &ctx.config);
    let version = code
        .version()
        .ok_or_else(|| PrerequisiteError::CliUnavailable(code.program().to_string()))?;

    if !ctx.profile.user_dir.is_dir() {
        return Err(PrerequisiteError::UserDirMissing(ctx.profile.user_dir.clone()).into());
    }

    Ok((code, version))
}

fn workspace<'a>(ctx: &'a RunContext, code: &'a CodeCli) -> Workspace<'a> {
    Workspace {
        profile: &ctx.profile,
        store: &ctx.store,
        manager: code,
        tracked: &ctx.config.tracked,
        open_after: ctx.open_after,
    }
}

fn cmd_interactive(ctx: &RunContext) -> Result<()> {
    for line in SystemInfo::gather(ctx.profile.kind).lines() {
        ui::info(&line);
    }

    let (code, version) = match check_prerequisites(ctx) {
        Ok(found) => found,
        Err(e) => {
            ui::error(&format!("{:#}", e));
            return Ok(());
        }
    };
    ui::info(&format!("VS Code Version: {}", version));

    ui::section("Select mode:");
    println!("  1 - Collect VS Code config → Configs/<timestamp>/");
    println!("  2 - Sync latest snapshot → VS Code user dir");
    let choice = ui::prompt_line("Enter number and press Enter:")?;

    match choice.as_str() {
        "1" => cmd_collect(ctx, &code),
        "2" => cmd_sync(ctx, &code),
        _ => {
            ui::warn("Invalid selection. Exit.");
            Ok(())
        }
    }
}

fn cmd_collect(ctx: &RunContext, code: &CodeCli) -> Result<()> {
    let report = snapshots::collect(&workspace(ctx, code), Local::now().naive_local())?;
    let copied = report.files.iter().filter(|f| f.is_copied()).count();
    ui::detail(&format!("{} entries copied into {}", copied, report.snapshot.name));
    Ok(())
}

fn cmd_sync(ctx: &RunContext, code: &CodeCli) -> Result<()> {
    let report = snapshots::restore(&workspace(ctx, code))?;
    if report.snapshot.is_none() {
        ui::hint("Run 'codesnap collect' to take a snapshot first");
    }
    Ok(())
}

#[derive(Serialize)]
struct SnapshotSummary<'a> {
    name: &'a str,
    path: &'a Path,
    created_at: Option<NaiveDateTime>,
    contents: SnapshotContents,
}

fn describe(contents: &SnapshotContents) -> String {
    let mut parts = Vec::new();
    if contents.settings {
        parts.push("settings".to_string());
    }
    if contents.keybindings {
        parts.push("keybindings".to_string());
    }
    if contents.snippet_files > 0 {
        parts.push(format!("{} snippets", contents.snippet_files));
    }
    if let Some(count) = contents.extensions {
        parts.push(format!("{} extensions", count));
    }
    if parts.is_empty() {
        "(empty)".to_string()
    } else {
        parts.join(", ")
    }
}

fn cmd_list(ctx: &RunContext, json: bool) -> Result<()> {
    let snaps: Vec<Snapshot> = ctx.store.list()?;
    let summaries: Vec<SnapshotSummary> = snaps
        .iter()
        .map(|s| SnapshotSummary {
            name: &s.name,
            path: &s.path,
            created_at: s.created_at(),
            contents: s.contents(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        ui::info(&format!("No snapshots found in {}", ctx.store.root().display()));
        return Ok(());
    }

    ui::section(&format!("Snapshots in {}:", ctx.store.root().display()));
    let rows = summaries
        .iter()
        .map(|s| {
            vec![
                s.name.to_string(),
                s.contents.file_count.to_string(),
                humansize::format_size(s.contents.size_bytes, humansize::BINARY),
                describe(&s.contents),
            ]
        })
        .collect();
    ui::print_table(&["Snapshot", "Files", "Size", "Contents"], rows);

    ui::info(&format!("Found {} snapshots", summaries.len()));
    Ok(())
}

fn cmd_info(ctx: &RunContext) -> Result<()> {
    ui::section("System");
    for line in SystemInfo::gather(ctx.profile.kind).lines() {
        println!("  {}", line);
    }

    ui::section("Editor");
    let user_dir_state = if ctx.profile.user_dir.is_dir() {
        "found".green()
    } else {
        "missing".red()
    };
    println!(
        "  User directory: {} ({})",
        ctx.profile.user_dir.display(),
        user_dir_state
    );
    let code = CodeCli::resolve(&ctx.profile, &ctx.config);
    match code.version() {
        Some(version) => println!("  CLI: {} ({})", code.program(), version),
        None => println!("  CLI: {} ({})", code.program(), "not available".red()),
    }
    println!("  Shell: {}", ctx.profile.shell.program());

    ui::section("Storage");
    println!("  Configs: {}", ctx.store.root().display());
    println!("  Snapshots: {}", ctx.store.list()?.len());

    Ok(())
}
