// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dashwright::{
    config::UserConfig,
    path::{default_template_dir, expand_path, DEFAULT_CONFIG_FILE},
    reconcile::{Reconciler, SynthesisReport},
    remote::{clone_template, BranchTarget},
    setup::{run_setup, save_env_file},
    stack::{run_stack, StackAction},
    template::{scaffold, TemplateSource},
    write::AtomicFile,
};

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::ProgressBar;
use inquire::Confirm;
use std::{path::PathBuf, process::exit};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit status of `check` when artifacts drifted.
const DRIFT_STATUS: i32 = 2;

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "dashwright [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<i32> {
        match self.command {
            Command::Setup(opts) => run_setup_command(opts),
            Command::Clone(opts) => run_clone(opts),
            Command::Scaffold(opts) => run_scaffold(opts),
            Command::Generate(opts) => run_generate(opts),
            Command::Check(opts) => run_check(opts),
            Command::Up(opts) => run_stack_command(StackAction::Up, opts),
            Command::Down(opts) => run_stack_command(StackAction::Down, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Interactively create configuration file.
    #[command(override_usage = "dashwright setup [options]")]
    Setup(SetupOptions),

    /// Clone template repository.
    #[command(override_usage = "dashwright clone [options] <url>")]
    Clone(CloneOptions),

    /// Write builtin templates into directory for customization.
    #[command(override_usage = "dashwright scaffold [options] [<dir>]")]
    Scaffold(ScaffoldOptions),

    /// Generate provisioning files from configuration.
    #[command(override_usage = "dashwright generate [options]")]
    Generate(GenerateOptions),

    /// Report provisioning files that differ from configuration.
    #[command(override_usage = "dashwright check [options]")]
    Check(GenerateOptions),

    /// Start dashboard stack.
    #[command(override_usage = "dashwright up [options]")]
    Up(StackOptions),

    /// Stop dashboard stack.
    #[command(override_usage = "dashwright down [options]")]
    Down(StackOptions),
}

#[derive(Args, Clone, Debug)]
struct ConfigOptions {
    /// Path to env-style or TOML configuration file.
    #[arg(short, long, value_name = "path", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,
}

#[derive(Args, Clone, Debug)]
struct SourceOptions {
    /// Template directory to generate from.
    #[arg(short, long, value_name = "dir", group = "source")]
    pub templates: Option<String>,

    /// Generate from builtin templates.
    #[arg(long, group = "source")]
    pub builtin: bool,

    /// Destination directory of provisioning files.
    #[arg(short, long, value_name = "dir", default_value = ".")]
    pub dest: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct SetupOptions {
    #[command(flatten)]
    pub config: ConfigOptions,

    #[command(flatten)]
    pub source: SourceOptions,

    /// Generate provisioning files right after setup without asking.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CloneOptions {
    /// URL of template repository.
    #[arg(required = true, value_name = "url")]
    pub url: String,

    /// Select branch to checkout.
    #[arg(short, long, value_name = "branch")]
    pub branch: Option<String>,

    /// Directory to clone into instead of the default template directory.
    #[arg(short, long, value_name = "dir")]
    pub into: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ScaffoldOptions {
    /// Directory to write templates into.
    #[arg(value_name = "dir")]
    pub dir: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct GenerateOptions {
    #[command(flatten)]
    pub config: ConfigOptions,

    #[command(flatten)]
    pub source: SourceOptions,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct StackOptions {
    #[command(flatten)]
    pub config: ConfigOptions,

    /// Directory holding provisioning files and compose stack.
    #[arg(short, long, value_name = "dir", default_value = ".")]
    pub dest: String,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    match Cli::parse().run() {
        Ok(status) => exit(status),
        Err(error) => {
            error!("{error:?}");
            exit(1);
        }
    }
}

fn run_setup_command(opts: SetupOptions) -> Result<i32> {
    let path = expand_path(&opts.config.config)?;
    let current = UserConfig::load(&path)?;
    let (config, mode) = run_setup(&current)?;
    save_env_file(&AtomicFile, &path, &config, mode)?;

    let generate = opts.yes
        || Confirm::new("Generate provisioning files now?")
            .with_default(true)
            .prompt()?;
    if !generate {
        info!("run `dashwright generate` when ready");
        return Ok(0);
    }

    let report = Reconciler::new(AtomicFile).reconcile(
        &config,
        &template_source(&opts.source)?,
        expand_path(&opts.source.dest)?,
    );
    Ok(finish(&report))
}

fn run_clone(opts: CloneOptions) -> Result<i32> {
    let path = match opts.into {
        Some(dir) => expand_path(dir)?,
        None => default_template_dir()?,
    };
    clone_template(
        &opts.url,
        &path,
        &BranchTarget::from(opts.branch),
        ProgressBar::no_length(),
    )?;
    info!("templates cloned into {:?}", path.display());

    Ok(0)
}

fn run_scaffold(opts: ScaffoldOptions) -> Result<i32> {
    let dir = match opts.dir {
        Some(dir) => expand_path(dir)?,
        None => default_template_dir()?,
    };
    let summary = scaffold(&AtomicFile, &dir);
    if !summary.is_success() {
        bail!("failed to scaffold templates into {:?}", dir.display());
    }

    Ok(0)
}

fn run_generate(opts: GenerateOptions) -> Result<i32> {
    let config = UserConfig::load(expand_path(&opts.config.config)?)?;
    let report = Reconciler::new(AtomicFile).reconcile(
        &config,
        &template_source(&opts.source)?,
        expand_path(&opts.source.dest)?,
    );

    Ok(finish(&report))
}

fn run_check(opts: GenerateOptions) -> Result<i32> {
    let config = UserConfig::load(expand_path(&opts.config.config)?)?;
    let report = Reconciler::new(AtomicFile).check(
        &config,
        &template_source(&opts.source)?,
        expand_path(&opts.source.dest)?,
    );

    let status = finish(&report);
    if status == 0 && report.has_drift() {
        warn!("provisioning files drifted, run `dashwright generate`");
        return Ok(DRIFT_STATUS);
    }

    Ok(status)
}

fn run_stack_command(action: StackAction, opts: StackOptions) -> Result<i32> {
    let env_file = expand_path(&opts.config.config)?;
    let env_file = env_file.exists().then_some(env_file);
    run_stack(action, expand_path(&opts.dest)?, env_file.as_deref())?;

    Ok(0)
}

/// Resolve template source from options.
///
/// Falls back to the cloned template directory if one exists, else to the
/// builtin templates.
fn template_source(opts: &SourceOptions) -> Result<TemplateSource> {
    if opts.builtin {
        return Ok(TemplateSource::Builtin);
    }

    if let Some(dir) = &opts.templates {
        return Ok(TemplateSource::Dir(expand_path(dir)?));
    }

    let default_dir: PathBuf = default_template_dir()?;
    if default_dir.is_dir() {
        Ok(TemplateSource::Dir(default_dir))
    } else {
        Ok(TemplateSource::Builtin)
    }
}

/// Print report and pick exit status.
fn finish(report: &SynthesisReport) -> i32 {
    print!("{report}");
    if report.is_success() {
        0
    } else {
        1
    }
}
