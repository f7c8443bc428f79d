use std::ffi::OsStr;
use std::io::IsTerminal;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use multisuite::runner::run_batch;
use multisuite::{ConfigLoader, Executor, MultisuiteError, Reporter};

pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Run several test suites one after another, even when some fail, then
/// merge their xunit reports and coverage data into one.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Test command to run through the shell; repeat for each suite
    /// (e.g. "nosetests -sv --with-coverage --with-xunit")
    #[arg(short = 'c', long = "command", value_name = "CMD")]
    pub commands: Vec<String>,

    /// Additional test commands, run after those given with --command
    #[arg(value_name = "COMMAND")]
    pub args: Vec<String>,

    /// Config file (default: nearest multisuite.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Working directory for the runs and their reports
    #[arg(short = 'C', long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Do not print the per-run table at the end
    #[arg(long)]
    pub no_summary_table: bool,
}

impl Cli {
    /// 先是 --command 给出的命令，再是位置参数
    pub fn all_commands(&self) -> Vec<String> {
        self.commands.iter().chain(self.args.iter()).cloned().collect()
    }
}

/// 执行整批命令，返回进程退出码
pub fn run(cli: Cli) -> Result<i32> {
    let commands = cli.all_commands();
    if commands.is_empty() {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "at least one test command is required",
            )
            .exit();
    }

    let dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let settings = ConfigLoader::resolve(cli.config.as_deref(), &dir)?;

    let color = color_wanted(
        cli.no_color,
        std::io::stderr().is_terminal(),
        std::env::var_os("NO_COLOR").as_deref(),
        std::env::var_os("CLICOLOR").as_deref(),
    );
    if color {
        // colored 只检测 stdout，而诊断输出写到 stderr
        colored::control::set_override(true);
    }

    let executor = Executor::new(dir, settings);
    let mut reporter = Reporter::stderr(color);

    match run_batch(&commands, &executor, &mut reporter, !cli.no_summary_table) {
        Ok(outcome) => Ok(outcome.exit_code()),
        Err(MultisuiteError::Validation(errors)) => {
            let list: Vec<String> = errors.iter().map(|e| format!("* {}", e)).collect();
            Cli::command()
                .error(
                    ErrorKind::ValueValidation,
                    format!("\n\nErrors found in test commands:\n{}", list.join("\n")),
                )
                .exit();
        }
        Err(e) => Err(e.into()),
    }
}

/// 判断诊断输出是否着色：遵守 --no-color、NO_COLOR 和 CLICOLOR=0
fn color_wanted(
    no_color_flag: bool,
    stderr_is_tty: bool,
    no_color_env: Option<&OsStr>,
    clicolor_env: Option<&OsStr>,
) -> bool {
    let disabled_by_env =
        no_color_env.is_some_and(|v| !v.is_empty()) || clicolor_env == Some(OsStr::new("0"));

    !no_color_flag && stderr_is_tty && !disabled_by_env
}
