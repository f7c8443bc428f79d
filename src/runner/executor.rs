use crate::Result;
use crate::config::Settings;
use crate::runner::reporter::Reporter;
use crate::runner::types::Run;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// 命令执行器，通过配置的 shell 逐条执行
pub struct Executor {
    dir: PathBuf,
    settings: Settings,
}

impl Executor {
    pub fn new(dir: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            dir: dir.into(),
            settings,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// 在工作目录中执行 shell 命令并返回退出码
    ///
    /// 非零退出码不算错误，只有 shell 无法启动才返回错误
    pub fn shell(&self, command: &str) -> Result<i32> {
        let status = Command::new(&self.settings.shell)
            .arg("-c")
            .arg(command)
            .current_dir(&self.dir)
            .status()?;

        Ok(exit_code(status))
    }

    /// 按顺序执行所有运行，中途失败也继续
    pub fn execute_all(&self, runs: &mut [Run], reporter: &mut Reporter) -> Result<Vec<i32>> {
        let mut codes = Vec::with_capacity(runs.len());
        for run in runs.iter_mut() {
            codes.push(self.execute(run, reporter)?);
        }
        Ok(codes)
    }

    /// 执行单次运行
    ///
    /// 如果启用了覆盖率，返回前把默认覆盖率文件读入内存并删除，
    /// 否则下一次运行的 coverage 会往里追加数据
    pub fn execute(&self, run: &mut Run, reporter: &mut Reporter) -> Result<i32> {
        let command = run.final_command(&self.settings);

        // 执行命令
        reporter.status("Running", Some(&command));
        tracing::info!(command = %command, "Starting run");

        let code = self.shell(&command)?;
        run.exit_code = Some(code);
        tracing::info!(command = %command, exit_code = code, "Run finished");

        // 取出覆盖率文件
        if run.is_covered(&self.settings) {
            run.read_coverage(&self.dir, &self.settings)?;
        }

        Ok(code)
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
