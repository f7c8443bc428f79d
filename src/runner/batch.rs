use crate::Result;
use crate::error::MultisuiteError;
use crate::runner::aggregator::{AggregateOutcome, Aggregator};
use crate::runner::executor::Executor;
use crate::runner::reporter::Reporter;
use crate::runner::types::Run;
use crate::runner::validator::validate_all;
use std::fs;

/// 一批命令的执行结果
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub runs: Vec<Run>,
    pub aggregate: AggregateOutcome,
}

impl BatchOutcome {
    pub fn any_failed(&self) -> bool {
        self.runs.iter().any(|run| !run.succeeded())
    }

    /// 进程退出码：任一运行失败为 1，否则为 0
    pub fn exit_code(&self) -> i32 {
        if self.any_failed() { 1 } else { 0 }
    }
}

/// 校验、执行并汇总一组命令
///
/// 只要有一条命令校验失败就不执行任何命令，
/// 收集到的错误以 `MultisuiteError::Validation` 返回。
/// 只有全部运行退出码为 0 时才打印覆盖率报告。
pub fn run_batch(
    commands: &[String],
    executor: &Executor,
    reporter: &mut Reporter,
    overview: bool,
) -> Result<BatchOutcome> {
    // 1. 全部校验
    let errors = validate_all(commands.iter().map(String::as_str), executor.settings());
    if !errors.is_empty() {
        return Err(MultisuiteError::Validation(errors));
    }

    warn_stale_coverage(executor);

    // 2. 依次执行，失败也不中断
    let mut runs: Vec<Run> = commands.iter().map(|c| Run::new(c.as_str())).collect();
    let codes = executor.execute_all(&mut runs, reporter)?;
    let any_failed = codes.iter().any(|&code| code != 0);

    reporter.status("Finished running all test suites", None);

    // 3. 汇总覆盖率与 xunit 报告
    let aggregate = Aggregator::new(executor).aggregate(&runs, !any_failed, reporter)?;

    if overview {
        let rows: Vec<_> = runs.iter().zip(aggregate.suites.iter()).collect();
        reporter.overview(&rows);
    }

    Ok(BatchOutcome { runs, aggregate })
}

/// 上一批残留的指纹覆盖率文件会被 combine 一并合并，
/// 这里只提示，不删除
fn warn_stale_coverage(executor: &Executor) {
    let prefix = format!("{}.", executor.settings().coverage_file);
    let Ok(entries) = fs::read_dir(executor.dir()) else {
        return;
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) {
            tracing::warn!(file = %name, "Stale coverage file will be included in the combined data");
        }
    }
}
