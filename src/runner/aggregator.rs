use crate::Result;
use crate::config::Settings;
use crate::runner::executor::Executor;
use crate::runner::reporter::Reporter;
use crate::runner::types::Run;
use crate::xunit::{self, XunitSummary};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

/// 汇总结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOutcome {
    /// 每次运行的报告摘要（按运行顺序）
    pub suites: Vec<XunitSummary>,
    /// 合并后报告的摘要
    pub overall: XunitSummary,
    /// 是否执行了 coverage combine
    pub combined: bool,
    /// 是否执行了 coverage report
    pub coverage_reported: bool,
}

/// 所有运行中去重后的 `--cover-package` 包名，转为 `--include` 通配模式
pub fn include_patterns(runs: &[Run], settings: &Settings) -> BTreeSet<String> {
    runs.iter()
        .flat_map(|run| run.cover_packages(settings))
        .map(|package| format!("{}*", package))
        .collect()
}

/// 生成 `coverage report --include="foo*,bar*"`；没有包过滤时不加 `--include`
pub fn coverage_report_command(runs: &[Run], settings: &Settings) -> String {
    let patterns = include_patterns(runs, settings);
    if patterns.is_empty() {
        return settings.report_command.clone();
    }

    let patterns: Vec<&str> = patterns.iter().map(String::as_str).collect();
    format!(
        "{} --include=\"{}\"",
        settings.report_command,
        patterns.join(",")
    )
}

/// 全部运行结束后合并覆盖率与 xunit 报告
pub struct Aggregator<'a> {
    executor: &'a Executor,
}

impl<'a> Aggregator<'a> {
    pub fn new(executor: &'a Executor) -> Self {
        Self { executor }
    }

    pub fn aggregate(
        &self,
        runs: &[Run],
        report_coverage: bool,
        reporter: &mut Reporter,
    ) -> Result<AggregateOutcome> {
        let settings = self.executor.settings();
        let dir = self.executor.dir();

        let mut combined = false;
        let mut coverage_reported = false;

        // 写回覆盖率数据并合并
        if runs.iter().any(|run| run.is_covered(settings)) {
            for run in runs {
                run.write_coverage(dir, settings)?;
            }

            let code = self.executor.shell(&settings.combine_command)?;
            tracing::info!(command = %settings.combine_command, exit_code = code, "Coverage combined");
            combined = true;

            if report_coverage {
                let command = coverage_report_command(runs, settings);
                let code = self.executor.shell(&command)?;
                tracing::info!(command = %command, exit_code = code, "Coverage reported");
                coverage_reported = true;
            }
        }

        // 打印每次运行的报告
        let mut suites = Vec::with_capacity(runs.len());
        for run in runs {
            let summary = xunit::summarize(&dir.join(run.report_file_name(settings)))?;
            reporter.suite_report(
                "Test suite report",
                &summary,
                Some(&run.final_command(settings)),
            );
            suites.push(summary);
        }

        // 合并 xml 报告并删除单次报告
        let report_files: Vec<PathBuf> = runs
            .iter()
            .map(|run| dir.join(run.report_file_name(settings)))
            .collect();
        let merged = dir.join(&settings.report_file);
        xunit::merge(&report_files, &merged)?;
        // 相同命令共用同一个报告文件
        let distinct: BTreeSet<&PathBuf> = report_files.iter().collect();
        for path in distinct {
            fs::remove_file(path)?;
            tracing::debug!(path = %path.display(), "Removed run report");
        }

        let overall = xunit::summarize(&merged)?;
        reporter.suite_report("Overall test suite report", &overall, None);

        Ok(AggregateOutcome {
            suites,
            overall,
            combined,
            coverage_reported,
        })
    }
}
