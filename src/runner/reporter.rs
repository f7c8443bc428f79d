use crate::runner::types::Run;
use crate::xunit::XunitSummary;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, Table};
use std::io::{self, Write};

/// 诊断输出（状态块、测试报告、汇总表）
///
/// 输出目标和着色开关由调用方传入，不依赖全局终端状态
pub struct Reporter {
    out: Box<dyn Write>,
    color: bool,
}

impl Reporter {
    pub fn new(out: Box<dyn Write>, color: bool) -> Self {
        Self { out, color }
    }

    /// 输出到 stderr
    pub fn stderr(color: bool) -> Self {
        Self::new(Box::new(io::stderr()), color)
    }

    /// `\n---\n<status>[: message]\n\n\n`
    pub fn status(&mut self, status: &str, message: Option<&str>) {
        let status = if self.color {
            status.bold().blue().to_string()
        } else {
            status.to_string()
        };
        let message = match message {
            Some(m) if !m.is_empty() => format!(": {}", m),
            _ => String::new(),
        };

        // 诊断输出失败时不中断测试流程
        if let Err(e) = write!(self.out, "\n---\n{}{}\n\n\n", status, message) {
            tracing::warn!(error = %e, "Failed to write status");
        }
    }

    /// 打印单个测试报告，可附带产生它的命令
    pub fn suite_report(&mut self, name: &str, summary: &XunitSummary, command: Option<&str>) {
        let command = command.map(|c| format!("{}\n", c)).unwrap_or_default();

        let result_line = if summary.is_successful {
            "     result: SUCCESS"
        } else {
            "     result: FAILURE"
        };
        let result_line = match (self.color, summary.is_successful) {
            (true, true) => result_line.green().to_string(),
            (true, false) => result_line.red().to_string(),
            (false, _) => result_line.to_string(),
        };

        let message = [
            String::new(),
            command,
            result_line,
            format!("total tests: {}", summary.total),
            format!(" successful: {}", summary.successful),
            format!("   failures: {}", summary.failures),
            format!("     errors: {}", summary.errors),
        ]
        .join("\n");

        self.status(name, Some(&message));
    }

    /// 打印每次运行的汇总表
    pub fn overview(&mut self, rows: &[(&Run, &XunitSummary)]) {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Command", "Exit", "Tests", "Failures", "Errors", "Result"]);
        // comfy-table 只检测 stdout，这里按 stderr 的判断强制开关
        if self.color {
            table.enforce_styling();
        } else {
            table.force_no_tty();
        }

        for (run, summary) in rows {
            let exit = run
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            let ok = run.succeeded() && summary.is_successful;
            let (label, color) = if ok {
                ("SUCCESS", Color::Green)
            } else {
                ("FAILURE", Color::Red)
            };

            table.add_row(vec![
                Cell::new(&run.command).add_attribute(Attribute::Dim),
                Cell::new(exit),
                Cell::new(summary.total),
                Cell::new(summary.failures),
                Cell::new(summary.errors),
                Cell::new(label).fg(color),
            ]);
        }

        if let Err(e) = writeln!(self.out, "{}", table) {
            tracing::warn!(error = %e, "Failed to write overview");
        }
    }
}
