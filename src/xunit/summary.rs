use crate::Result;
use crate::error::MultisuiteError;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs;
use std::path::Path;

/// 单个 xunit 报告的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XunitSummary {
    pub total: usize,
    pub errors: usize,
    pub failures: usize,
    pub skipped: usize,
    /// `total - errors - failures`，跳过的用例算作成功
    pub successful: usize,
    pub is_successful: bool,
}

impl XunitSummary {
    fn from_counts(total: usize, errors: usize, failures: usize, skipped: usize) -> Self {
        Self {
            total,
            errors,
            failures,
            skipped,
            successful: total.saturating_sub(errors + failures),
            is_successful: errors == 0 && failures == 0,
        }
    }
}

#[derive(Default)]
struct CaseState {
    error: bool,
    failure: bool,
    skipped: bool,
}

#[derive(Default)]
struct Tally {
    total: usize,
    errors: usize,
    failures: usize,
    skipped: usize,
}

impl Tally {
    fn close(&mut self, case: CaseState) {
        self.total += 1;
        if case.error {
            self.errors += 1;
        } else if case.failure {
            self.failures += 1;
        } else if case.skipped {
            self.skipped += 1;
        }
    }
}

/// 统计 `path` 处的报告
pub fn summarize(path: &Path) -> Result<XunitSummary> {
    let content =
        fs::read_to_string(path).map_err(|e| MultisuiteError::from_artifact_io(e, path))?;
    summarize_str(&content)
}

/// 统计 xunit 文档
///
/// 计数来自 `<testcase>` 元素本身，而不是 suite 上的属性
pub fn summarize_str(xml: &str) -> Result<XunitSummary> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut tally = Tally::default();
    let mut case: Option<CaseState> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"testcase" => case = Some(CaseState::default()),
                other => mark(&mut case, other),
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"testcase" => tally.close(CaseState::default()),
                other => mark(&mut case, other),
            },
            Event::End(e) => {
                if e.local_name().as_ref() == b"testcase"
                    && let Some(done) = case.take()
                {
                    tally.close(done);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(XunitSummary::from_counts(
        tally.total,
        tally.errors,
        tally.failures,
        tally.skipped,
    ))
}

fn mark(case: &mut Option<CaseState>, name: &[u8]) {
    let Some(case) = case.as_mut() else {
        return;
    };
    match name {
        b"error" => case.error = true,
        b"failure" => case.failure = true,
        b"skipped" => case.skipped = true,
        _ => {}
    }
}
