use crate::Result;
use crate::error::MultisuiteError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::path::Path;

/// `<testsuite>` 元素上的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteCounts {
    pub tests: u64,
    pub errors: u64,
    pub failures: u64,
    pub skipped: u64,
}

impl SuiteCounts {
    fn add(&mut self, other: SuiteCounts) {
        self.tests += other.tests;
        self.errors += other.errors;
        self.failures += other.failures;
        self.skipped += other.skipped;
    }

    fn from_element(e: &BytesStart<'_>) -> Result<Self> {
        let mut counts = SuiteCounts::default();
        for attr in e.attributes() {
            let attr = attr?;
            let slot = match attr.key.local_name().as_ref() {
                b"tests" => &mut counts.tests,
                b"errors" => &mut counts.errors,
                b"failures" => &mut counts.failures,
                b"skip" | b"skipped" => &mut counts.skipped,
                _ => continue,
            };
            let raw = String::from_utf8_lossy(&attr.value);
            match raw.trim().parse::<u64>() {
                Ok(n) => *slot += n,
                Err(_) => tracing::warn!(value = %raw, "Ignoring non-numeric suite count"),
            }
        }
        Ok(counts)
    }
}

/// 一个文档中所有顶层 suite 的子节点及计数
struct SuiteBody {
    counts: SuiteCounts,
    events: Vec<Event<'static>>,
}

fn read_suites(xml: &str) -> Result<SuiteBody> {
    let mut reader = Reader::from_str(xml);
    let mut body = SuiteBody {
        counts: SuiteCounts::default(),
        events: Vec::new(),
    };
    // 0: 不在 suite 内，1: 顶层 suite 内，>1: 嵌套 suite
    let mut depth = 0usize;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => continue,
            Event::Start(e) if e.local_name().as_ref() == b"testsuite" => {
                depth += 1;
                if depth == 1 {
                    body.counts.add(SuiteCounts::from_element(e)?);
                    continue;
                }
            }
            Event::Empty(e) if depth == 0 && e.local_name().as_ref() == b"testsuite" => {
                body.counts.add(SuiteCounts::from_element(e)?);
                continue;
            }
            Event::End(e) if e.local_name().as_ref() == b"testsuite" => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    continue;
                }
            }
            _ => {}
        }

        if depth > 0 {
            body.events.push(event.into_owned());
        }
    }

    Ok(body)
}

/// 把多个 xunit 报告合并为一个 `<testsuite name="merged">`
///
/// 计数相加，测试用例等子节点保持输入顺序；没有输入时生成空 suite
pub fn merge<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<SuiteCounts> {
    let mut total = SuiteCounts::default();
    let mut events = Vec::new();

    for input in inputs {
        let path = input.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| MultisuiteError::from_artifact_io(e, path))?;
        let body = read_suites(&content)?;
        total.add(body.counts);
        events.extend(body.events);
    }

    // 写出合并后的文档
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("testsuite");
    root.push_attribute(("name", "merged"));
    root.push_attribute(("tests", total.tests.to_string().as_str()));
    root.push_attribute(("errors", total.errors.to_string().as_str()));
    root.push_attribute(("failures", total.failures.to_string().as_str()));
    root.push_attribute(("skip", total.skipped.to_string().as_str()));

    if events.is_empty() {
        writer.write_event(Event::Empty(root))?;
    } else {
        writer.write_event(Event::Start(root))?;
        for event in events {
            writer.write_event(event)?;
        }
        writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    }

    fs::write(output, writer.into_inner())?;
    tracing::debug!(
        output = %output.display(),
        inputs = inputs.len(),
        tests = total.tests,
        "Merged xunit reports"
    );

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xunit::summarize;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, xml: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, xml).unwrap();
        path
    }

    #[test]
    fn test_merge_two_suites() {
        let dir = TempDir::new().unwrap();
        let a = write(
            dir.path(),
            "a.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite name="nosetests" tests="2" errors="0" failures="1" skip="0"><testcase name="a1"/><testcase name="a2"><failure message="x &amp; y">boom</failure></testcase></testsuite>"#,
        );
        let b = write(
            dir.path(),
            "b.xml",
            r#"<testsuite name="nosetests" tests="1" errors="1" failures="0" skip="0"><testcase name="b1"><error/></testcase></testsuite>"#,
        );
        let out = dir.path().join("nosetests.xml");

        let counts = merge(&[&a, &b], &out).unwrap();
        assert_eq!(
            counts,
            SuiteCounts {
                tests: 3,
                errors: 1,
                failures: 1,
                skipped: 0,
            }
        );

        let merged = fs::read_to_string(&out).unwrap();
        assert!(merged.contains(r#"<testsuite name="merged" tests="3" errors="1" failures="1" skip="0">"#));
        assert!(merged.contains("x &amp; y"));
        let first = merged.find("a1").unwrap();
        let second = merged.find("b1").unwrap();
        assert!(first < second);

        let summary = summarize(&out).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.failures, 1);
    }

    #[test]
    fn test_merge_single_preserves_cases() {
        let dir = TempDir::new().unwrap();
        let a = write(
            dir.path(),
            "a.xml",
            r#"<testsuite tests="2" errors="0" failures="0" skip="1"><testcase name="x"/><testcase name="y"><skipped/></testcase></testsuite>"#,
        );
        let out = dir.path().join("merged.xml");

        merge(&[&a], &out).unwrap();

        assert_eq!(summarize(&a).unwrap(), summarize(&out).unwrap());
    }

    #[test]
    fn test_merge_testsuites_root() {
        let dir = TempDir::new().unwrap();
        let a = write(
            dir.path(),
            "a.xml",
            r#"<testsuites><testsuite tests="1"><testcase name="a"/></testsuite><testsuite tests="1" skipped="1"><testcase name="b"><skipped/></testcase></testsuite></testsuites>"#,
        );
        let out = dir.path().join("merged.xml");

        let counts = merge(&[&a], &out).unwrap();
        assert_eq!(counts.tests, 2);
        assert_eq!(counts.skipped, 1);
        assert_eq!(summarize(&out).unwrap().total, 2);
    }

    #[test]
    fn test_merge_no_inputs() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nosetests.xml");
        let inputs: [&Path; 0] = [];

        let counts = merge(&inputs, &out).unwrap();
        assert_eq!(counts, SuiteCounts::default());

        let summary = summarize(&out).unwrap();
        assert_eq!(summary.total, 0);
        assert!(summary.is_successful);
    }

    #[test]
    fn test_merge_missing_input() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nosetests.xml");
        let err = merge(&[dir.path().join("gone.xml")], &out).unwrap_err();
        assert!(matches!(err, MultisuiteError::ArtifactMissing { .. }));
    }
}
