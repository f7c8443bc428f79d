use crate::Result;
use crate::config::Settings;
use crate::error::MultisuiteError;
use regex::RegexBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

/// 命令字符串的稳定指纹
///
/// xxh3 输出固定，同一命令在不同进程、机器上得到相同的文件名
pub fn fingerprint(command: &str) -> u64 {
    xxh3_64(command.as_bytes())
}

/// 一次测试命令调用及其结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// 命令行上给出的原始 shell 命令
    pub command: String,

    /// 退出码（执行后设置）
    pub exit_code: Option<i32>,

    /// 从默认覆盖率文件中取出的数据
    pub coverage_snapshot: Option<Vec<u8>>,
}

impl Run {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            exit_code: None,
            coverage_snapshot: None,
        }
    }

    pub fn fingerprint(&self) -> u64 {
        fingerprint(&self.command)
    }

    /// `.coverage.<fp>`
    pub fn coverage_file_name(&self, settings: &Settings) -> String {
        format!("{}.{}", settings.coverage_file, self.fingerprint())
    }

    /// `nosetests.<fp>.xml`
    pub fn report_file_name(&self, settings: &Settings) -> String {
        let report = Path::new(&settings.report_file);
        let stem = report
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();

        let name = match report.extension() {
            Some(ext) => format!("{}.{}.{}", stem, self.fingerprint(), ext.to_string_lossy()),
            None => format!("{}.{}", stem, self.fingerprint()),
        };
        // 保留父目录，与合并报告放在同一处
        report.with_file_name(name).to_string_lossy().into_owned()
    }

    /// 实际交给 shell 执行的命令
    pub fn final_command(&self, settings: &Settings) -> String {
        format!(
            "{} {}={}",
            self.command,
            settings.forbidden_flag,
            self.report_file_name(settings)
        )
    }

    pub fn is_covered(&self, settings: &Settings) -> bool {
        self.command.contains(&settings.coverage_flag)
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// 第一个 `--cover-package=a,b` 中列出的包名
    pub fn cover_packages(&self, settings: &Settings) -> Vec<String> {
        let pattern = format!(
            r"{}=(?P<packages>[a-z0-9_,]+)",
            regex::escape(&settings.cover_package_flag)
        );
        let re = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid cover package pattern");
                return Vec::new();
            }
        };

        re.captures(&self.command)
            .and_then(|caps| caps.name("packages"))
            .map(|m| {
                m.as_str()
                    .split(',')
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 读取默认覆盖率文件到内存并删除该文件
    pub fn read_coverage(&mut self, dir: &Path, settings: &Settings) -> Result<()> {
        let path = dir.join(&settings.coverage_file);
        let data = fs::read(&path).map_err(|e| MultisuiteError::from_artifact_io(e, &path))?;
        fs::remove_file(&path)?;

        tracing::debug!(
            command = %self.command,
            bytes = data.len(),
            "Captured coverage snapshot"
        );
        self.coverage_snapshot = Some(data);
        Ok(())
    }

    /// 把覆盖率数据写回带指纹的文件
    ///
    /// 返回写入的路径；没有数据时返回 `None`
    pub fn write_coverage(&self, dir: &Path, settings: &Settings) -> Result<Option<PathBuf>> {
        let Some(data) = &self.coverage_snapshot else {
            return Ok(None);
        };

        let path = dir.join(self.coverage_file_name(settings));
        fs::write(&path, data)?;
        tracing::debug!(path = %path.display(), "Restored coverage snapshot");
        Ok(Some(path))
    }
}

impl std::fmt::Display for Run {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CMD: &str = "nosetests foo bar rainbows";

    #[test]
    fn test_new_run_is_pristine() {
        let run = Run::new("foo");
        assert_eq!(run.command, "foo");
        assert_eq!(run.exit_code, None);
        assert_eq!(run.coverage_snapshot, None);
        assert_eq!(run.to_string(), "foo");
    }

    #[test]
    fn test_file_names_are_stable() {
        let settings = Settings::default();
        let a = Run::new(CMD);
        let b = Run::new(CMD);

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.coverage_file_name(&settings), b.coverage_file_name(&settings));
        assert_eq!(a.report_file_name(&settings), b.report_file_name(&settings));
        assert_eq!(
            a.coverage_file_name(&settings),
            format!(".coverage.{}", fingerprint(CMD))
        );
        assert_eq!(
            a.report_file_name(&settings),
            format!("nosetests.{}.xml", fingerprint(CMD))
        );
    }

    #[test]
    fn test_fingerprint_is_fixed_across_processes() {
        // 空输入的 xxh3_64 是公开的固定值
        assert_eq!(fingerprint(""), 0x2D06_8005_38D3_94C2);
    }

    #[test]
    fn test_distinct_commands_get_distinct_names() {
        let settings = Settings::default();
        let a = Run::new("nosetests a --with-xunit");
        let b = Run::new("nosetests b --with-xunit");

        assert_ne!(a.coverage_file_name(&settings), b.coverage_file_name(&settings));
        assert_ne!(a.report_file_name(&settings), b.report_file_name(&settings));
    }

    #[test]
    fn test_report_name_without_extension() {
        let settings = Settings {
            report_file: "report".to_string(),
            ..Settings::default()
        };
        let run = Run::new(CMD);
        assert_eq!(
            run.report_file_name(&settings),
            format!("report.{}", fingerprint(CMD))
        );
    }

    #[test]
    fn test_report_name_keeps_parent_dir() {
        let settings = Settings {
            report_file: "reports/junit.xml".to_string(),
            ..Settings::default()
        };
        let run = Run::new(CMD);
        let expected = Path::new("reports").join(format!("junit.{}.xml", fingerprint(CMD)));
        assert_eq!(Path::new(&run.report_file_name(&settings)), expected.as_path());
        assert_eq!(
            Path::new(&run.report_file_name(&settings)).parent(),
            Path::new(&settings.report_file).parent()
        );
    }

    #[test]
    fn test_final_command() {
        let settings = Settings::default();
        let run = Run::new(CMD);
        assert_eq!(
            run.final_command(&settings),
            format!("{} --xunit-file={}", CMD, run.report_file_name(&settings))
        );
    }

    #[test]
    fn test_is_covered() {
        let settings = Settings::default();
        assert!(!Run::new("nosetests").is_covered(&settings));
        assert!(Run::new("nosetests --with-coverage").is_covered(&settings));
    }

    #[test]
    fn test_cover_packages() {
        let settings = Settings::default();

        let run = Run::new("nosetests --with-coverage --cover-package=foo,Bar_2");
        assert_eq!(run.cover_packages(&settings), vec!["foo", "Bar_2"]);

        let run = Run::new("nosetests --COVER-PACKAGE=pkg");
        assert_eq!(run.cover_packages(&settings), vec!["pkg"]);

        let run = Run::new("nosetests --with-coverage");
        assert!(run.cover_packages(&settings).is_empty());
    }

    #[test]
    fn test_coverage_round_trip() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::default();
        let data = vec![0u8, 159, 146, 150, b'\n', 255];
        fs::write(dir.path().join(".coverage"), &data).unwrap();

        let mut run = Run::new(CMD);
        run.read_coverage(dir.path(), &settings).unwrap();

        assert!(!dir.path().join(".coverage").exists());
        assert_eq!(run.coverage_snapshot.as_deref(), Some(data.as_slice()));

        let written = run.write_coverage(dir.path(), &settings).unwrap().unwrap();
        assert_eq!(written, dir.path().join(run.coverage_file_name(&settings)));
        assert_eq!(fs::read(&written).unwrap(), data);
    }

    #[test]
    fn test_read_missing_coverage_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut run = Run::new(CMD);
        let err = run.read_coverage(dir.path(), &Settings::default()).unwrap_err();
        assert!(matches!(err, MultisuiteError::ArtifactMissing { .. }));
    }

    #[test]
    fn test_write_without_snapshot_is_noop() {
        let dir = TempDir::new().unwrap();
        let run = Run::new(CMD);
        assert_eq!(run.write_coverage(dir.path(), &Settings::default()).unwrap(), None);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
