use crate::Result;
use crate::error::MultisuiteError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// 运行配置，可从 `multisuite.toml` 加载
///
/// 所有字段的默认值对应 nosetests + coverage.py
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// 要求测试命令输出 xunit 报告的参数
    pub required_flag: String,

    /// 指定 xunit 输出文件的参数（由本工具生成，用户不能提供）
    pub forbidden_flag: String,

    /// 开启覆盖率的参数
    pub coverage_flag: String,

    /// 限定覆盖率包范围的参数（逗号分隔）
    pub cover_package_flag: String,

    /// coverage 默认写出的数据文件
    pub coverage_file: String,

    /// 合并后的 xunit 报告文件名
    pub report_file: String,

    /// 合并目录中所有 `<coverage_file>.*` 文件的命令
    pub combine_command: String,

    /// 打印覆盖率报告的命令，会追加 `--include`
    pub report_command: String,

    /// 执行命令字符串的程序，调用方式为 `<shell> -c <cmd>`
    pub shell: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            required_flag: "--with-xunit".to_string(),
            forbidden_flag: "--xunit-file".to_string(),
            coverage_flag: "--with-coverage".to_string(),
            cover_package_flag: "--cover-package".to_string(),
            coverage_file: ".coverage".to_string(),
            report_file: "nosetests.xml".to_string(),
            combine_command: "coverage combine".to_string(),
            report_command: "coverage report".to_string(),
            shell: "sh".to_string(),
        }
    }
}

/// 配置文件加载器
pub struct ConfigLoader;

impl ConfigLoader {
    const CONFIG_FILE: &'static str = "multisuite.toml";

    /// 从指定路径加载配置文件
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            MultisuiteError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Settings> {
        Ok(toml::from_str(content)?)
    }

    /// 解析本次运行使用的配置
    ///
    /// 查找顺序：
    /// 1. 显式指定的路径（出错直接返回）
    /// 2. `start_dir` 及其父目录中的 `multisuite.toml`
    /// 3. `~/.config/multisuite/multisuite.toml`
    /// 4. 内置默认值
    pub fn resolve(explicit: Option<&Path>, start_dir: &Path) -> Result<Settings> {
        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "Loading explicit config");
            return Self::load_from_path(path);
        }

        match Self::find(start_dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading discovered config");
                Self::load_from_path(&path)
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(Settings::default())
            }
        }
    }

    /// 从 `start_dir` 向上查找配置文件，找不到再查用户配置目录
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        Self::find_upwards(start_dir).or_else(Self::user_config_path)
    }

    fn find_upwards(start_dir: &Path) -> Option<PathBuf> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(Self::CONFIG_FILE);
            if config_path.is_file() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    fn user_config_path() -> Option<PathBuf> {
        let config_path = dirs::config_dir()?
            .join("multisuite")
            .join(Self::CONFIG_FILE);

        config_path.is_file().then_some(config_path)
    }
}
