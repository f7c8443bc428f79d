use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MultisuiteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("expected artifact not found: {}", .path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid test commands:\n{}", .0.join("\n"))]
    Validation(Vec<String>),

    #[error("{0}")]
    Other(String),
}

// 从 anyhow::Error 转换
impl From<anyhow::Error> for MultisuiteError {
    fn from(err: anyhow::Error) -> Self {
        MultisuiteError::Other(err.to_string())
    }
}

impl From<toml::de::Error> for MultisuiteError {
    fn from(err: toml::de::Error) -> Self {
        MultisuiteError::Config(err.to_string())
    }
}

impl MultisuiteError {
    /// 预期产物不存在时映射为 `ArtifactMissing`，其他 IO 错误保持原样
    pub fn from_artifact_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            MultisuiteError::ArtifactMissing { path: path.into() }
        } else {
            MultisuiteError::Io(err)
        }
    }
}

/// multisuite 的 Result 类型
pub type Result<T> = std::result::Result<T, MultisuiteError>;
