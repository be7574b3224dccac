//! 错误类型。
//!
//! 每个流水线阶段各有一类错误；未知氨基酸与表外标签不属于错误，
//! 分别退化为全零行与空注释。

use std::path::PathBuf;

/// crate 内统一的 `Result` 别名
pub type Result<T> = std::result::Result<T, ClongError>;

#[derive(Debug, thiserror::Error)]
pub enum ClongError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("cannot write predictions to '{}'", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 输入 FASTA 相关错误
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("input FASTA file '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("no sequences found in input file '{}'", .0.display())]
    Empty(PathBuf),

    #[error("cannot read input FASTA '{}'", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 模型加载错误，运行开始前即终止
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("model file '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read model '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model format in '{}': {reason}", .path.display())]
    Format { path: PathBuf, reason: String },

    #[error("model '{}' is incompatible: {reason}", .path.display())]
    Incompatible { path: PathBuf, reason: String },
}

impl ModelLoadError {
    pub fn format(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Format { path: path.into(), reason: reason.to_string() }
    }

    pub fn incompatible(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Incompatible { path: path.into(), reason: reason.to_string() }
    }
}

/// 编码器输出与模型输入的形状不一致。正常流程下不可达。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("batch shape {got:?} does not match model input shape {expected:?}")]
pub struct ShapeError {
    pub expected: (usize, usize),
    pub got: (usize, usize),
}
