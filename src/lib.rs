//! # clong
//!
//! 用预训练分类器预测蛋白质序列所属的寿命相关基因类别，并附上机制、
//! 蛋白描述与报道的寿命延长幅度。
//!
//! 流程：
//!
//! - **序列读取**：FASTA 多记录文本 → 按输入顺序的序列
//! - **定长编码**：每条序列编码为 `500 × 20` one-hot 矩阵（截断 / 补零）
//! - **批量推理**：[`model::Classifier`] 输出每条序列在 29 个类别上的概率
//! - **标签与注释**：argmax 下标 → 排序后的基因符号 → 静态注释表
//! - **报告**：CSV，每条序列一行，原子写入
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use clong::catalog::GeneCatalog;
//! use clong::encode::MAX_SEQ_LENGTH;
//! use clong::model::DenseModel;
//! use clong::pipeline::predict_sequences;
//!
//! let model = DenseModel::load_from_file("clong.model".as_ref())?;
//! let catalog = GeneCatalog::builtin();
//! let results = predict_sequences(&model, catalog, &[b"MSEALKILNNIRTLRAQ"], MAX_SEQ_LENGTH)?;
//! for r in &results {
//!     println!("{} {:.3} {}", r.label, r.probability, r.info.mechanism);
//! }
//! # Ok::<(), clong::ClongError>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`io`] — FASTA 解析与 CSV 报告
//! - [`encode`] — one-hot 编码
//! - [`model`] — 分类器接口与后端
//! - [`catalog`] — 标签顺序与注释表
//! - [`pipeline`] — 端到端运行
//! - [`util`] — 氨基酸字母表

pub mod catalog;
pub mod encode;
pub mod error;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod util;

pub use error::{ClongError, InputError, ModelLoadError, Result, ShapeError};
