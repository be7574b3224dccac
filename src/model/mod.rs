//! 批量推理。
//!
//! 分类器只通过 [`Classifier`] 暴露输入形状、类别数与 `predict`，具体格式
//! （bincode 全连接网络、safetensors）由各后端实现，流水线其余部分不感知。

pub mod dense;
#[cfg(feature = "candle")]
pub mod safetensors;

use std::path::Path;

use tracing::info;

use crate::error::{ModelLoadError, Result, ShapeError};
use crate::encode::Batch;

pub use dense::{Activation, DenseLayer, DenseModel, ModelMeta};

/// 已训练好的多分类器，只读。
pub trait Classifier {
    /// 单条样本的输入形状 `(L, A)`
    fn input_shape(&self) -> (usize, usize);

    /// 类别数 C
    fn num_classes(&self) -> usize;

    /// 模型文件中记录的类别顺序（若有）
    fn class_labels(&self) -> Option<&[String]> {
        None
    }

    /// `N × L × A` → `N × C`，每行为一个概率分布。
    ///
    /// 批次形状不符返回 [`ShapeError`]；后端运行时故障返回 `Inference`。
    fn predict(&self, batch: &Batch) -> Result<ProbabilityMatrix>;

    /// 校验批次形状与模型输入一致
    fn check_batch(&self, batch: &Batch) -> std::result::Result<(), ShapeError> {
        let expected = self.input_shape();
        let got = batch.item_shape();
        if expected != got || batch.data.len() != batch.n * batch.item_len() {
            return Err(ShapeError { expected, got });
        }
        Ok(())
    }
}

/// `rows × cols` 概率矩阵，行优先
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMatrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl ProbabilityMatrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { rows, cols, data }
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// 第 `i` 行最大值所在列，并列时取最小下标；NaN 不参与比较。
    pub fn argmax(&self, i: usize) -> usize {
        argmax(self.row(i))
    }
}

pub(crate) fn argmax(row: &[f32]) -> usize {
    let mut best = 0usize;
    let mut best_v = f32::NEG_INFINITY;
    for (j, &v) in row.iter().enumerate() {
        if v > best_v {
            best = j;
            best_v = v;
        }
    }
    best
}

/// 就地 softmax（减去最大值以避免溢出）
pub(crate) fn softmax_in_place(v: &mut [f32]) {
    let max = v.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for x in v.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    if sum > 0.0 {
        for x in v.iter_mut() {
            *x /= sum;
        }
    }
}

/// 按扩展名选择后端加载模型，并校验输入形状、类别数与类别顺序。
///
/// - `.safetensors`：candle 后端（需启用 `candle` feature）
/// - 其他：bincode 序列化的 [`DenseModel`]
pub fn load_model(
    path: &Path,
    input_shape: (usize, usize),
    labels: &[&str],
) -> std::result::Result<Box<dyn Classifier>, ModelLoadError> {
    if !path.exists() {
        return Err(ModelLoadError::NotFound(path.to_path_buf()));
    }

    let is_safetensors = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("safetensors"));

    let model: Box<dyn Classifier> = if is_safetensors {
        load_safetensors(path)?
    } else {
        Box::new(DenseModel::load_from_file(path)?)
    };

    if model.input_shape() != input_shape {
        return Err(ModelLoadError::incompatible(
            path,
            format!("expects input {:?}, encoder produces {:?}", model.input_shape(), input_shape),
        ));
    }
    if model.num_classes() != labels.len() {
        return Err(ModelLoadError::incompatible(
            path,
            format!("has {} output classes, label table has {}", model.num_classes(), labels.len()),
        ));
    }
    if let Some(trained) = model.class_labels() {
        if let Some(k) = (0..labels.len()).find(|&k| trained[k] != labels[k]) {
            return Err(ModelLoadError::incompatible(
                path,
                format!("class {} was trained as '{}', label table has '{}'", k, trained[k], labels[k]),
            ));
        }
    }

    info!(
        path = %path.display(),
        input = ?model.input_shape(),
        classes = model.num_classes(),
        "model loaded"
    );
    Ok(model)
}

#[cfg(feature = "candle")]
fn load_safetensors(path: &Path) -> std::result::Result<Box<dyn Classifier>, ModelLoadError> {
    Ok(Box::new(safetensors::CandleModel::load(path)?))
}

#[cfg(not(feature = "candle"))]
fn load_safetensors(path: &Path) -> std::result::Result<Box<dyn Classifier>, ModelLoadError> {
    Err(ModelLoadError::format(path, "safetensors models require the 'candle' feature"))
}
