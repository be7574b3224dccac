//! 端到端流程：模型检查 → 读取序列 → 编码 → 推理 → 标签与注释 → 写报告。
//!
//! 致命错误在发现它的阶段立即返回；输入或模型出错时不会写出任何报告。

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::catalog::{GeneCatalog, GeneInfo};
use crate::encode::{encode_batch, MAX_SEQ_LENGTH};
use crate::error::{ClongError, InputError, ModelLoadError, Result};
use crate::io::{fasta, report};
use crate::model::{self, Classifier};
use crate::util::protein::{self, Alphabet};

/// 默认模型文件（当前目录）
pub const DEFAULT_MODEL_PATH: &str = "clong.model";
/// 默认输出目录
pub const OUTPUT_DIR: &str = "Output";
/// 输出文件名
pub const OUTPUT_FILE: &str = "clong_predictions.csv";

/// 预测出的类别下标不在标签表中时使用的标签
pub const UNKNOWN_LABEL: &str = "Unknown";

/// 一次运行的参数
#[derive(Debug, Clone)]
pub struct PredictOpt {
    pub input: PathBuf,
    pub model: PathBuf,
    pub output_dir: PathBuf,
    pub max_len: usize,
}

impl PredictOpt {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self { input: input.into(), ..Self::default() }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(OUTPUT_FILE)
    }
}

impl Default for PredictOpt {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            model: PathBuf::from(DEFAULT_MODEL_PATH),
            output_dir: PathBuf::from(OUTPUT_DIR),
            max_len: MAX_SEQ_LENGTH,
        }
    }
}

/// 单条序列的预测结果
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub sequence: Vec<u8>,
    pub label: &'static str,
    /// argmax 位置上的原始分数，不做重新归一化
    pub probability: f32,
    pub info: GeneInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sequences: usize,
    pub output: PathBuf,
}

/// 对已读入的序列做编码、推理与注释，不涉及文件 I/O。
pub fn predict_sequences<S: AsRef<[u8]>>(
    classifier: &dyn Classifier,
    catalog: &GeneCatalog,
    sequences: &[S],
    max_len: usize,
) -> Result<Vec<PredictionResult>> {
    let alphabet = Alphabet::protein();

    let truncated = sequences.iter().filter(|s| s.as_ref().len() > max_len).count();
    if truncated > 0 {
        warn!(truncated, max_len, "sequences longer than the model input were truncated");
    }
    let unknown: usize = sequences.iter().map(|s| protein::count_unknown(s.as_ref(), &alphabet)).sum();
    if unknown > 0 {
        debug!(unknown, "residues outside the amino-acid alphabet encoded as zero rows");
    }

    let batch = encode_batch(sequences, max_len, &alphabet);
    debug!(n = batch.len(), shape = ?batch.item_shape(), "batch encoded");

    let probs = classifier.predict(&batch)?;
    if probs.rows != sequences.len() {
        return Err(ClongError::Inference(format!(
            "classifier returned {} rows for {} sequences",
            probs.rows,
            sequences.len()
        )));
    }
    if probs.cols == 0 || probs.rows.checked_mul(probs.cols) != Some(probs.data.len()) {
        return Err(ClongError::Inference(format!(
            "classifier returned {} scores for a {} x {} matrix",
            probs.data.len(),
            probs.rows,
            probs.cols
        )));
    }

    let mut results = Vec::with_capacity(sequences.len());
    for (i, seq) in sequences.iter().enumerate() {
        let k = probs.argmax(i);
        let label = match catalog.resolve_label(k) {
            Some(l) => l,
            None => {
                warn!(class = k, "predicted class has no label");
                UNKNOWN_LABEL
            }
        };
        results.push(PredictionResult {
            sequence: seq.as_ref().to_vec(),
            label,
            probability: probs.row(i)[k],
            info: *catalog.resolve_metadata(label),
        });
    }
    Ok(results)
}

/// 完整运行一次预测并写出 CSV 报告。
pub fn run(opt: &PredictOpt) -> Result<RunSummary> {
    // 模型与输入都在读取之前检查，模型优先
    if !opt.model.exists() {
        return Err(ModelLoadError::NotFound(opt.model.clone()).into());
    }
    if !opt.input.exists() {
        return Err(InputError::NotFound(opt.input.clone()).into());
    }

    let output = opt.output_path();
    create_output_dir(&opt.output_dir)?;

    let catalog = GeneCatalog::builtin();

    info!("Loading model from {}...", opt.model.display());
    let classifier = model::load_model(&opt.model, (opt.max_len, protein::SIGMA), catalog.labels())?;

    info!("Loading sequences from {}...", opt.input.display());
    let records = fasta::load_sequences(&opt.input)?;
    info!("Loaded {} sequences.", records.len());

    let seqs: Vec<&[u8]> = records.iter().map(|r| r.seq.as_slice()).collect();
    let results = predict_sequences(classifier.as_ref(), catalog, &seqs, opt.max_len)?;

    report::write_report(&output, &results)?;
    info!("Prediction complete. Results saved to '{}'", output.display());

    Ok(RunSummary { sequences: results.len(), output })
}

fn create_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| ClongError::Output { path: dir.to_path_buf(), source })
}
