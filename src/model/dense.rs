use std::io::{Read, Write};
use std::path::Path;

use bincode::Options;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{softmax_in_place, Classifier, ProbabilityMatrix};
use crate::encode::Batch;
use crate::error::{ModelLoadError, Result};

/// 文件头：魔数 + 格式版本，之后是 bincode 编码的 [`DenseModel`]
const MAGIC: &[u8; 8] = b"CLONGDNN";
const FORMAT_VERSION: u32 = 1;
/// 反序列化上限，防止损坏文件触发超大分配
const MAX_MODEL_BYTES: u64 = 1 << 30;

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_MODEL_BYTES)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Linear,
    Relu,
    Sigmoid,
    Softmax,
}

/// 全连接层：`y = act(W x + b)`，`W` 为 `outputs × inputs` 行优先
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub inputs: usize,
    pub outputs: usize,
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
    pub activation: Activation,
}

impl DenseLayer {
    pub fn new(inputs: usize, outputs: usize, weights: Vec<f32>, bias: Vec<f32>, activation: Activation) -> Self {
        Self { inputs, outputs, weights, bias, activation }
    }

    fn forward(&self, x: &[f32], out: &mut Vec<f32>) {
        out.clear();
        out.extend_from_slice(&self.bias);
        for (o, y) in out.iter_mut().enumerate() {
            let w = &self.weights[o * self.inputs..(o + 1) * self.inputs];
            // one-hot 输入绝大多数为 0
            for (&wi, &xi) in w.iter().zip(x) {
                if xi != 0.0 {
                    *y += wi * xi;
                }
            }
        }
        match self.activation {
            Activation::Linear => {}
            Activation::Relu => out.iter_mut().for_each(|v| *v = v.max(0.0)),
            Activation::Sigmoid => out.iter_mut().for_each(|v| *v = 1.0 / (1.0 + (-*v).exp())),
            Activation::Softmax => softmax_in_place(out),
        }
    }
}

/// 模型来源信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// 例如导出自哪个训练产物
    pub source: Option<String>,
    /// RFC 3339 时间戳
    pub created: Option<String>,
    /// 训练时的类别顺序；为空表示未记录
    pub labels: Vec<String>,
}

impl ModelMeta {
    /// 以当前 UTC 时间标记来源
    pub fn stamped(source: impl Into<String>, labels: &[&str]) -> Self {
        Self {
            source: Some(source.into()),
            created: Some(chrono::Utc::now().to_rfc3339()),
            labels: labels.iter().map(ToString::to_string).collect(),
        }
    }
}

/// 多层全连接分类器，作用在展平后的 `L × A` one-hot 张量上。
///
/// 最后一层不是 softmax 时，输出会再经过一次 softmax，保证每行和为 1。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseModel {
    pub input_shape: (usize, usize),
    pub layers: Vec<DenseLayer>,
    pub meta: ModelMeta,
}

impl DenseModel {
    pub fn new(input_shape: (usize, usize), layers: Vec<DenseLayer>) -> Self {
        Self { input_shape, layers, meta: ModelMeta::default() }
    }

    pub fn set_meta(&mut self, meta: ModelMeta) {
        self.meta = meta;
    }

    /// 检查层间维度是否衔接
    pub fn validate(&self) -> std::result::Result<(), String> {
        let (l, a) = self.input_shape;
        if l == 0 || a == 0 {
            return Err(format!("empty input shape {:?}", self.input_shape));
        }
        if self.layers.is_empty() {
            return Err("model has no layers".to_string());
        }
        let mut width = l
            .checked_mul(a)
            .ok_or_else(|| format!("input shape {:?} overflows", self.input_shape))?;
        for (k, layer) in self.layers.iter().enumerate() {
            if layer.inputs != width {
                return Err(format!("layer {} expects {} inputs, previous width is {}", k, layer.inputs, width));
            }
            if layer.outputs == 0 {
                return Err(format!("layer {} has no outputs", k));
            }
            let expected = layer
                .inputs
                .checked_mul(layer.outputs)
                .ok_or_else(|| format!("layer {} size {} x {} overflows", k, layer.inputs, layer.outputs))?;
            if layer.weights.len() != expected {
                return Err(format!("layer {} has {} weights, expected {}", k, layer.weights.len(), expected));
            }
            if layer.bias.len() != layer.outputs {
                return Err(format!("layer {} has {} biases, expected {}", k, layer.bias.len(), layer.outputs));
            }
            width = layer.outputs;
        }
        if !self.meta.labels.is_empty() && self.meta.labels.len() != width {
            return Err(format!("{} labels recorded for {} outputs", self.meta.labels.len(), width));
        }
        Ok(())
    }

    /// 单条样本前向传播
    pub fn forward(&self, x: &[f32]) -> Vec<f32> {
        let mut cur = x.to_vec();
        let mut next = Vec::new();
        for layer in &self.layers {
            layer.forward(&cur, &mut next);
            std::mem::swap(&mut cur, &mut next);
        }
        if self.layers.last().map(|l| l.activation) != Some(Activation::Softmax) {
            softmax_in_place(&mut cur);
        }
        cur
    }

    pub fn save_to_file(&self, path: &Path) -> std::io::Result<()> {
        let mut f = std::io::BufWriter::new(std::fs::File::create(path)?);
        f.write_all(MAGIC)?;
        f.write_all(&FORMAT_VERSION.to_le_bytes())?;
        codec()
            .serialize_into(&mut f, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        f.flush()
    }

    pub fn load_from_file(path: &Path) -> std::result::Result<Self, ModelLoadError> {
        if !path.exists() {
            return Err(ModelLoadError::NotFound(path.to_path_buf()));
        }
        let io_err = |source: std::io::Error| ModelLoadError::Io { path: path.to_path_buf(), source };
        let mut f = std::io::BufReader::new(std::fs::File::open(path).map_err(io_err)?);

        let mut header = [0u8; 12];
        if f.read_exact(&mut header).is_err() || &header[..8] != MAGIC {
            return Err(ModelLoadError::format(path, "missing model header"));
        }
        let version = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
        if version != FORMAT_VERSION {
            return Err(ModelLoadError::incompatible(
                path,
                format!("format version {} (supported: {})", version, FORMAT_VERSION),
            ));
        }

        let model: Self = codec()
            .deserialize_from(&mut f)
            .map_err(|e| ModelLoadError::format(path, e))?;
        model.validate().map_err(|e| ModelLoadError::format(path, e))?;

        debug!(
            layers = model.layers.len(),
            source = model.meta.source.as_deref().unwrap_or("-"),
            created = model.meta.created.as_deref().unwrap_or("-"),
            "dense model decoded"
        );
        Ok(model)
    }
}

impl Classifier for DenseModel {
    fn input_shape(&self) -> (usize, usize) {
        self.input_shape
    }

    fn num_classes(&self) -> usize {
        self.layers.last().map_or(0, |l| l.outputs)
    }

    fn class_labels(&self) -> Option<&[String]> {
        if self.meta.labels.is_empty() {
            None
        } else {
            Some(&self.meta.labels)
        }
    }

    fn predict(&self, batch: &Batch) -> Result<ProbabilityMatrix> {
        self.check_batch(batch)?;
        let c = self.num_classes();
        let mut data = Vec::with_capacity(batch.n * c);
        for i in 0..batch.n {
            data.extend(self.forward(batch.item(i)));
        }
        Ok(ProbabilityMatrix::new(batch.n, c, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_batch;
    use crate::error::{ClongError, ShapeError};
    use crate::util::protein::Alphabet;

    /// 两类模型：类别 0 计数 'M'，类别 1 计数 'W'
    fn toy_model(rows: usize) -> DenseModel {
        let a = Alphabet::protein();
        let inputs = rows * a.len();
        let mut weights = vec![0.0f32; 2 * inputs];
        let m = a.index_of(b'M').unwrap();
        let w = a.index_of(b'W').unwrap();
        for r in 0..rows {
            weights[r * a.len() + m] = 1.0;
            weights[inputs + r * a.len() + w] = 1.0;
        }
        DenseModel::new((rows, a.len()), vec![DenseLayer::new(inputs, 2, weights, vec![0.0, 0.0], Activation::Linear)])
    }

    #[test]
    fn predict_rows_are_distributions() {
        let model = toy_model(8);
        let seqs: [&[u8]; 3] = [b"MMMK", b"WWM", b""];
        let batch = encode_batch(&seqs, 8, &Alphabet::protein());
        let probs = model.predict(&batch).unwrap();
        assert_eq!((probs.rows, probs.cols), (3, 2));
        for row in probs.iter_rows() {
            let s: f32 = row.iter().sum();
            assert!((s - 1.0).abs() < 1e-5);
        }
        assert_eq!(probs.argmax(0), 0);
        assert_eq!(probs.argmax(1), 1);
        // empty sequence: uniform, first index wins
        assert_eq!(probs.row(2), &[0.5, 0.5]);
        assert_eq!(probs.argmax(2), 0);
    }

    #[test]
    fn predict_rejects_wrong_shape() {
        let model = toy_model(8);
        let batch = encode_batch(&[b"MK"], 4, &Alphabet::protein());
        match model.predict(&batch) {
            Err(ClongError::Shape(e)) => assert_eq!(e, ShapeError { expected: (8, 20), got: (4, 20) }),
            other => panic!("expected shape error, got {:?}", other),
        }
    }

    #[test]
    fn hidden_relu_layer() {
        let hidden = DenseLayer::new(2, 2, vec![1.0, 0.0, 0.0, -1.0], vec![0.0, 0.0], Activation::Relu);
        let out = DenseLayer::new(2, 2, vec![1.0, 0.0, 0.0, 1.0], vec![0.0, 0.0], Activation::Softmax);
        let model = DenseModel::new((1, 2), vec![hidden, out]);
        model.validate().unwrap();
        let y = model.forward(&[1.0, 1.0]);
        // second hidden unit is clamped to 0
        let e = std::f32::consts::E;
        assert!((y[0] - e / (e + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn validate_catches_dimension_errors() {
        let mut model = toy_model(4);
        model.layers[0].bias.pop();
        assert!(model.validate().unwrap_err().contains("biases"));

        let model = DenseModel::new((4, 20), vec![DenseLayer::new(10, 2, vec![0.0; 20], vec![0.0; 2], Activation::Linear)]);
        assert!(model.validate().unwrap_err().contains("expects 10 inputs"));

        assert!(DenseModel::new((4, 20), Vec::new()).validate().is_err());
    }

    #[test]
    fn validate_rejects_overflowing_sizes() {
        let model = DenseModel::new(
            (usize::MAX / 2, 20),
            vec![DenseLayer::new(0, 1, Vec::new(), vec![0.0], Activation::Linear)],
        );
        assert!(model.validate().unwrap_err().contains("overflows"));

        let model = DenseModel::new(
            (1, 2),
            vec![DenseLayer::new(2, usize::MAX, Vec::new(), Vec::new(), Activation::Linear)],
        );
        assert!(model.validate().unwrap_err().contains("overflows"));
    }

    #[test]
    fn load_rejects_overflowing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.model");
        let model = DenseModel::new(
            (usize::MAX / 2, 20),
            vec![DenseLayer::new(0, 1, Vec::new(), vec![0.0], Activation::Linear)],
        );
        model.save_to_file(&path).unwrap();
        assert!(matches!(DenseModel::load_from_file(&path), Err(ModelLoadError::Format { .. })));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.model");
        let mut model = toy_model(6);
        model.set_meta(ModelMeta::stamped("unit test", &["M", "W"]));
        model.save_to_file(&path).unwrap();

        let loaded = DenseModel::load_from_file(&path).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.class_labels().unwrap(), &["M".to_string(), "W".to_string()][..]);
        assert!(chrono::DateTime::parse_from_rfc3339(loaded.meta.created.as_deref().unwrap()).is_ok());
    }

    #[test]
    fn load_rejects_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clong.h5");
        std::fs::write(&path, b"\x89HDF\r\n\x1a\n\0\0\0\0").unwrap();
        assert!(matches!(DenseModel::load_from_file(&path), Err(ModelLoadError::Format { .. })));

        std::fs::write(&path, b"CLO").unwrap();
        assert!(matches!(DenseModel::load_from_file(&path), Err(ModelLoadError::Format { .. })));

        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();
        assert!(matches!(DenseModel::load_from_file(&path), Err(ModelLoadError::Incompatible { .. })));

        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&[0xff; 5]);
        std::fs::write(&path, &bytes).unwrap();
        assert!(matches!(DenseModel::load_from_file(&path), Err(ModelLoadError::Format { .. })));
    }
}
