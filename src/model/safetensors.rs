//! candle 后端：从 `.safetensors` 读取全连接网络。
//!
//! 张量命名 `dense_{k}.weight`（`outputs × inputs`）与 `dense_{k}.bias`，
//! `k` 从 0 连续编号；层间使用 relu，最后一层接 softmax。可选的
//! `input_shape` 张量（两个整数）声明 `(L, A)`，缺省时按编码器默认形状处理。

use std::path::Path;

use candle_core::{DType, Device, Module, Tensor, D};
use candle_nn::Linear;
use tracing::debug;

use super::{Classifier, ProbabilityMatrix};
use crate::encode::{Batch, MAX_SEQ_LENGTH};
use crate::error::{ClongError, ModelLoadError, Result};
use crate::util::protein::SIGMA;

pub struct CandleModel {
    layers: Vec<Linear>,
    input_shape: (usize, usize),
    num_classes: usize,
    device: Device,
}

impl CandleModel {
    pub fn load(path: &Path) -> std::result::Result<Self, ModelLoadError> {
        let device = Device::Cpu;
        let fmt = |e: candle_core::Error| ModelLoadError::format(path, e);

        let mut tensors = candle_core::safetensors::load(path, &device).map_err(fmt)?;

        let mut layers = Vec::new();
        let mut first_in = None;
        let mut width = 0usize;
        for k in 0.. {
            let Some(w) = tensors.remove(&format!("dense_{k}.weight")) else {
                break;
            };
            let b = tensors
                .remove(&format!("dense_{k}.bias"))
                .ok_or_else(|| ModelLoadError::format(path, format!("tensor dense_{k}.bias missing")))?;
            let w = w.to_dtype(DType::F32).map_err(fmt)?;
            let b = b.to_dtype(DType::F32).map_err(fmt)?;

            let (outputs, inputs) = w.dims2().map_err(fmt)?;
            if b.dims1().map_err(fmt)? != outputs {
                return Err(ModelLoadError::format(path, format!("dense_{k}: bias does not match {outputs} outputs")));
            }
            match first_in {
                None => first_in = Some(inputs),
                Some(_) if inputs != width => {
                    return Err(ModelLoadError::format(
                        path,
                        format!("dense_{k} expects {inputs} inputs, previous width is {width}"),
                    ));
                }
                Some(_) => {}
            }
            width = outputs;
            layers.push(Linear::new(w, Some(b)));
        }
        let Some(first_in) = first_in else {
            return Err(ModelLoadError::format(path, "no dense_0.weight tensor"));
        };

        let input_shape = match tensors.get("input_shape") {
            Some(t) => {
                let dims = t.to_dtype(DType::U32).and_then(|t| t.to_vec1::<u32>()).map_err(fmt)?;
                match dims.as_slice() {
                    &[l, a] => (l as usize, a as usize),
                    _ => return Err(ModelLoadError::format(path, "input_shape must hold two values")),
                }
            }
            None => (MAX_SEQ_LENGTH, SIGMA),
        };
        if input_shape.0 * input_shape.1 != first_in {
            return Err(ModelLoadError::incompatible(
                path,
                format!("first layer takes {first_in} inputs, input shape is {input_shape:?}"),
            ));
        }

        debug!(layers = layers.len(), "safetensors model decoded");
        Ok(Self { layers, input_shape, num_classes: width, device })
    }

    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let last = self.layers.len() - 1;
        let mut x = x.clone();
        for (k, layer) in self.layers.iter().enumerate() {
            x = layer.forward(&x)?;
            if k < last {
                x = x.relu()?;
            }
        }
        candle_nn::ops::softmax(&x, D::Minus1)
    }
}

impl Classifier for CandleModel {
    fn input_shape(&self) -> (usize, usize) {
        self.input_shape
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn predict(&self, batch: &Batch) -> Result<ProbabilityMatrix> {
        self.check_batch(batch)?;
        let run = || -> candle_core::Result<Vec<f32>> {
            let x = Tensor::from_slice(&batch.data, (batch.n, batch.item_len()), &self.device)?;
            self.forward(&x)?.flatten_all()?.to_vec1::<f32>()
        };
        let data = run().map_err(|e| ClongError::Inference(e.to_string()))?;
        Ok(ProbabilityMatrix::new(batch.n, self.num_classes, data))
    }
}
