use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ClongError, Result};
use crate::pipeline::PredictionResult;

pub const HEADER: [&str; 6] = [
    "Sequence",
    "Predicted Gene",
    "Predicted Probability",
    "Mechanism",
    "Protein",
    "Lifespan Extension",
];

/// 以 CSV 写出预测结果，表头见 [`HEADER`]，每条输入序列一行。
pub fn write_csv<W: Write>(out: W, results: &[PredictionResult]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(HEADER)?;
    for r in results {
        let seq = String::from_utf8_lossy(&r.sequence);
        let prob = format!("{}", f64::from(r.probability));
        wtr.write_record([
            &*seq,
            r.label,
            prob.as_str(),
            r.info.mechanism,
            r.info.protein,
            r.info.lifespan_extension,
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// 原子地写出报告：先写入同目录下的临时文件，成功后再重命名覆盖 `path`。
///
/// 目标目录不存在时自动创建。写入中途失败不会留下半个文件，旧文件保持不变。
pub fn write_report(path: &Path, results: &[PredictionResult]) -> Result<()> {
    let out_err = |source: std::io::Error| ClongError::Output { path: path.to_path_buf(), source };

    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(out_err)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".clong_predictions")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(out_err)?;
    write_csv(std::io::BufWriter::new(tmp.as_file_mut()), results).map_err(|e| out_err(e.into()))?;
    tmp.as_file().sync_all().map_err(out_err)?;
    tmp.persist(path).map_err(|e| out_err(e.error))?;

    debug!(rows = results.len(), path = %path.display(), "report written");
    Ok(())
}
