//! 定长 one-hot 编码。
//!
//! 每条序列编码为 `max_len × |alphabet|` 的 0/1 矩阵（行优先 `f32`）：
//! 第 `i` 行是 `seq[i]` 的 one-hot；超出序列长度或表外符号的行全零；
//! 长于 `max_len` 的部分直接截断。

use crate::util::protein::Alphabet;

/// 模型训练时使用的最大序列长度
pub const MAX_SEQ_LENGTH: usize = 500;

/// 单条序列的编码结果
#[derive(Debug, Clone, PartialEq)]
pub struct OneHot {
    pub rows: usize,
    pub cols: usize,
    /// rows * cols，行优先
    pub data: Vec<f32>,
}

impl OneHot {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// 第 `i` 行置 1 的列号；全零行返回 `None`
    pub fn hot_column(&self, i: usize) -> Option<usize> {
        self.row(i).iter().position(|&v| v == 1.0)
    }
}

/// 编码一条序列。纯函数：输出只取决于 `seq`、`max_len` 与字母表。
pub fn encode(seq: &[u8], max_len: usize, alphabet: &Alphabet) -> OneHot {
    let cols = alphabet.len();
    let mut data = vec![0.0f32; max_len * cols];
    for (i, &b) in seq.iter().take(max_len).enumerate() {
        if let Some(c) = alphabet.index_of(b) {
            data[i * cols + c] = 1.0;
        }
    }
    OneHot { rows: max_len, cols, data }
}

/// 一批编码后的序列，连续存放为 `n × rows × cols`
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub n: usize,
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl Batch {
    /// 每条样本的形状 `(rows, cols)`
    pub fn item_shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// 单条样本展平后的长度
    pub fn item_len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn item(&self, i: usize) -> &[f32] {
        let len = self.item_len();
        &self.data[i * len..(i + 1) * len]
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}

/// 按输入顺序编码整批序列，样本之间互不影响。
pub fn encode_batch<S: AsRef<[u8]>>(seqs: &[S], max_len: usize, alphabet: &Alphabet) -> Batch {
    let cols = alphabet.len();
    let mut data = Vec::with_capacity(seqs.len() * max_len * cols);
    for s in seqs {
        data.extend_from_slice(&encode(s.as_ref(), max_len, alphabet).data);
    }
    Batch { n: seqs.len(), rows: max_len, cols, data }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protein() -> Alphabet {
        Alphabet::protein()
    }

    #[test]
    fn one_hot_rows_follow_sequence() {
        let a = protein();
        let seq = b"MKVACY";
        let t = encode(seq, 10, &a);
        assert_eq!(t.shape(), (10, 20));
        for (i, &b) in seq.iter().enumerate() {
            let row = t.row(i);
            assert_eq!(row.iter().filter(|&&v| v == 1.0).count(), 1);
            assert_eq!(t.hot_column(i), a.index_of(b));
        }
        for i in seq.len()..10 {
            assert!(t.row(i).iter().all(|&v| v == 0.0), "row {} not padded", i);
        }
    }

    #[test]
    fn long_sequence_is_truncated() {
        let a = protein();
        let long: Vec<u8> = b"ACDEFGHIKLMNPQRSTVWY".iter().cycle().take(MAX_SEQ_LENGTH + 37).copied().collect();
        let full = encode(&long, MAX_SEQ_LENGTH, &a);
        let cut = encode(&long[..MAX_SEQ_LENGTH], MAX_SEQ_LENGTH, &a);
        assert_eq!(full, cut);
        assert_eq!(full.data.len(), MAX_SEQ_LENGTH * 20);
    }

    #[test]
    fn unknown_symbols_give_zero_rows() {
        let a = protein();
        let t = encode(b"MxX*K", 8, &a);
        assert_eq!(t.hot_column(0), a.index_of(b'M'));
        assert_eq!(t.hot_column(1), None);
        assert_eq!(t.hot_column(2), None);
        assert_eq!(t.hot_column(3), None);
        assert_eq!(t.hot_column(4), a.index_of(b'K'));
        for i in 0..8 {
            assert!(t.row(i).iter().filter(|&&v| v == 1.0).count() <= 1);
        }
    }

    #[test]
    fn empty_sequence_is_all_zero() {
        let t = encode(b"", 4, &protein());
        assert!(t.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn batch_items_are_independent() {
        let a = protein();
        let seqs = vec![b"MKV".to_vec(), b"WWWWWW".to_vec(), Vec::new()];
        let batch = encode_batch(&seqs, 6, &a);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.item_shape(), (6, 20));
        for (i, s) in seqs.iter().enumerate() {
            assert_eq!(batch.item(i), encode(s, 6, &a).data.as_slice());
        }
        let alone = encode_batch(&[b"MKV"], 6, &a);
        assert_eq!(alone.item(0), batch.item(0));
    }
}
