/// 20 种标准氨基酸，顺序即 one-hot 的列顺序
pub const AMINO_ACIDS: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

pub const SIGMA: usize = AMINO_ACIDS.len();

const NONE: u8 = u8::MAX;

/// 有序字母表：符号 → 列号。
///
/// 查找表按字节建立，区分大小写；表外字节（含小写、`X`、`*` 等）映射为 `None`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<u8>,
    lookup: [u8; 256],
}

impl Alphabet {
    /// 标准蛋白质字母表
    pub fn protein() -> Self {
        let mut lookup = [NONE; 256];
        for (i, &s) in AMINO_ACIDS.iter().enumerate() {
            lookup[s as usize] = i as u8;
        }
        Self { symbols: AMINO_ACIDS.to_vec(), lookup }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// 符号所在列；表外符号返回 `None`
    #[inline]
    pub fn index_of(&self, b: u8) -> Option<usize> {
        match self.lookup[b as usize] {
            NONE => None,
            i => Some(i as usize),
        }
    }

    #[inline]
    pub fn contains(&self, b: u8) -> bool {
        self.lookup[b as usize] != NONE
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::protein()
    }
}

/// 统计序列中不属于字母表的字符数
pub fn count_unknown(seq: &[u8], alphabet: &Alphabet) -> usize {
    seq.iter().filter(|&&b| !alphabet.contains(b)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protein_alphabet_order() {
        let a = Alphabet::protein();
        assert_eq!(a.len(), SIGMA);
        assert_eq!(a.index_of(b'A'), Some(0));
        assert_eq!(a.index_of(b'C'), Some(1));
        assert_eq!(a.index_of(b'Y'), Some(19));
        for (i, &s) in AMINO_ACIDS.iter().enumerate() {
            assert_eq!(a.index_of(s), Some(i));
        }
    }

    #[test]
    fn lowercase_and_ambiguous_are_outside() {
        let a = Alphabet::protein();
        for b in [b'a', b'm', b'X', b'B', b'Z', b'*', b'-', b'U', b'O'] {
            assert_eq!(a.index_of(b), None, "{}", b as char);
        }
        assert_eq!(count_unknown(b"MKVxX*", &a), 3);
    }
}
