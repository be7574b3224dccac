//! 基因标签与注释表。
//!
//! 分类器第 `k` 个输出对应按字节字典序排序后的第 `k` 个基因符号。该顺序是
//! 模型与本 crate 之间的固定约定，不随运行时数据变化。

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// 寿命相关机制类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mechanism {
    TranscriptionTranslation,
    MetabolismRespiration,
    MembraneTransport,
    ProteaseChaperone,
    Others,
}

impl Mechanism {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Mechanism::TranscriptionTranslation => "Transcription & Translation",
            Mechanism::MetabolismRespiration => "Metabolism & Respiration",
            Mechanism::MembraneTransport => "Membrane & Transport",
            Mechanism::ProteaseChaperone => "Protease & Chaperone",
            Mechanism::Others => "Others",
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一个基因的注释。表外标签使用 [`GeneInfo::EMPTY`]，三个字段均为空串。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneInfo {
    pub mechanism: &'static str,
    pub protein: &'static str,
    pub lifespan_extension: &'static str,
}

impl GeneInfo {
    pub const EMPTY: GeneInfo = GeneInfo { mechanism: "", protein: "", lifespan_extension: "" };

    const fn new(mechanism: Mechanism, protein: &'static str, lifespan_extension: &'static str) -> Self {
        Self { mechanism: mechanism.as_str(), protein, lifespan_extension }
    }

    pub fn is_empty(&self) -> bool {
        self.mechanism.is_empty() && self.protein.is_empty() && self.lifespan_extension.is_empty()
    }
}

use Mechanism::*;

/// E. coli 寿命延长基因（按机制分组，组内按效应大小排列）
const GENES: [(&str, GeneInfo); 29] = [
    ("hns", GeneInfo::new(TranscriptionTranslation, "global DNA-binding transcriptional dual regulator", "40%")),
    ("ihfB", GeneInfo::new(TranscriptionTranslation, "integration host factor; DNA-binding protein", "35%")),
    ("hyfR", GeneInfo::new(TranscriptionTranslation, "DNA-binding transcriptional activator", "16%")),
    ("rplY", GeneInfo::new(TranscriptionTranslation, "50S ribosomal subunit protein", "11%")),
    ("aroG", GeneInfo::new(MetabolismRespiration, "3-deoxy-D-arabino-heptulosonate-7-phosphate synthase", "29%")),
    ("aroD", GeneInfo::new(MetabolismRespiration, "3-dehydroquinate dehydratase", "24%")),
    ("lipB", GeneInfo::new(MetabolismRespiration, "lipoyl-protein ligase", "23%")),
    ("purE", GeneInfo::new(MetabolismRespiration, "N5-carboxyaminoimidazole ribonucleotide mutase", "21%")),
    ("pdxA", GeneInfo::new(MetabolismRespiration, "4-hydroxy-L-threonine phosphate dehydrogenase", "21%")),
    ("gmhA*", GeneInfo::new(MetabolismRespiration, "D-sedoheptulose 7-phosphate isomerase", "19%")),
    ("pabB", GeneInfo::new(MetabolismRespiration, "aminodeoxychorismate synthase", "18%")),
    ("ynjE", GeneInfo::new(MetabolismRespiration, "thiosulfate sulfur transferase", "18%")),
    ("nrfG", GeneInfo::new(MetabolismRespiration, "heme lyase", "17%")),
    ("psuK", GeneInfo::new(MetabolismRespiration, "pseudouridine kinase", "10%")),
    ("lpp", GeneInfo::new(MembraneTransport, "murein lipoprotein", "27%")),
    ("yfiB", GeneInfo::new(MembraneTransport, "outer membrane lipoprotein", "20%")),
    ("sapD", GeneInfo::new(MembraneTransport, "antimicrobial peptide transporter", "17%")),
    ("uidC", GeneInfo::new(MembraneTransport, "outer membrane porin protein", "17%")),
    ("ygiV", GeneInfo::new(MembraneTransport, "inner membrane protein", "12%")),
    ("secB", GeneInfo::new(ProteaseChaperone, "protein export chaperone", "29%")),
    ("lon", GeneInfo::new(ProteaseChaperone, "DNA-binding ATP-dependent protease", "25%")),
    ("skp", GeneInfo::new(ProteaseChaperone, "periplasmic chaperone", "16%")),
    ("pbl", GeneInfo::new(Others, "lytic transglycosylase", "21%")),
    ("ycbJ", GeneInfo::new(Others, "unknown", "19%")),
    ("trxA", GeneInfo::new(Others, "thioredoxin", "15%")),
    ("ycgL", GeneInfo::new(Others, "unknown", "14%")),
    ("ycgN", GeneInfo::new(Others, "unknown", "12%")),
    ("recC", GeneInfo::new(Others, "exonuclease V", "11%")),
    ("yfdG", GeneInfo::new(Others, "prophage; bactoprenol-linked glucose translocase", "10%")),
];

/// 只读的标签目录：类别下标 ⇄ 基因符号 → 注释
#[derive(Debug)]
pub struct GeneCatalog {
    /// 排序后的标签，下标即类别号
    labels: Vec<&'static str>,
    index: HashMap<&'static str, usize>,
    info: HashMap<&'static str, GeneInfo>,
}

impl GeneCatalog {
    /// 由 (标签, 注释) 条目构建目录，标签按字节字典序排序。
    pub fn from_entries(entries: &[(&'static str, GeneInfo)]) -> Self {
        let info: HashMap<&'static str, GeneInfo> = entries.iter().copied().collect();
        let mut labels: Vec<&'static str> = info.keys().copied().collect();
        labels.sort_unstable();
        let index = labels.iter().enumerate().map(|(i, &l)| (l, i)).collect();
        Self { labels, index, info }
    }

    /// 内置的 29 个基因，进程内只构建一次
    pub fn builtin() -> &'static GeneCatalog {
        static CATALOG: OnceLock<GeneCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| GeneCatalog::from_entries(&GENES))
    }

    /// 类别数 C
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }

    /// 类别下标 → 标签；越界返回 `None`
    pub fn resolve_label(&self, class_index: usize) -> Option<&'static str> {
        self.labels.get(class_index).copied()
    }

    /// 标签 → 类别下标
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// 标签 → 注释；表外标签返回空注释
    pub fn resolve_metadata(&self, label: &str) -> &GeneInfo {
        self.info.get(label).unwrap_or(&GeneInfo::EMPTY)
    }

}
