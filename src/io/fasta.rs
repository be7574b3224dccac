use std::io::BufRead;
use std::path::Path;

use tracing::debug;

use crate::error::InputError;

#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: Vec<u8>,
}

/// 逐条读取 FASTA 记录。
///
/// 序列行去掉全部空白后拼接，字符大小写保持原样。第一个 `>` 之前的序列行
/// 视为一条无名记录（`id` 为空串）。
pub struct FastaReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
    peek_header: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            done: false,
            peek_header: None,
        }
    }

    pub fn next_record(&mut self) -> std::io::Result<Option<FastaRecord>> {
        if self.done {
            return Ok(None);
        }

        let mut seq: Vec<u8> = Vec::new();

        // Find header line
        let header = if let Some(h) = self.peek_header.take() {
            h
        } else {
            loop {
                self.buf.clear();
                let n = self.reader.read_line(&mut self.buf)?;
                if n == 0 {
                    self.done = true;
                    return Ok(None);
                }
                if let Some(h) = self.buf.strip_prefix('>') {
                    break h.trim().to_string();
                }
                // data before the first header
                push_residues(&mut seq, &self.buf);
                if !seq.is_empty() {
                    break String::new();
                }
            }
        };

        // Parse id and description
        let mut parts = header.splitn(2, char::is_whitespace);
        let id = parts.next().unwrap_or("").to_string();
        let desc = parts
            .next()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        // Read sequence lines
        loop {
            self.buf.clear();
            let n = self.reader.read_line(&mut self.buf)?;
            if n == 0 {
                self.done = true;
                break;
            }
            if let Some(h) = self.buf.strip_prefix('>') {
                self.peek_header = Some(h.trim().to_string());
                break;
            }
            push_residues(&mut seq, &self.buf);
        }

        Ok(Some(FastaRecord { id, desc, seq }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = std::io::Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[inline]
fn push_residues(seq: &mut Vec<u8>, line: &str) {
    seq.extend(line.bytes().filter(|b| !b.is_ascii_whitespace()));
}

/// 读取文件中全部非空序列，保持输入顺序。
///
/// 文件不存在返回 [`InputError::NotFound`]；解析出零条可用序列返回
/// [`InputError::Empty`]。
pub fn load_sequences(path: &Path) -> Result<Vec<FastaRecord>, InputError> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    let read_err = |source: std::io::Error| InputError::Read { path: path.to_path_buf(), source };

    let fh = std::fs::File::open(path).map_err(read_err)?;
    let reader = FastaReader::new(std::io::BufReader::new(fh));

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for rec in reader {
        let rec = rec.map_err(read_err)?;
        if rec.seq.is_empty() {
            skipped += 1;
            continue;
        }
        records.push(rec);
    }
    if skipped > 0 {
        debug!(skipped, "dropped records without sequence data");
    }

    if records.is_empty() {
        return Err(InputError::Empty(path.to_path_buf()));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(data: &[u8]) -> Vec<FastaRecord> {
        FastaReader::new(Cursor::new(data)).map(|r| r.unwrap()).collect()
    }

    #[test]
    fn parse_simple_fasta() {
        let data = b">sp|P0ACF8|HNS_ECOLI DNA-binding protein H-NS\nMSEALKILNN\nIRTLRAQ\n>lpp\nMKATK\n";
        let cursor = Cursor::new(&data[..]);
        let mut r = FastaReader::new(cursor);

        let r1 = r.next_record().unwrap().unwrap();
        assert_eq!(r1.id, "sp|P0ACF8|HNS_ECOLI");
        assert_eq!(r1.desc.as_deref(), Some("DNA-binding protein H-NS"));
        assert_eq!(r1.seq, b"MSEALKILNNIRTLRAQ");

        let r2 = r.next_record().unwrap().unwrap();
        assert_eq!(r2.id, "lpp");
        assert_eq!(r2.desc, None);
        assert_eq!(r2.seq, b"MKATK");

        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn parse_fasta_with_crlf_and_whitespace() {
        let data = b">p1 desc\r\nMK v\tA\r\n  wy\r\n>p2 \r\n X X X \r\n";
        let recs = read_all(data);
        assert_eq!(recs.len(), 2);
        // case is preserved; lowercase residues are handled by the encoder
        assert_eq!(recs[0].seq, b"MKvAwy");
        assert_eq!(recs[1].id, "p2");
        assert_eq!(recs[1].desc, None);
        assert_eq!(recs[1].seq, b"XXX");
    }

    #[test]
    fn parse_fasta_with_leading_empty_lines() {
        let recs = read_all(b"\n\n>seq1\nMKV\n");
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].id, "seq1");
        assert_eq!(recs[0].seq, b"MKV");
    }

    #[test]
    fn data_before_first_header_is_a_record() {
        let recs = read_all(b"MKV\nAC\n>seq2\nWW\n");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].id, "");
        assert_eq!(recs[0].seq, b"MKVAC");
        assert_eq!(recs[1].seq, b"WW");
    }

    #[test]
    fn header_without_sequence_yields_empty_record() {
        let recs = read_all(b">a\n>b\nMK\n>c\n\n");
        let seqs: Vec<&[u8]> = recs.iter().map(|r| r.seq.as_slice()).collect();
        assert_eq!(seqs, vec![&b""[..], &b"MK"[..], &b""[..]]);
    }

    #[test]
    fn blank_only_input_has_no_records() {
        assert!(read_all(b"\n  \n\t\n").is_empty());
        assert!(read_all(b"").is_empty());
    }

    #[test]
    fn load_sequences_drops_empty_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.fasta");
        std::fs::write(&path, ">a\n>b\nMKV\n>c\n>d\nAC\nDE\n").unwrap();
        let recs = load_sequences(&path).unwrap();
        let seqs: Vec<&[u8]> = recs.iter().map(|r| r.seq.as_slice()).collect();
        assert_eq!(seqs, vec![&b"MKV"[..], &b"ACDE"[..]]);
    }

    #[test]
    fn load_sequences_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_sequences(&dir.path().join("nope.fasta")).unwrap_err();
        assert!(matches!(err, InputError::NotFound(_)));
    }

    #[test]
    fn load_sequences_without_usable_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.fasta");
        std::fs::write(&path, "\n\n   \n").unwrap();
        let err = load_sequences(&path).unwrap_err();
        assert!(matches!(err, InputError::Empty(_)));

        std::fs::write(&path, ">only_header\n").unwrap();
        assert!(matches!(load_sequences(&path).unwrap_err(), InputError::Empty(_)));
    }
}
