/// 去除填充字符后的序列，同时保留原始（含填充）坐标到去填充坐标的映射
#[derive(Debug, Clone)]
pub struct StrippedSequence {
    seq: Vec<u8>,
    // mapping[i] = stripped position of original byte i, None if it was removed
    mapping: Vec<Option<usize>>,
}

impl StrippedSequence {
    pub fn strip(raw: &[u8], padding: u8) -> Self {
        let mut seq = Vec::with_capacity(raw.len());
        let mut mapping = Vec::with_capacity(raw.len());
        for &b in raw {
            if b == padding {
                mapping.push(None);
            } else {
                mapping.push(Some(seq.len()));
                seq.push(b);
            }
        }
        Self { seq, mapping }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.seq
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.seq
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// 将原始（含填充符）坐标换算为去除填充符后的坐标。
    /// 原始序列末尾位置映射到去除后序列的长度；落在填充符或越界时返回 None。
    pub fn convert_position(&self, original: usize) -> Option<usize> {
        if original == self.mapping.len() {
            return Some(self.seq.len());
        }
        self.mapping.get(original).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_removes_padding() {
        let s = StrippedSequence::strip(b"ACGTACGTNNACGT", b'N');
        assert_eq!(s.as_bytes(), b"ACGTACGTACGT");
        assert_eq!(s.len(), 12);
    }

    #[test]
    fn positions_before_padding_are_unchanged() {
        let s = StrippedSequence::strip(b"ACGTACGTNNACGT", b'N');
        assert_eq!(s.convert_position(4), Some(4));
        assert_eq!(s.convert_position(0), Some(0));
    }

    #[test]
    fn positions_after_padding_shift_left() {
        let s = StrippedSequence::strip(b"AC..GT", b'.');
        assert_eq!(s.convert_position(4), Some(2));
        assert_eq!(s.convert_position(5), Some(3));
        assert_eq!(s.convert_position(6), Some(4));
    }

    #[test]
    fn padding_and_out_of_range_positions_are_undefined() {
        let s = StrippedSequence::strip(b"AC..GT", b'.');
        assert_eq!(s.convert_position(2), None);
        assert_eq!(s.convert_position(3), None);
        assert_eq!(s.convert_position(7), None);
    }
}
