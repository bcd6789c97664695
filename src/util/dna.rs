/// 替换循环使用的固定字母表，顺序即循环顺序：A→T→C→G→A
pub const ALPHABET: [u8; 4] = [b'A', b'T', b'C', b'G'];

/// 不在循环内的符号在表中记为 NO_SUCC
const NO_SUCC: u8 = 0;

const fn build_successor_table() -> [u8; 256] {
    let mut table = [NO_SUCC; 256];
    let n = ALPHABET.len();
    let mut i = 0;
    while i < n {
        let from = ALPHABET[i];
        let to = ALPHABET[(i + 1) % n];
        table[from as usize] = to;
        // lower-case stays lower-case
        table[from.to_ascii_lowercase() as usize] = to.to_ascii_lowercase();
        i += 1;
    }
    table
}

static SUCCESSOR: [u8; 256] = build_successor_table();

/// 返回 `base` 在循环中的下一个碱基；不在字母表内的符号（如 N）返回 None。
#[inline]
pub fn cyclic_substitute(base: u8) -> Option<u8> {
    match SUCCESSOR[base as usize] {
        NO_SUCC => None,
        b => Some(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_follows_alphabet_order() {
        assert_eq!(cyclic_substitute(b'A'), Some(b'T'));
        assert_eq!(cyclic_substitute(b'T'), Some(b'C'));
        assert_eq!(cyclic_substitute(b'C'), Some(b'G'));
        assert_eq!(cyclic_substitute(b'G'), Some(b'A'));
    }

    #[test]
    fn substitute_always_differs_and_wraps_after_four_steps() {
        for &b in &ALPHABET {
            let mut cur = b;
            for _ in 0..4 {
                let next = cyclic_substitute(cur).unwrap();
                assert_ne!(next, cur);
                cur = next;
            }
            assert_eq!(cur, b);
        }
    }

    #[test]
    fn lowercase_keeps_case() {
        assert_eq!(cyclic_substitute(b'a'), Some(b't'));
        assert_eq!(cyclic_substitute(b'g'), Some(b'a'));
    }

    #[test]
    fn symbols_outside_alphabet_have_no_successor() {
        for b in [b'N', b'n', b'U', b'-', b'*', 0u8] {
            assert_eq!(cyclic_substitute(b), None);
        }
    }
}
