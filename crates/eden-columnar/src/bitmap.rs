#![forbid(unsafe_code)]

/// A compact row mask.
///
/// Query membership, per-selection membership and scope restrictions are all stored as one
/// bit per tuple. Bits are stored little-endian within each `u64` word:
/// - bit 0 is the LSB of word 0
/// - bit 63 is the MSB of word 0
///
/// Bits past `len` in the last word are always zero, so word-wise operations never need to
/// re-mask before counting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitVec {
    words: Vec<u64>,
    len: usize,
    ones: usize,
}

impl BitVec {
    pub fn new() -> Self {
        Self {
            words: Vec::new(),
            len: 0,
            ones: 0,
        }
    }

    pub fn with_len_all_true(bits: usize) -> Self {
        if bits == 0 {
            return Self::new();
        }

        let mut words = vec![u64::MAX; bits.div_ceil(64)];
        let rem = bits % 64;
        if rem != 0 {
            if let Some(last) = words.last_mut() {
                *last = (1u64 << rem) - 1;
            }
        }

        Self {
            words,
            len: bits,
            ones: bits,
        }
    }

    pub fn with_len_all_false(bits: usize) -> Self {
        Self {
            words: vec![0u64; bits.div_ceil(64)],
            len: bits,
            ones: 0,
        }
    }

    /// Build a mask of `bits` rows where row `i` is set iff `f(i)` holds.
    pub fn from_fn(bits: usize, mut f: impl FnMut(usize) -> bool) -> Self {
        let mut words = vec![0u64; bits.div_ceil(64)];
        let mut ones = 0usize;
        for (word_idx, word) in words.iter_mut().enumerate() {
            let base = word_idx * 64;
            let end = (base + 64).min(bits);
            let mut w = 0u64;
            for row in base..end {
                if f(row) {
                    w |= 1u64 << (row - base);
                }
            }
            ones += w.count_ones() as usize;
            *word = w;
        }
        Self {
            words,
            len: bits,
            ones,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, value: bool) {
        let bit = self.len % 64;
        if bit == 0 {
            self.words.push(0);
        }

        if value {
            let word = self.len / 64;
            self.words[word] |= 1u64 << bit;
            self.ones += 1;
        }

        self.len += 1;
    }

    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len, "BitVec index out of bounds");
        let word = self.words[index / 64];
        ((word >> (index % 64)) & 1) == 1
    }

    pub fn set(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.len, "BitVec index out of bounds");
        let word_idx = index / 64;
        let mask = 1u64 << (index % 64);
        let was_set = (self.words[word_idx] & mask) != 0;

        match (was_set, value) {
            (true, false) => {
                self.words[word_idx] &= !mask;
                self.ones -= 1;
            }
            (false, true) => {
                self.words[word_idx] |= mask;
                self.ones += 1;
            }
            _ => {}
        }
    }

    pub fn count_ones(&self) -> usize {
        self.ones
    }

    pub fn count_zeros(&self) -> usize {
        self.len - self.ones
    }

    pub fn all_true(&self) -> bool {
        self.ones == self.len
    }

    /// Intersect with `other` in place. Both masks must cover the same rows.
    pub fn and_inplace(&mut self, other: &BitVec) {
        debug_assert_eq!(self.len, other.len, "BitVec length mismatch");
        let mut ones = 0usize;
        for (w, o) in self.words.iter_mut().zip(other.words.iter()) {
            *w &= *o;
            ones += w.count_ones() as usize;
        }
        self.ones = ones;
    }

    pub fn not_inplace(&mut self) {
        if self.len == 0 {
            return;
        }

        for w in &mut self.words {
            *w = !*w;
        }

        let rem_bits = self.len % 64;
        if rem_bits != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem_bits) - 1;
            }
        }

        self.ones = self.len - self.ones;
    }

    /// Return the complement of this mask.
    pub fn negated(&self) -> BitVec {
        let mut out = self.clone();
        out.not_inplace();
        out
    }

    /// Iterate the indices of set bits in increasing order.
    pub fn iter_ones(&self) -> IterOnes<'_> {
        IterOnes {
            words: &self.words,
            word_idx: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }
}

impl Default for BitVec {
    fn default() -> Self {
        Self::new()
    }
}

pub struct IterOnes<'a> {
    words: &'a [u64],
    word_idx: usize,
    current: u64,
}

impl Iterator for IterOnes<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(self.word_idx * 64 + bit);
            }
            self.word_idx += 1;
            self.current = *self.words.get(self.word_idx)?;
        }
    }
}

/// Rows covered by an optional scope mask; `None` means every row.
pub(crate) enum ScopeRows<'a> {
    All(std::ops::Range<usize>),
    Masked(IterOnes<'a>),
}

impl Iterator for ScopeRows<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            ScopeRows::All(range) => range.next(),
            ScopeRows::Masked(ones) => ones.next(),
        }
    }
}

pub(crate) fn scope_rows(len: usize, scope: Option<&BitVec>) -> ScopeRows<'_> {
    match scope {
        Some(mask) => {
            debug_assert_eq!(mask.len(), len, "scope mask length mismatch");
            ScopeRows::Masked(mask.iter_ones())
        }
        None => ScopeRows::All(0..len),
    }
}
