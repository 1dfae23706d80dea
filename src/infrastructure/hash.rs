// Content hash used as the result-cache key.
//
// FNV-1a over 64 bits, spread across four independent accumulators so the
// per-byte multiply chains do not serialize. Byte `i` of the stream always
// feeds lane `i % 4`, whatever the chunking of the writes.

use std::hash::Hasher;

const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const PRIME: u64 = 0x0000_0100_0000_01b3;
const LANES: usize = 4;

#[derive(Debug, Clone)]
pub struct ContentHasher {
    lanes: [u64; LANES],
    position: usize,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self {
            lanes: [OFFSET_BASIS; LANES],
            position: 0,
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        let mut rest = bytes;

        // realign to lane 0
        while self.position % LANES != 0 {
            let Some((&byte, tail)) = rest.split_first() else {
                return;
            };
            self.mix(byte);
            rest = tail;
        }

        let mut chunks = rest.chunks_exact(LANES);
        for chunk in &mut chunks {
            for (lane, &byte) in self.lanes.iter_mut().zip(chunk) {
                *lane = (*lane ^ u64::from(byte)).wrapping_mul(PRIME);
            }
        }
        self.position += rest.len() - chunks.remainder().len();

        for &byte in chunks.remainder() {
            self.mix(byte);
        }
    }

    fn mix(&mut self, byte: u8) {
        let lane = &mut self.lanes[self.position % LANES];
        *lane = (*lane ^ u64::from(byte)).wrapping_mul(PRIME);
        self.position += 1;
    }

    /// Fold the lanes (and the length) into one value.
    pub fn digest(&self) -> u64 {
        let mut folded = OFFSET_BASIS;
        for lane in self.lanes.iter().chain(std::iter::once(&(self.position as u64))) {
            for byte in lane.to_le_bytes() {
                folded = (folded ^ u64::from(byte)).wrapping_mul(PRIME);
            }
        }
        folded
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for ContentHasher {
    fn finish(&self) -> u64 {
        self.digest()
    }

    fn write(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }
}

/// Cache key of a piece of text, as 16 lowercase hex digits.
pub fn content_hash(text: &str) -> String {
    let mut hasher = ContentHasher::new();
    hasher.update(text.as_bytes());
    format!("{:016x}", hasher.digest())
}
