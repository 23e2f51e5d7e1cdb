//! Skein-512-256 (Skein 1.3): Threefish-512 in UBI chaining mode.

const BLOCK_LEN: usize = 64;
const KEY_SCHEDULE_PARITY: u64 = 0x1BD1_1BDA_A9FC_1A22;

const ROTATIONS: [[u32; 4]; 8] = [
    [46, 36, 19, 37],
    [33, 27, 14, 42],
    [17, 49, 36, 39],
    [44, 9, 54, 56],
    [39, 30, 34, 24],
    [13, 50, 10, 17],
    [25, 29, 39, 43],
    [8, 35, 56, 22],
];

const PERMUTATION: [usize; 8] = [2, 1, 4, 7, 6, 5, 0, 3];

const TYPE_MSG: u64 = 48;
const TYPE_OUT: u64 = 63;
const FLAG_FIRST: u64 = 1 << 62;
const FLAG_FINAL: u64 = 1 << 63;

/// Chaining value after the configuration block for a 256-bit output.
const IV_256: [u64; 8] = [
    0xCCD0_44A1_2FDB_3E13,
    0xE835_9030_1A79_A9EB,
    0x55AE_A061_4F81_6E6F,
    0x2A27_67A4_AE9B_94DB,
    0xEC06_025E_74DD_7683,
    0xE7A4_36CD_C474_6251,
    0xC36F_BAF9_393A_D185,
    0x3EED_BA18_33ED_FC13,
];

#[derive(Clone)]
pub struct Skein512_256 {
    chain: [u64; 8],
    buffer: [u8; BLOCK_LEN],
    buffered: usize,
    position: u64,
    first: bool,
}

impl Default for Skein512_256 {
    fn default() -> Self {
        Self::new()
    }
}

impl Skein512_256 {
    pub fn new() -> Self {
        Self {
            chain: IV_256,
            buffer: [0; BLOCK_LEN],
            buffered: 0,
            position: 0,
            first: true,
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            // the last block must be held back to carry the final flag
            if self.buffered == BLOCK_LEN {
                let block = self.buffer;
                self.position += BLOCK_LEN as u64;
                self.absorb(&block, false);
                self.buffered = 0;
            }
            let take = (BLOCK_LEN - self.buffered).min(data.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];
        }
    }

    pub fn finalize(mut self) -> [u8; 32] {
        let mut block = [0u8; BLOCK_LEN];
        block[..self.buffered].copy_from_slice(&self.buffer[..self.buffered]);
        self.position += self.buffered as u64;
        self.absorb(&block, true);

        let output = ubi(&self.chain, &[0u8; BLOCK_LEN], 8, TYPE_OUT, true, true);
        let mut out = [0u8; 32];
        for (chunk, word) in out.chunks_exact_mut(8).zip(output.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    fn absorb(&mut self, block: &[u8; BLOCK_LEN], last: bool) {
        self.chain = ubi(&self.chain, block, self.position, TYPE_MSG, self.first, last);
        self.first = false;
    }
}

fn ubi(chain: &[u64; 8], block: &[u8; BLOCK_LEN], position: u64, kind: u64, first: bool, last: bool) -> [u64; 8] {
    let mut message = [0u64; 8];
    for (word, chunk) in message.iter_mut().zip(block.chunks_exact(8)) {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        *word = u64::from_le_bytes(bytes);
    }

    let mut tweak_hi = kind << 56;
    if first {
        tweak_hi |= FLAG_FIRST;
    }
    if last {
        tweak_hi |= FLAG_FINAL;
    }

    let mut out = threefish512(chain, [position, tweak_hi], &message);
    for (o, m) in out.iter_mut().zip(message.iter()) {
        *o ^= m;
    }
    out
}

fn threefish512(key: &[u64; 8], tweak: [u64; 2], block: &[u64; 8]) -> [u64; 8] {
    let mut k = [0u64; 9];
    k[..8].copy_from_slice(key);
    k[8] = key.iter().fold(KEY_SCHEDULE_PARITY, |acc, word| acc ^ word);
    let t = [tweak[0], tweak[1], tweak[0] ^ tweak[1]];

    let inject = |v: &mut [u64; 8], s: usize| {
        for (i, word) in v.iter_mut().enumerate() {
            *word = word.wrapping_add(k[(s + i) % 9]);
        }
        v[5] = v[5].wrapping_add(t[s % 3]);
        v[6] = v[6].wrapping_add(t[(s + 1) % 3]);
        v[7] = v[7].wrapping_add(s as u64);
    };

    let mut v = *block;
    for d in 0..72 {
        if d % 4 == 0 {
            inject(&mut v, d / 4);
        }
        let r = &ROTATIONS[d % 8];
        for j in 0..4 {
            let (a, b) = (2 * j, 2 * j + 1);
            v[a] = v[a].wrapping_add(v[b]);
            v[b] = v[b].rotate_left(r[j]) ^ v[a];
        }
        let mixed = v;
        for (i, word) in v.iter_mut().enumerate() {
            *word = mixed[PERMUTATION[i]];
        }
    }
    inject(&mut v, 18);
    v
}
