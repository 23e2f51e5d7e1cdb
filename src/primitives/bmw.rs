//! Blue Midnight Wish 256 (tweaked second-round version).

const BLOCK_LEN: usize = 64;

const IV: [u32; 16] = [
    0x4041_4243, 0x4445_4647, 0x4849_4A4B, 0x4C4D_4E4F, 0x5051_5253, 0x5455_5657, 0x5859_5A5B,
    0x5C5D_5E5F, 0x6061_6263, 0x6465_6667, 0x6869_6A6B, 0x6C6D_6E6F, 0x7071_7273, 0x7475_7677,
    0x7879_7A7B, 0x7C7D_7E7F,
];

const FINAL: [u32; 16] = [
    0xAAAA_AAA0, 0xAAAA_AAA1, 0xAAAA_AAA2, 0xAAAA_AAA3, 0xAAAA_AAA4, 0xAAAA_AAA5, 0xAAAA_AAA6,
    0xAAAA_AAA7, 0xAAAA_AAA8, 0xAAAA_AAA9, 0xAAAA_AAAA, 0xAAAA_AAAB, 0xAAAA_AAAC, 0xAAAA_AAAD,
    0xAAAA_AAAE, 0xAAAA_AAAF,
];

/// f0 bijection: each W_j is a signed sum of five (M ^ H) words.
const W_TERMS: [[(usize, bool); 5]; 16] = [
    [(5, true), (7, false), (10, true), (13, true), (14, true)],
    [(6, true), (8, false), (11, true), (14, true), (15, false)],
    [(0, true), (7, true), (9, true), (12, false), (15, true)],
    [(0, true), (1, false), (8, true), (10, false), (13, true)],
    [(1, true), (2, true), (9, true), (11, false), (14, false)],
    [(3, true), (2, false), (10, true), (12, false), (15, true)],
    [(4, true), (0, false), (3, false), (11, false), (13, true)],
    [(1, true), (4, false), (5, false), (12, false), (14, false)],
    [(2, true), (5, false), (6, false), (13, true), (15, false)],
    [(0, true), (3, false), (6, true), (7, false), (14, true)],
    [(8, true), (1, false), (4, false), (7, false), (15, true)],
    [(8, true), (0, false), (2, false), (5, false), (9, true)],
    [(1, true), (3, true), (6, false), (9, false), (10, true)],
    [(2, true), (4, true), (7, true), (10, true), (11, true)],
    [(3, true), (5, false), (8, true), (11, false), (12, false)],
    [(12, true), (4, false), (6, false), (9, false), (13, true)],
];

const EXPAND2_ROTATIONS: [u32; 7] = [3, 7, 13, 16, 19, 23, 27];

#[derive(Clone)]
pub struct Bmw256 {
    h: [u32; 16],
    buffer: [u8; BLOCK_LEN],
    buffered: usize,
    bit_len: u64,
}

impl Default for Bmw256 {
    fn default() -> Self {
        Self::new()
    }
}

impl Bmw256 {
    pub fn new() -> Self {
        Self {
            h: IV,
            buffer: [0; BLOCK_LEN],
            buffered: 0,
            bit_len: 0,
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        self.bit_len = self.bit_len.wrapping_add((data.len() as u64) * 8);
        while !data.is_empty() {
            let take = (BLOCK_LEN - self.buffered).min(data.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];

            if self.buffered == BLOCK_LEN {
                let block = self.buffer;
                self.h = compress(&self.h, &words(&block));
                self.buffered = 0;
            }
        }
    }

    pub fn finalize(mut self) -> [u8; 32] {
        let mut block = [0u8; BLOCK_LEN];
        block[..self.buffered].copy_from_slice(&self.buffer[..self.buffered]);
        block[self.buffered] = 0x80;
        if self.buffered >= 56 {
            self.h = compress(&self.h, &words(&block));
            block = [0u8; BLOCK_LEN];
        }
        block[56..].copy_from_slice(&self.bit_len.to_le_bytes());
        self.h = compress(&self.h, &words(&block));

        let last = compress(&FINAL, &self.h);
        let mut out = [0u8; 32];
        for (chunk, word) in out.chunks_exact_mut(4).zip(last[8..].iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }
}

fn words(block: &[u8; BLOCK_LEN]) -> [u32; 16] {
    let mut m = [0u32; 16];
    for (word, chunk) in m.iter_mut().zip(block.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    m
}

fn s0(x: u32) -> u32 {
    (x >> 1) ^ (x << 3) ^ x.rotate_left(4) ^ x.rotate_left(19)
}

fn s1(x: u32) -> u32 {
    (x >> 1) ^ (x << 2) ^ x.rotate_left(8) ^ x.rotate_left(23)
}

fn s2(x: u32) -> u32 {
    (x >> 2) ^ (x << 1) ^ x.rotate_left(12) ^ x.rotate_left(25)
}

fn s3(x: u32) -> u32 {
    (x >> 2) ^ (x << 2) ^ x.rotate_left(15) ^ x.rotate_left(29)
}

fn s4(x: u32) -> u32 {
    (x >> 1) ^ x
}

fn s5(x: u32) -> u32 {
    (x >> 2) ^ x
}

fn add_element(m: &[u32; 16], h: &[u32; 16], j: usize) -> u32 {
    let i = j - 16;
    let term = |k: usize| m[k % 16].rotate_left((k % 16) as u32 + 1);
    term(i)
        .wrapping_add(term(i + 3))
        .wrapping_sub(term(i + 10))
        .wrapping_add((j as u32).wrapping_mul(0x0555_5555))
        ^ h[(i + 7) % 16]
}

fn compress(h: &[u32; 16], m: &[u32; 16]) -> [u32; 16] {
    let mut x = [0u32; 16];
    for i in 0..16 {
        x[i] = m[i] ^ h[i];
    }

    let mut q = [0u32; 32];
    let s_small: [fn(u32) -> u32; 5] = [s0, s1, s2, s3, s4];
    for (j, terms) in W_TERMS.iter().enumerate() {
        let w = terms.iter().fold(0u32, |acc, &(idx, add)| {
            if add {
                acc.wrapping_add(x[idx])
            } else {
                acc.wrapping_sub(x[idx])
            }
        });
        q[j] = s_small[j % 5](w).wrapping_add(h[(j + 1) % 16]);
    }

    let expand1: [fn(u32) -> u32; 4] = [s1, s2, s3, s0];
    for j in 16..18 {
        let mut acc = add_element(m, h, j);
        for k in 0..16 {
            acc = acc.wrapping_add(expand1[k % 4](q[j - 16 + k]));
        }
        q[j] = acc;
    }
    for j in 18..32 {
        let mut acc = add_element(m, h, j);
        for k in 0..14 {
            let word = q[j - 16 + k];
            let term = if k % 2 == 0 {
                word
            } else {
                word.rotate_left(EXPAND2_ROTATIONS[k / 2])
            };
            acc = acc.wrapping_add(term);
        }
        q[j] = acc.wrapping_add(s4(q[j - 2])).wrapping_add(s5(q[j - 1]));
    }

    let xl = q[16..24].iter().fold(0, |acc, w| acc ^ w);
    let xh = q[24..32].iter().fold(xl, |acc, w| acc ^ w);

    let mut n = [0u32; 16];
    n[0] = ((xh << 5) ^ (q[16] >> 5) ^ m[0]).wrapping_add(xl ^ q[24] ^ q[0]);
    n[1] = ((xh >> 7) ^ (q[17] << 8) ^ m[1]).wrapping_add(xl ^ q[25] ^ q[1]);
    n[2] = ((xh >> 5) ^ (q[18] << 5) ^ m[2]).wrapping_add(xl ^ q[26] ^ q[2]);
    n[3] = ((xh >> 1) ^ (q[19] << 5) ^ m[3]).wrapping_add(xl ^ q[27] ^ q[3]);
    n[4] = ((xh >> 3) ^ q[20] ^ m[4]).wrapping_add(xl ^ q[28] ^ q[4]);
    n[5] = ((xh << 6) ^ (q[21] >> 6) ^ m[5]).wrapping_add(xl ^ q[29] ^ q[5]);
    n[6] = ((xh >> 4) ^ (q[22] << 6) ^ m[6]).wrapping_add(xl ^ q[30] ^ q[6]);
    n[7] = ((xh >> 11) ^ (q[23] << 2) ^ m[7]).wrapping_add(xl ^ q[31] ^ q[7]);

    n[8] = n[4]
        .rotate_left(9)
        .wrapping_add(xh ^ q[24] ^ m[8])
        .wrapping_add((xl << 8) ^ q[23] ^ q[8]);
    n[9] = n[5]
        .rotate_left(10)
        .wrapping_add(xh ^ q[25] ^ m[9])
        .wrapping_add((xl >> 6) ^ q[16] ^ q[9]);
    n[10] = n[6]
        .rotate_left(11)
        .wrapping_add(xh ^ q[26] ^ m[10])
        .wrapping_add((xl << 6) ^ q[17] ^ q[10]);
    n[11] = n[7]
        .rotate_left(12)
        .wrapping_add(xh ^ q[27] ^ m[11])
        .wrapping_add((xl << 4) ^ q[18] ^ q[11]);
    n[12] = n[0]
        .rotate_left(13)
        .wrapping_add(xh ^ q[28] ^ m[12])
        .wrapping_add((xl >> 3) ^ q[19] ^ q[12]);
    n[13] = n[1]
        .rotate_left(14)
        .wrapping_add(xh ^ q[29] ^ m[13])
        .wrapping_add((xl >> 4) ^ q[20] ^ q[13]);
    n[14] = n[2]
        .rotate_left(15)
        .wrapping_add(xh ^ q[30] ^ m[14])
        .wrapping_add((xl >> 7) ^ q[21] ^ q[14]);
    n[15] = n[3]
        .rotate_left(16)
        .wrapping_add(xh ^ q[31] ^ m[15])
        .wrapping_add((xl >> 2) ^ q[22] ^ q[15]);
    n
}
