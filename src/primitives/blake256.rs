//! BLAKE-256 (14 rounds, SHA-3 final-round version).

const BLOCK_LEN: usize = 64;

const IV: [u32; 8] = [
    0x6A09_E667, 0xBB67_AE85, 0x3C6E_F372, 0xA54F_F53A, 0x510E_527F, 0x9B05_688C, 0x1F83_D9AB,
    0x5BE0_CD19,
];

const C: [u32; 16] = [
    0x243F_6A88, 0x85A3_08D3, 0x1319_8A2E, 0x0370_7344, 0xA409_3822, 0x299F_31D0, 0x082E_FA98,
    0xEC4E_6C89, 0x4528_21E6, 0x38D0_1377, 0xBE54_66CF, 0x34E9_0C6C, 0xC0AC_29B7, 0xC97C_50DD,
    0x3F84_D5B5, 0xB547_0917,
];

const SIGMA: [[usize; 16]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
];

const ROUNDS: usize = 14;

/// Streaming BLAKE-256 context. Zero salt.
#[derive(Clone)]
pub struct Blake256 {
    h: [u32; 8],
    buffer: [u8; BLOCK_LEN],
    buffered: usize,
    /// message bits compressed so far
    counter: u64,
}

impl Default for Blake256 {
    fn default() -> Self {
        Self::new()
    }
}

impl Blake256 {
    pub fn new() -> Self {
        Self {
            h: IV,
            buffer: [0; BLOCK_LEN],
            buffered: 0,
            counter: 0,
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let take = (BLOCK_LEN - self.buffered).min(data.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];

            if self.buffered == BLOCK_LEN {
                self.counter += (BLOCK_LEN * 8) as u64;
                let block = self.buffer;
                self.compress(&block, self.counter);
                self.buffered = 0;
            }
        }
    }

    pub fn finalize(mut self) -> [u8; 32] {
        let tail = self.buffered;
        let bit_len = self.counter + (tail as u64) * 8;

        let mut block = [0u8; BLOCK_LEN];
        block[..tail].copy_from_slice(&self.buffer[..tail]);
        block[tail] = 0x80;

        if tail <= 55 {
            block[55] |= 0x01;
            block[56..].copy_from_slice(&bit_len.to_be_bytes());
            // a block without message bits is compressed with a zero counter
            let counter = if tail == 0 { 0 } else { bit_len };
            self.compress(&block, counter);
        } else {
            self.compress(&block, bit_len);
            let mut last = [0u8; BLOCK_LEN];
            last[55] = 0x01;
            last[56..].copy_from_slice(&bit_len.to_be_bytes());
            self.compress(&last, 0);
        }

        let mut out = [0u8; 32];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.h.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        out
    }

    fn compress(&mut self, block: &[u8; BLOCK_LEN], counter: u64) {
        let mut m = [0u32; 16];
        for (word, chunk) in m.iter_mut().zip(block.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        let t0 = counter as u32;
        let t1 = (counter >> 32) as u32;
        let mut v = [0u32; 16];
        v[..8].copy_from_slice(&self.h);
        v[8..].copy_from_slice(&C[..8]);
        v[12] ^= t0;
        v[13] ^= t0;
        v[14] ^= t1;
        v[15] ^= t1;

        for round in 0..ROUNDS {
            let s = &SIGMA[round % 10];
            g(&mut v, &m, s, 0, 0, 4, 8, 12);
            g(&mut v, &m, s, 1, 1, 5, 9, 13);
            g(&mut v, &m, s, 2, 2, 6, 10, 14);
            g(&mut v, &m, s, 3, 3, 7, 11, 15);
            g(&mut v, &m, s, 4, 0, 5, 10, 15);
            g(&mut v, &m, s, 5, 1, 6, 11, 12);
            g(&mut v, &m, s, 6, 2, 7, 8, 13);
            g(&mut v, &m, s, 7, 3, 4, 9, 14);
        }

        for i in 0..8 {
            self.h[i] ^= v[i] ^ v[i + 8];
        }
    }
}

#[allow(clippy::too_many_arguments)]
#[inline(always)]
fn g(v: &mut [u32; 16], m: &[u32; 16], s: &[usize; 16], i: usize, a: usize, b: usize, c: usize, d: usize) {
    let x = s[2 * i];
    let y = s[2 * i + 1];
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(m[x] ^ C[y]);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(12);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(m[y] ^ C[x]);
    v[d] = (v[d] ^ v[a]).rotate_right(8);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(7);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blake256(data: &[u8]) -> String {
        let mut ctx = Blake256::new();
        ctx.update(data);
        hex::encode(ctx.finalize())
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(
            blake256(b""),
            "716f6e863f744b9ac22c97ec7b76ea5f5908bc5b2f67c61510bfc4751384ea7a"
        );
    }

    #[test]
    fn test_single_zero_byte() {
        assert_eq!(
            blake256(&[0u8]),
            "0ce8d4ef4dd7cd8d62dfded9d4edb0a774ae6a41929a74da23109e8f11139c87"
        );
    }

    #[test]
    fn test_seventy_two_zero_bytes() {
        assert_eq!(
            blake256(&[0u8; 72]),
            "d419bad32d504fb7d44d460c42c5593fe544fa4c135dec31e21bd9abdcc22d41"
        );
    }

    #[test]
    fn test_split_updates_match_one_shot() {
        let data = [0u8; 80];
        let mut ctx = Blake256::new();
        ctx.update(&data[..13]);
        ctx.update(&data[13..64]);
        ctx.update(&data[64..]);
        assert_eq!(hex::encode(ctx.finalize()), blake256(&data));
        assert_eq!(
            blake256(&data),
            "0c7b159452328517463db487df5e39b71322afaf14ed562ce9d18d7d9051b305"
        );
    }
}
