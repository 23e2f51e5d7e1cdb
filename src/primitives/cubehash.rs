//! CubeHash16/32-256: 16 rounds per 32-byte block, 160 rounds of
//! initialisation and finalisation.

const BLOCK_LEN: usize = 32;
const ROUNDS_PER_BLOCK: usize = 16;
const EDGE_ROUNDS: usize = 160;

#[derive(Clone)]
pub struct CubeHash256 {
    x: [u32; 32],
    buffer: [u8; BLOCK_LEN],
    buffered: usize,
}

impl Default for CubeHash256 {
    fn default() -> Self {
        Self::new()
    }
}

impl CubeHash256 {
    pub fn new() -> Self {
        let mut x = [0u32; 32];
        x[0] = 32; // output bytes
        x[1] = BLOCK_LEN as u32;
        x[2] = ROUNDS_PER_BLOCK as u32;
        rounds(&mut x, EDGE_ROUNDS);
        Self {
            x,
            buffer: [0; BLOCK_LEN],
            buffered: 0,
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let take = (BLOCK_LEN - self.buffered).min(data.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];

            if self.buffered == BLOCK_LEN {
                let block = self.buffer;
                self.absorb_block(&block);
                self.buffered = 0;
            }
        }
    }

    pub fn finalize(mut self) -> [u8; 32] {
        let mut block = [0u8; BLOCK_LEN];
        block[..self.buffered].copy_from_slice(&self.buffer[..self.buffered]);
        block[self.buffered] = 0x80;
        self.absorb_block(&block);

        self.x[31] ^= 1;
        rounds(&mut self.x, EDGE_ROUNDS);

        let mut out = [0u8; 32];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.x.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    fn absorb_block(&mut self, block: &[u8; BLOCK_LEN]) {
        for (word, chunk) in self.x.iter_mut().zip(block.chunks_exact(4)) {
            *word ^= u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        rounds(&mut self.x, ROUNDS_PER_BLOCK);
    }
}

fn rounds(x: &mut [u32; 32], count: usize) {
    for _ in 0..count {
        round(x);
    }
}

fn round(x: &mut [u32; 32]) {
    add_rotate_swap_xor(x, 7, 8);
    swap_high(x, 2);
    add_rotate_swap_xor(x, 11, 4);
    swap_high(x, 1);
}

/// add x0 into x1, rotate x0, swap x0 halves at `stride`, xor x1 into x0
fn add_rotate_swap_xor(x: &mut [u32; 32], rotation: u32, stride: usize) {
    for i in 0..16 {
        x[16 + i] = x[16 + i].wrapping_add(x[i]);
    }
    for word in x[..16].iter_mut() {
        *word = word.rotate_left(rotation);
    }
    for i in (0..16).filter(|i| i & stride == 0) {
        x.swap(i, i + stride);
    }
    for i in 0..16 {
        x[i] ^= x[16 + i];
    }
}

fn swap_high(x: &mut [u32; 32], stride: usize) {
    for i in (16..32).filter(|i| i & stride == 0) {
        x.swap(i, i + stride);
    }
}
