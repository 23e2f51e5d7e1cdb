//! Lyra2 password hashing scheme, sponge built on the BLAKE2b round
//! function (768-bit rate, one reduced round per duplexing).
//!
//! Matches the reference `LYRA2(K, kLen, pwd, pwdlen, salt, saltlen, T, R, C)`
//! entry point used by Lyra2REv2 for `C = 4`. For any other column count the
//! reference steps through pad(pwd || salt || basil) 64 words at a time and
//! reads past the padded input; this module always absorbs contiguous 8-word
//! blocks, so only `cols = 4` reproduces reference vectors once the input
//! spans more than one block.

use std::fmt;

const BLOCK_WORDS: usize = 12;
const BLOCK_BYTES: usize = BLOCK_WORDS * 8;
/// Rate used while absorbing pad(pwd || salt || basil).
const SAFE_BLOCK_WORDS: usize = 8;
const SAFE_BLOCK_BYTES: usize = SAFE_BLOCK_WORDS * 8;
const FULL_ROUNDS: usize = 12;
const BASIL_WORDS: usize = 6;

const BLAKE2B_IV: [u64; 8] = [
    0x6a09_e667_f3bc_c908,
    0xbb67_ae85_84ca_a73b,
    0x3c6e_f372_fe94_f82b,
    0xa54f_f53a_5f1d_36f1,
    0x510e_527f_ade6_82d1,
    0x9b05_688c_2b3e_6c1f,
    0x1f83_d9ab_fb41_bd6b,
    0x5be0_cd19_137e_2179,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lyra2Params {
    pub time_cost: u64,
    pub rows: u64,
    pub cols: u64,
}

impl Default for Lyra2Params {
    fn default() -> Self {
        Self {
            time_cost: 1,
            rows: 4,
            cols: 4,
        }
    }
}

impl fmt::Display for Lyra2Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={} rows={} cols={}", self.time_cost, self.rows, self.cols)
    }
}

impl Lyra2Params {
    pub fn validate(&self) -> Result<(), String> {
        if self.time_cost == 0 {
            return Err("time cost must be at least 1".into());
        }
        // rows are masked with (rows - 1) while wandering
        if self.rows < 4 || !self.rows.is_power_of_two() {
            return Err(format!("row count {} must be a power of two >= 4", self.rows));
        }
        if self.cols == 0 {
            return Err("column count must be at least 1".into());
        }
        Ok(())
    }

    /// Whether outputs for `password.len() + salt.len()` input bytes agree with
    /// the reference C implementation.
    pub fn matches_reference(&self, input_len: usize) -> bool {
        self.cols == 4 || input_len + BASIL_WORDS * 8 < SAFE_BLOCK_BYTES
    }
}

/// Fill `out` with Lyra2(pwd, salt) under `params`.
pub fn derive(out: &mut [u8], password: &[u8], salt: &[u8], params: &Lyra2Params) -> Result<(), String> {
    params.validate()?;
    if out.is_empty() {
        return Err("output length must be at least 1".into());
    }

    let rows = params.rows as usize;
    let cols = params.cols as usize;
    let row_words = BLOCK_WORDS * cols;
    let mut matrix = vec![0u64; row_words * rows];

    let mut state = [0u64; 16];
    state[8..].copy_from_slice(&BLAKE2B_IV);

    // Setup: absorb pad(pwd || salt || basil)
    for block in padded_input(out.len(), password, salt, params).chunks_exact(SAFE_BLOCK_WORDS) {
        for (s, w) in state.iter_mut().zip(block) {
            *s ^= w;
        }
        blake2b_lyra(&mut state, FULL_ROUNDS);
    }

    // M[0]: squeezed in reverse column order
    for col in 0..cols {
        let out_at = (cols - 1 - col) * BLOCK_WORDS;
        matrix[out_at..out_at + BLOCK_WORDS].copy_from_slice(&state[..BLOCK_WORDS]);
        blake2b_lyra(&mut state, 1);
    }

    // M[1] = M[0] xor rand, reverse column order
    for col in 0..cols {
        let in_at = col * BLOCK_WORDS;
        let out_at = row_words + (cols - 1 - col) * BLOCK_WORDS;
        for j in 0..BLOCK_WORDS {
            state[j] ^= matrix[in_at + j];
        }
        blake2b_lyra(&mut state, 1);
        for j in 0..BLOCK_WORDS {
            matrix[out_at + j] = matrix[in_at + j] ^ state[j];
        }
    }

    let mut row = 2usize;
    let mut prev = 1usize;
    let mut row_star = 0usize;
    let mut step = 1i64;
    let mut window = 2i64;
    let mut gap = 1i64;

    while row < rows {
        for col in 0..cols {
            let in_at = prev * row_words + col * BLOCK_WORDS;
            let inout_at = row_star * row_words + col * BLOCK_WORDS;
            let out_at = row * row_words + (cols - 1 - col) * BLOCK_WORDS;
            for j in 0..BLOCK_WORDS {
                state[j] ^= matrix[in_at + j].wrapping_add(matrix[inout_at + j]);
            }
            blake2b_lyra(&mut state, 1);
            for j in 0..BLOCK_WORDS {
                matrix[out_at + j] = matrix[in_at + j] ^ state[j];
            }
            xor_rotated(&mut matrix[inout_at..inout_at + BLOCK_WORDS], &state);
        }

        row_star = ((row_star as i64 + step) & (window - 1)) as usize;
        prev = row;
        row += 1;

        if row_star == 0 {
            step = window + gap;
            window *= 2;
            gap = -gap;
        }
    }

    // Wandering
    let row_mask = rows - 1;
    row = 0;
    for tau in 1..=params.time_cost {
        let step = if tau % 2 == 0 { -1i64 } else { (rows / 2) as i64 - 1 };
        loop {
            row_star = (state[0] as usize) & row_mask;
            for col in 0..cols {
                let in_at = prev * row_words + col * BLOCK_WORDS;
                let inout_at = row_star * row_words + col * BLOCK_WORDS;
                let out_at = row * row_words + col * BLOCK_WORDS;
                for j in 0..BLOCK_WORDS {
                    state[j] ^= matrix[in_at + j].wrapping_add(matrix[inout_at + j]);
                }
                blake2b_lyra(&mut state, 1);
                for j in 0..BLOCK_WORDS {
                    matrix[out_at + j] ^= state[j];
                }
                xor_rotated(&mut matrix[inout_at..inout_at + BLOCK_WORDS], &state);
            }

            prev = row;
            row = ((row as i64 + step) as usize) & row_mask;
            if row == 0 {
                break;
            }
        }
    }

    // Wrap-up
    let last_at = row_star * row_words;
    for j in 0..BLOCK_WORDS {
        state[j] ^= matrix[last_at + j];
    }
    blake2b_lyra(&mut state, FULL_ROUNDS);
    squeeze(&mut state, out);
    Ok(())
}

fn padded_input(out_len: usize, password: &[u8], salt: &[u8], params: &Lyra2Params) -> Vec<u64> {
    let payload = password.len() + salt.len();
    let blocks = (payload + BASIL_WORDS * 8) / SAFE_BLOCK_BYTES + 1;
    let mut bytes = vec![0u8; blocks * SAFE_BLOCK_BYTES];

    bytes[..password.len()].copy_from_slice(password);
    bytes[password.len()..payload].copy_from_slice(salt);

    let basil = [
        out_len as u64,
        password.len() as u64,
        salt.len() as u64,
        params.time_cost,
        params.rows,
        params.cols,
    ];
    let mut at = payload;
    for value in basil {
        bytes[at..at + 8].copy_from_slice(&value.to_le_bytes());
        at += 8;
    }
    bytes[at] = 0x80;
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;

    bytes
        .chunks_exact(8)
        .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect()
}

/// M[row*] ^= rotW(rand): word j takes state word (j + 11) mod 12.
fn xor_rotated(block: &mut [u64], state: &[u64; 16]) {
    for (j, word) in block.iter_mut().enumerate() {
        *word ^= state[(j + BLOCK_WORDS - 1) % BLOCK_WORDS];
    }
}

fn squeeze(state: &mut [u64; 16], out: &mut [u8]) {
    let mut chunks = out.chunks_mut(BLOCK_BYTES).peekable();
    while let Some(chunk) = chunks.next() {
        let mut rate = [0u8; BLOCK_BYTES];
        for (bytes, word) in rate.chunks_exact_mut(8).zip(state.iter()) {
            bytes.copy_from_slice(&word.to_le_bytes());
        }
        chunk.copy_from_slice(&rate[..chunk.len()]);
        if chunk.len() == BLOCK_BYTES && chunks.peek().is_some() {
            blake2b_lyra(state, FULL_ROUNDS);
        }
    }
}

fn blake2b_lyra(v: &mut [u64; 16], rounds: usize) {
    for _ in 0..rounds {
        g(v, 0, 4, 8, 12);
        g(v, 1, 5, 9, 13);
        g(v, 2, 6, 10, 14);
        g(v, 3, 7, 11, 15);
        g(v, 0, 5, 10, 15);
        g(v, 1, 6, 11, 12);
        g(v, 2, 7, 8, 13);
        g(v, 3, 4, 9, 14);
    }
}

#[inline(always)]
fn g(v: &mut [u64; 16], a: usize, b: usize, c: usize, d: usize) {
    v[a] = v[a].wrapping_add(v[b]);
    v[d] = (v[d] ^ v[a]).rotate_right(32);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(24);
    v[a] = v[a].wrapping_add(v[b]);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(63);
}
