/*!
# Stage adapters

Uniform surface over the chain primitives: `init`/`absorb`/`finalize` for the
fixed-output hashes and a single `derive` call for the memory-hard stage.
Every stage produces a 32-byte [`Digest`].
*/

use std::fmt;

use sha3::{Digest as Sha3Digest, Keccak256};

use crate::error::{Result, VectorError};
use crate::primitives::{lyra2, Blake256, Bmw256, CubeHash256, Lyra2Params, Skein512_256};

pub const DIGEST_LEN: usize = 32;

/// Output of any chain stage.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(self.0))
    }
}

/// A fixed-output hash used as one chain stage.
///
/// `finalize` consumes the context, so a context can never carry state from
/// one message into the next.
pub trait StageHasher: Sized {
    fn init() -> Self;

    fn absorb(&mut self, data: &[u8]);

    fn finalize(self) -> Digest;

    fn digest(data: &[u8]) -> Digest {
        let mut ctx = Self::init();
        ctx.absorb(data);
        ctx.finalize()
    }
}

/// Memory-hard stage: one call per message, no context.
pub trait MemoryHardHasher {
    /// Errors are the collaborator's own report, surfaced as fatal by the chain.
    fn derive(&self, password: &[u8], salt: &[u8]) -> std::result::Result<Digest, String>;
}

impl StageHasher for Blake256 {
    fn init() -> Self {
        Blake256::new()
    }

    fn absorb(&mut self, data: &[u8]) {
        self.update(data);
    }

    fn finalize(self) -> Digest {
        Digest(Blake256::finalize(self))
    }
}

impl StageHasher for CubeHash256 {
    fn init() -> Self {
        CubeHash256::new()
    }

    fn absorb(&mut self, data: &[u8]) {
        self.update(data);
    }

    fn finalize(self) -> Digest {
        Digest(CubeHash256::finalize(self))
    }
}

impl StageHasher for Skein512_256 {
    fn init() -> Self {
        Skein512_256::new()
    }

    fn absorb(&mut self, data: &[u8]) {
        self.update(data);
    }

    fn finalize(self) -> Digest {
        Digest(Skein512_256::finalize(self))
    }
}

impl StageHasher for Bmw256 {
    fn init() -> Self {
        Bmw256::new()
    }

    fn absorb(&mut self, data: &[u8]) {
        self.update(data);
    }

    fn finalize(self) -> Digest {
        Digest(Bmw256::finalize(self))
    }
}

/// Keccak-256 with the original (pre-SHA-3) padding.
pub struct KeccakStage(Keccak256);

impl StageHasher for KeccakStage {
    fn init() -> Self {
        KeccakStage(Keccak256::new())
    }

    fn absorb(&mut self, data: &[u8]) {
        Sha3Digest::update(&mut self.0, data);
    }

    fn finalize(self) -> Digest {
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&self.0.finalize());
        Digest(out)
    }
}

/// Lyra2 bound to one cost configuration, 32-byte output.
#[derive(Clone, Copy, Debug)]
pub struct Lyra2Stage {
    params: Lyra2Params,
}

impl Lyra2Stage {
    pub fn new(params: Lyra2Params) -> Result<Self> {
        params.validate().map_err(VectorError::InvalidParameter)?;
        Ok(Self { params })
    }

    pub fn params(&self) -> Lyra2Params {
        self.params
    }
}

impl Default for Lyra2Stage {
    fn default() -> Self {
        Self {
            params: Lyra2Params::default(),
        }
    }
}

impl MemoryHardHasher for Lyra2Stage {
    fn derive(&self, password: &[u8], salt: &[u8]) -> std::result::Result<Digest, String> {
        let mut out = [0u8; DIGEST_LEN];
        lyra2::derive(&mut out, password, salt, &self.params)?;
        Ok(Digest(out))
    }
}
