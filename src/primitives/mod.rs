/*!
# Chain primitives

Fixed-output hashes and the memory-hard function used by the chain. Keccak-256
comes from the `sha3` crate; the remaining functions have no maintained crate
and live here. Each module carries its own known-answer tests; the pipeline
only reaches them through [`crate::hasher`].
*/

pub mod blake256;
pub mod bmw;
pub mod cubehash;
pub mod lyra2;
pub mod skein;

pub use blake256::Blake256;
pub use bmw::Bmw256;
pub use cubehash::CubeHash256;
pub use lyra2::Lyra2Params;
pub use skein::Skein512_256;
