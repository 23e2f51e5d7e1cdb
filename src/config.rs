use crate::capture::{CaptureSet, VectorLayout};
use crate::input::RngKind;
use crate::primitives::Lyra2Params;

pub const DEFAULT_ITERATIONS: u64 = 1000;
pub const DEFAULT_SEED: u32 = 0;

/// Everything a generation run needs, fixed before the first block is drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub iterations: u64,
    pub seed: u32,
    pub rng: RngKind,
    pub lyra2: Lyra2Params,
    pub capture: CaptureSet,
    pub layout: VectorLayout,
    /// Create missing vector directories instead of failing.
    pub create_dirs: bool,
}

impl Default for GeneratorConfig {
    /// The reference testbench configuration: 1000 iterations from seed 0,
    /// Lyra2 at t=1 with a 4x4 matrix, memory-hard stage captured.
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            seed: DEFAULT_SEED,
            rng: RngKind::Libc,
            lyra2: Lyra2Params::default(),
            capture: CaptureSet::reference(),
            layout: VectorLayout::default(),
            create_dirs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Stage;

    #[test]
    fn test_default_is_reference_configuration() {
        let config = GeneratorConfig::default();
        assert_eq!(config.iterations, 1000);
        assert_eq!(config.seed, 0);
        assert_eq!(config.rng, RngKind::Libc);
        assert_eq!(config.lyra2.to_string(), "t=1 rows=4 cols=4");
        assert_eq!(config.capture.iter().collect::<Vec<_>>(), [Stage::Lyra2]);
        assert!(!config.layout.flat);
        assert!(!config.create_dirs);
    }
}
