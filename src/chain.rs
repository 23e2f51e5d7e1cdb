//! The seven-stage Lyra2REv2 chain.
//!
//! Every stage always runs, in order. Capture is an observer concern: the
//! pipeline reports each stage boundary and never looks at what the observer
//! does with it.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, VectorError};
use crate::hasher::{Digest, KeccakStage, Lyra2Stage, MemoryHardHasher, StageHasher, DIGEST_LEN};
use crate::input::{Block, BLOCK_LEN};
use crate::primitives::{Blake256, Bmw256, CubeHash256, Skein512_256};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Blake,
    Keccak,
    CubeFirst,
    Lyra2,
    Skein,
    CubeSecond,
    Bmw,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Blake,
        Stage::Keccak,
        Stage::CubeFirst,
        Stage::Lyra2,
        Stage::Skein,
        Stage::CubeSecond,
        Stage::Bmw,
    ];

    /// Position in the chain, 1..=7.
    pub const fn ordinal(self) -> usize {
        self as usize + 1
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Stage> {
        ordinal
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Bytes fed into the stage.
    pub const fn input_len(self) -> usize {
        match self {
            Stage::Blake => BLOCK_LEN,
            _ => DIGEST_LEN,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Stage::Blake => "blake",
            Stage::Keccak => "keccak",
            Stage::CubeFirst => "cube1",
            Stage::Lyra2 => "lyra2",
            Stage::Skein => "skein",
            Stage::CubeSecond => "cube2",
            Stage::Bmw => "bmw",
        }
    }

    /// HDL module directory holding the stage's testbench.
    pub const fn module_dir(self) -> &'static str {
        match self {
            Stage::CubeFirst | Stage::CubeSecond => "cubehash",
            other => other.name(),
        }
    }

    pub const fn vector_stem(self) -> &'static str {
        self.name()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = VectorError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        let found = match key.parse::<usize>() {
            Ok(ordinal) => Stage::from_ordinal(ordinal),
            Err(_) => Stage::ALL.into_iter().find(|stage| stage.name() == key),
        };
        found.ok_or_else(|| VectorError::UnknownStage(s.to_string()))
    }
}

/// Sees every stage boundary of a chain run.
pub trait StageObserver {
    /// Called with the exact bytes the stage is about to consume.
    fn before_stage(&mut self, stage: Stage, input: &[u8]) -> Result<()>;

    fn after_stage(&mut self, stage: Stage, output: &Digest) -> Result<()>;
}

/// Observer that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

impl StageObserver for NoCapture {
    fn before_stage(&mut self, _stage: Stage, _input: &[u8]) -> Result<()> {
        Ok(())
    }

    fn after_stage(&mut self, _stage: Stage, _output: &Digest) -> Result<()> {
        Ok(())
    }
}

/// All seven digests of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainTrace {
    digests: [Digest; 7],
}

impl ChainTrace {
    pub fn digest(&self, stage: Stage) -> &Digest {
        &self.digests[stage.ordinal() - 1]
    }

    /// Final chain output, Digest(7).
    pub fn output(&self) -> &Digest {
        self.digest(Stage::Bmw)
    }
}

pub struct ChainPipeline<M: MemoryHardHasher = Lyra2Stage> {
    memory_hard: M,
}

impl<M: MemoryHardHasher> ChainPipeline<M> {
    pub fn new(memory_hard: M) -> Self {
        Self { memory_hard }
    }

    pub fn memory_hard(&self) -> &M {
        &self.memory_hard
    }

    /// Run one block through the chain.
    ///
    /// An observer error aborts the run at that boundary; later stages are
    /// not reported.
    pub fn run<O: StageObserver + ?Sized>(&self, block: &Block, observer: &mut O) -> Result<ChainTrace> {
        let blake = fixed_stage::<Blake256, O>(Stage::Blake, block.as_bytes(), observer)?;
        let keccak = fixed_stage::<KeccakStage, O>(Stage::Keccak, blake.as_bytes(), observer)?;
        let cube1 = fixed_stage::<CubeHash256, O>(Stage::CubeFirst, keccak.as_bytes(), observer)?;

        // Digest(3) is both password and salt
        observer.before_stage(Stage::Lyra2, cube1.as_bytes())?;
        let lyra2 = self
            .memory_hard
            .derive(cube1.as_bytes(), cube1.as_bytes())
            .map_err(|reason| VectorError::Primitive {
                stage: Stage::Lyra2,
                reason,
            })?;
        observer.after_stage(Stage::Lyra2, &lyra2)?;

        let skein = fixed_stage::<Skein512_256, O>(Stage::Skein, lyra2.as_bytes(), observer)?;
        let cube2 = fixed_stage::<CubeHash256, O>(Stage::CubeSecond, skein.as_bytes(), observer)?;
        let bmw = fixed_stage::<Bmw256, O>(Stage::Bmw, cube2.as_bytes(), observer)?;

        Ok(ChainTrace {
            digests: [blake, keccak, cube1, lyra2, skein, cube2, bmw],
        })
    }
}

impl Default for ChainPipeline<Lyra2Stage> {
    fn default() -> Self {
        Self::new(Lyra2Stage::default())
    }
}

fn fixed_stage<H: StageHasher, O: StageObserver + ?Sized>(
    stage: Stage,
    input: &[u8],
    observer: &mut O,
) -> Result<Digest> {
    observer.before_stage(stage, input)?;
    let digest = H::digest(input);
    observer.after_stage(stage, &digest)?;
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputGenerator, LibcRand};
    use std::cell::RefCell;

    fn first_block() -> Block {
        InputGenerator::new(LibcRand::new(0)).next_block()
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<(Stage, Vec<u8>, Option<Digest>)>,
    }

    impl StageObserver for Recorder {
        fn before_stage(&mut self, stage: Stage, input: &[u8]) -> Result<()> {
            self.events.push((stage, input.to_vec(), None));
            Ok(())
        }

        fn after_stage(&mut self, stage: Stage, output: &Digest) -> Result<()> {
            let last = self.events.last_mut().unwrap();
            assert_eq!(last.0, stage);
            last.2 = Some(*output);
            Ok(())
        }
    }

    /// Records its arguments and returns a digest of the password.
    #[derive(Default)]
    struct SaltSpy {
        calls: RefCell<Vec<(Vec<u8>, Vec<u8>)>>,
    }

    impl MemoryHardHasher for SaltSpy {
        fn derive(&self, password: &[u8], salt: &[u8]) -> std::result::Result<Digest, String> {
            self.calls.borrow_mut().push((password.to_vec(), salt.to_vec()));
            Ok(Blake256::digest(password))
        }
    }

    struct Failing;

    impl MemoryHardHasher for Failing {
        fn derive(&self, _password: &[u8], _salt: &[u8]) -> std::result::Result<Digest, String> {
            Err("matrix allocation refused".into())
        }
    }

    #[test]
    fn test_stage_table() {
        let names: Vec<_> = Stage::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["blake", "keccak", "cube1", "lyra2", "skein", "cube2", "bmw"]);
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.ordinal(), i + 1);
            assert_eq!(Stage::from_ordinal(i + 1), Some(*stage));
        }
        assert_eq!(Stage::from_ordinal(0), None);
        assert_eq!(Stage::from_ordinal(8), None);
        assert_eq!(Stage::Blake.input_len(), 80);
        assert_eq!(Stage::Bmw.input_len(), 32);
        assert_eq!(Stage::CubeSecond.module_dir(), "cubehash");
        assert_eq!(Stage::CubeSecond.vector_stem(), "cube2");
    }

    #[test]
    fn test_stage_parsing() {
        assert_eq!("lyra2".parse::<Stage>().unwrap(), Stage::Lyra2);
        assert_eq!(" Cube1 ".parse::<Stage>().unwrap(), Stage::CubeFirst);
        assert_eq!("7".parse::<Stage>().unwrap(), Stage::Bmw);
        assert!(matches!("8".parse::<Stage>(), Err(VectorError::UnknownStage(_))));
        assert!(matches!("groestl".parse::<Stage>(), Err(VectorError::UnknownStage(_))));
    }

    #[test]
    fn test_seed_zero_chain_digests() {
        let trace = ChainPipeline::default().run(&first_block(), &mut NoCapture).unwrap();
        let expected = [
            (Stage::Blake, "e6ede68db54bb46d46071eae42fde70e2f783c98f9499c8f38f6389832a15450"),
            (Stage::Keccak, "28df0fe45cdd08caa53c128752bc9fc49b7ed7bf3d09763b8c6ce18e03eb9d17"),
            (Stage::CubeFirst, "a9b6ff18f02bb4f1d7f8bb5c9aae847977505cf627558c67f8d48c8ecee4ca4a"),
            (Stage::Lyra2, "3de392cdc12f903b554231c9a8971af7878bf9d0b13a1e68aa5cabc2e66a09c9"),
            (Stage::Skein, "92692295fd440bcb5afe7e20c9de0ab745feefc267280f3f4be77462ded355b5"),
            (Stage::CubeSecond, "7e8d9de7f0b16fc33b4bddbef18e2121320f015886be29697e27e7ec749461a4"),
            (Stage::Bmw, "1ec7d45e06dd05f2dc23bd5a50a0f64496ad18bf3b99a61d5e932e67cd908c5a"),
        ];
        for (stage, digest) in expected {
            assert_eq!(hex::encode(trace.digest(stage).as_bytes()), digest, "{stage}");
        }
        assert_eq!(trace.output(), trace.digest(Stage::Bmw));
    }

    #[test]
    fn test_observer_sees_every_boundary_in_order() {
        let block = first_block();
        let mut recorder = Recorder::default();
        let trace = ChainPipeline::default().run(&block, &mut recorder).unwrap();

        assert_eq!(recorder.events.len(), 7);
        let mut expected_input = block.as_bytes().to_vec();
        for ((stage, input, output), want) in recorder.events.iter().zip(Stage::ALL) {
            assert_eq!(*stage, want);
            assert_eq!(input.len(), stage.input_len());
            assert_eq!(*input, expected_input);
            let output = output.unwrap();
            assert_eq!(output, *trace.digest(*stage));
            expected_input = output.as_bytes().to_vec();
        }
    }

    #[test]
    fn test_memory_hard_stage_is_self_salted() {
        let pipeline = ChainPipeline::new(SaltSpy::default());
        let mut generator = InputGenerator::new(LibcRand::new(0));
        for _ in 0..4 {
            let trace = pipeline.run(&generator.next_block(), &mut NoCapture).unwrap();
            let calls = pipeline.memory_hard().calls.borrow();
            let (password, salt) = calls.last().unwrap();
            assert_eq!(password, salt);
            assert_eq!(password.as_slice(), trace.digest(Stage::CubeFirst).as_bytes());
        }
        assert_eq!(pipeline.memory_hard().calls.borrow().len(), 4);
    }

    #[test]
    fn test_downstream_depends_only_on_memory_hard_output() {
        // same Digest(4) from a different memory-hard stage gives the same tail
        let block = first_block();
        let reference = ChainPipeline::default().run(&block, &mut NoCapture).unwrap();
        let spy = ChainPipeline::new(SaltSpy::default()).run(&block, &mut NoCapture).unwrap();

        for stage in [Stage::Blake, Stage::Keccak, Stage::CubeFirst] {
            assert_eq!(reference.digest(stage), spy.digest(stage));
        }
        let tail = Bmw256::digest(
            CubeHash256::digest(Skein512_256::digest(reference.digest(Stage::Lyra2).as_bytes()).as_bytes())
                .as_bytes(),
        );
        assert_eq!(*reference.output(), tail);
    }

    #[test]
    fn test_primitive_failure_is_fatal() {
        let mut recorder = Recorder::default();
        let err = ChainPipeline::new(Failing)
            .run(&first_block(), &mut recorder)
            .unwrap_err();
        match err {
            VectorError::Primitive { stage, reason } => {
                assert_eq!(stage, Stage::Lyra2);
                assert!(reason.contains("refused"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // stage 4 input was reported, nothing after it
        assert_eq!(recorder.events.len(), 4);
        assert!(recorder.events[3].2.is_none());
    }
}
