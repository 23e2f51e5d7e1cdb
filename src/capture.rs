//! Vector capture switchboard.
//!
//! Which stage boundaries get written is decided once, before the run, by a
//! [`CaptureSet`]. The [`Switchboard`] holds one input and one output stream
//! per captured stage and appends a hex line to each at every boundary.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;

use crate::chain::{Stage, StageObserver};
use crate::error::{Result, VectorError};
use crate::hasher::Digest;
use crate::hexline::write_hex_line;

/// Stages whose boundaries are written to disk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaptureSet(BTreeSet<Stage>);

impl CaptureSet {
    pub fn none() -> Self {
        Self::default()
    }

    /// The memory-hard stage only: the module under test in the reference
    /// testbench.
    pub fn reference() -> Self {
        [Stage::Lyra2].into_iter().collect()
    }

    pub fn all() -> Self {
        Stage::ALL.into_iter().collect()
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.0.contains(&stage)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stages in chain order.
    pub fn iter(&self) -> impl Iterator<Item = Stage> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Stage> for CaptureSet {
    fn from_iter<I: IntoIterator<Item = Stage>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for CaptureSet {
    type Err = VectorError;

    /// Comma separated stage names or ordinals; `none` (or nothing) disables
    /// capture.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(Self::none());
        }
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Stage::from_str)
            .collect()
    }
}

impl fmt::Display for CaptureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.iter().map(Stage::name).collect();
        f.write_str(&names.join(","))
    }
}

/// Where vector files live.
///
/// Nested layout: `<root>/hdl/<module>/sim/vectors/<stem>_in.txt`, matching the
/// HDL project tree. Flat layout drops the files directly into `root`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VectorLayout {
    pub root: PathBuf,
    pub flat: bool,
}

impl Default for VectorLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            flat: false,
        }
    }
}

impl VectorLayout {
    pub fn nested(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            flat: false,
        }
    }

    pub fn flat(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            flat: true,
        }
    }

    pub fn directory(&self, stage: Stage) -> PathBuf {
        if self.flat {
            self.root.clone()
        } else {
            self.root
                .join("hdl")
                .join(stage.module_dir())
                .join("sim")
                .join("vectors")
        }
    }

    pub fn input_path(&self, stage: Stage) -> PathBuf {
        self.directory(stage)
            .join(format!("{}_in.txt", stage.vector_stem()))
    }

    pub fn output_path(&self, stage: Stage) -> PathBuf {
        self.directory(stage)
            .join(format!("{}_ref_out.txt", stage.vector_stem()))
    }
}

/// Line count of one closed stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamReport {
    pub stage: Stage,
    pub path: PathBuf,
    pub lines: u64,
}

struct Sink<W: Write> {
    path: PathBuf,
    writer: W,
    lines: u64,
}

impl<W: Write> Sink<W> {
    fn new(path: PathBuf, writer: W) -> Self {
        Self {
            path,
            writer,
            lines: 0,
        }
    }

    fn append(&mut self, buffer: &[u8]) -> Result<()> {
        write_hex_line(&mut self.writer, buffer).map_err(|source| VectorError::StreamWrite {
            path: self.path.clone(),
            source,
        })?;
        self.lines += 1;
        Ok(())
    }

    fn close(mut self, stage: Stage) -> Result<StreamReport> {
        self.writer.flush().map_err(|source| VectorError::StreamWrite {
            path: self.path.clone(),
            source,
        })?;
        Ok(StreamReport {
            stage,
            path: self.path,
            lines: self.lines,
        })
    }
}

struct Channel<W: Write> {
    stage: Stage,
    input: Sink<W>,
    output: Sink<W>,
}

/// Open streams for every captured stage, kept for the whole run.
pub struct Switchboard<W: Write> {
    channels: Vec<Channel<W>>,
}

impl Switchboard<BufWriter<File>> {
    /// Open (truncate) both files of every captured stage.
    ///
    /// Fails on the first stream that cannot be opened; nothing is written
    /// to any stream before all of them are open.
    pub fn open(capture: &CaptureSet, layout: &VectorLayout, create_dirs: bool) -> Result<Self> {
        let mut channels = Vec::new();
        for stage in capture.iter() {
            if create_dirs {
                let dir = layout.directory(stage);
                fs::create_dir_all(&dir).map_err(|source| VectorError::StreamOpen {
                    path: dir.clone(),
                    source,
                })?;
            }
            let input = open_stream(layout.input_path(stage))?;
            let output = open_stream(layout.output_path(stage))?;
            channels.push(Channel {
                stage,
                input,
                output,
            });
        }
        Ok(Self { channels })
    }
}

fn open_stream(path: PathBuf) -> Result<Sink<BufWriter<File>>> {
    let file = File::create(&path).map_err(|source| VectorError::StreamOpen {
        path: path.clone(),
        source,
    })?;
    debug!("Opened {}", path.display());
    Ok(Sink::new(path, BufWriter::new(file)))
}

impl<W: Write> Switchboard<W> {
    /// Build from already-open writers, `(stage, input, output)`.
    pub fn from_writers(streams: impl IntoIterator<Item = (Stage, W, W)>) -> Self {
        let layout = VectorLayout::flat(PathBuf::new());
        let mut channels: Vec<Channel<W>> = streams
            .into_iter()
            .map(|(stage, input, output)| Channel {
                stage,
                input: Sink::new(layout.input_path(stage), input),
                output: Sink::new(layout.output_path(stage), output),
            })
            .collect();
        channels.sort_by_key(|channel| channel.stage);
        Self { channels }
    }

    pub fn captures(&self, stage: Stage) -> bool {
        self.channel(stage).is_some()
    }

    /// Flush and close every stream, input before output, in chain order.
    pub fn finish(self) -> Result<Vec<StreamReport>> {
        let mut reports = Vec::with_capacity(self.channels.len() * 2);
        for channel in self.channels {
            reports.push(channel.input.close(channel.stage)?);
            reports.push(channel.output.close(channel.stage)?);
        }
        Ok(reports)
    }

    fn channel(&self, stage: Stage) -> Option<&Channel<W>> {
        self.channels.iter().find(|c| c.stage == stage)
    }

    fn channel_mut(&mut self, stage: Stage) -> Option<&mut Channel<W>> {
        self.channels.iter_mut().find(|c| c.stage == stage)
    }
}

impl<W: Write> StageObserver for Switchboard<W> {
    fn before_stage(&mut self, stage: Stage, input: &[u8]) -> Result<()> {
        match self.channel_mut(stage) {
            Some(channel) => channel.input.append(input),
            None => Ok(()),
        }
    }

    fn after_stage(&mut self, stage: Stage, output: &Digest) -> Result<()> {
        match self.channel_mut(stage) {
            Some(channel) => channel.output.append(output.as_bytes()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainPipeline;
    use crate::input::{InputGenerator, LibcRand};
    use std::io;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_capture_set_parsing() {
        assert_eq!("lyra2".parse::<CaptureSet>().unwrap(), CaptureSet::reference());
        assert_eq!("none".parse::<CaptureSet>().unwrap(), CaptureSet::none());
        let set: CaptureSet = "bmw,1, cube1".parse().unwrap();
        let stages: Vec<_> = set.iter().collect();
        assert_eq!(stages, [Stage::Blake, Stage::CubeFirst, Stage::Bmw]);
        assert_eq!(set.to_string(), "blake,cube1,bmw");
        assert!(set.contains(Stage::Bmw) && !set.contains(Stage::Lyra2));
        assert!("lyra2,sha256".parse::<CaptureSet>().is_err());
        assert_eq!(CaptureSet::all().iter().count(), 7);
    }

    #[test]
    fn test_nested_layout_paths() {
        let layout = VectorLayout::nested("/proj");
        assert_eq!(
            layout.input_path(Stage::Lyra2),
            PathBuf::from("/proj/hdl/lyra2/sim/vectors/lyra2_in.txt")
        );
        assert_eq!(
            layout.output_path(Stage::CubeSecond),
            PathBuf::from("/proj/hdl/cubehash/sim/vectors/cube2_ref_out.txt")
        );
        let flat = VectorLayout::flat("out");
        assert_eq!(flat.input_path(Stage::Blake), PathBuf::from("out/blake_in.txt"));
    }

    #[test]
    fn test_disabled_stages_write_nothing() {
        let (mut lyra_in, mut lyra_out) = (Vec::new(), Vec::new());
        let mut board = Switchboard::from_writers([(Stage::Lyra2, &mut lyra_in, &mut lyra_out)]);
        assert!(board.captures(Stage::Lyra2));
        assert!(!board.captures(Stage::Blake));

        let mut generator = InputGenerator::new(LibcRand::new(0));
        ChainPipeline::default()
            .run(&generator.next_block(), &mut board)
            .unwrap();
        let reports = board.finish().unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.lines == 1));
        assert_eq!(
            lyra_in,
            b"4acae4ce8e8cd4f8678c5527f65c50777984ae9a5cbbf8d7f1b42bf018ffb6a9\n"
        );
        assert_eq!(
            lyra_out,
            b"c9096ae6c2ab5caa681e3ab1d0f98b87f71a97a8c93142553b902fc1cd92e33d\n"
        );
    }

    #[test]
    fn test_line_counts_and_widths_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let layout = VectorLayout::nested(dir.path());
        let capture = CaptureSet::all();
        let mut board = Switchboard::open(&capture, &layout, true).unwrap();

        let pipeline = ChainPipeline::default();
        let mut generator = InputGenerator::new(LibcRand::new(0));
        for _ in 0..3 {
            pipeline.run(&generator.next_block(), &mut board).unwrap();
        }
        let reports = board.finish().unwrap();
        assert_eq!(reports.len(), 14);

        for report in reports {
            assert_eq!(report.lines, 3);
            let text = fs::read_to_string(&report.path).unwrap();
            let is_input = report.path.to_string_lossy().ends_with("_in.txt");
            let width = if is_input { report.stage.input_len() * 2 } else { 64 };
            assert_eq!(text.lines().count(), 3, "{}", report.path.display());
            assert!(text.ends_with('\n'));
            assert!(text.lines().all(|line| line.len() == width));
        }
    }

    #[test]
    fn test_missing_directory_fails_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let layout = VectorLayout::nested(dir.path());
        let err = Switchboard::open(&CaptureSet::reference(), &layout, false)
            .err()
            .unwrap();
        match err {
            VectorError::StreamOpen { path, .. } => {
                assert_eq!(path, layout.input_path(Stage::Lyra2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_failure_names_the_stream() {
        let mut board = Switchboard::from_writers([(Stage::Blake, BrokenPipe, BrokenPipe)]);
        let mut generator = InputGenerator::new(LibcRand::new(0));
        let err = ChainPipeline::default()
            .run(&generator.next_block(), &mut board)
            .unwrap_err();
        match err {
            VectorError::StreamWrite { path, .. } => assert_eq!(path, PathBuf::from("blake_in.txt")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
