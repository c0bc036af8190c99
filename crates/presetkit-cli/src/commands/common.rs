//! Shared CLI helpers used across multiple commands.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use presetkit_core::Endianness;

/// Byte order flag.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum EndianArg {
    /// Little-endian (what VST3 hosts write)
    #[default]
    Little,
    /// Big-endian
    Big,
}

impl From<EndianArg> for Endianness {
    fn from(arg: EndianArg) -> Self {
        match arg {
            EndianArg::Little => Endianness::Little,
            EndianArg::Big => Endianness::Big,
        }
    }
}

/// Parse a `NAME=VALUE` integer constant for clap's `value_parser`.
pub fn parse_define(s: &str) -> Result<(String, i64), String> {
    let Some((name, value)) = s.split_once('=') else {
        return Err(format!("invalid constant '{s}' (expected NAME=VALUE)"));
    };
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("invalid constant '{s}': '{value}' is not an integer"))?;
    Ok((name.trim().to_string(), value))
}

/// Expand `inputs` into files: files are kept as given, directories are
/// searched recursively for entries accepted by `keep`. The result is sorted
/// and deduplicated.
pub fn collect_inputs(inputs: &[PathBuf], ext: &str, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(
                presetkit_config::paths::find_files(input, ext)
                    .into_iter()
                    .filter(|p| keep(p)),
            );
        } else {
            files.push(input.clone());
        }
    }
    files.sort();
    files.dedup();
    files
}

/// Pipeline stage a batch input failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the input file.
    Read,
    /// Schema extraction.
    Extract,
    /// Container parsing or chunk access.
    Container,
    /// Component state decoding.
    Decode,
    /// Writing an artifact.
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Read => "read",
            Stage::Extract => "extract",
            Stage::Container => "container",
            Stage::Decode => "decode",
            Stage::Write => "write",
        })
    }
}

/// Per-input outcome tracking for batch commands.
///
/// A failure is reported as soon as it happens and the batch continues; the
/// command fails at the end if anything failed.
#[derive(Debug, Default)]
pub struct BatchReport {
    succeeded: usize,
    failed: usize,
}

impl BatchReport {
    /// Record a success.
    pub fn ok(&mut self) {
        self.succeeded += 1;
    }

    /// Record and print a failure as `error: <path> [<stage>]: <reason>`.
    pub fn fail(&mut self, path: &Path, stage: Stage, err: &dyn std::error::Error) {
        self.failed += 1;
        let mut reason = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            let cause_text = cause.to_string();
            if !reason.contains(&cause_text) {
                reason.push_str(": ");
                reason.push_str(&cause_text);
            }
            source = cause.source();
        }
        tracing::debug!(path = %path.display(), %stage, "input failed");
        eprintln!("error: {} [{}]: {}", path.display(), stage, reason);
    }

    /// Number of failed inputs.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Print the summary and fail if any input failed.
    pub fn finish(self, what: &str) -> anyhow::Result<()> {
        let total = self.succeeded + self.failed;
        println!("{} of {} {} processed", self.succeeded, total, what);
        if self.failed > 0 {
            anyhow::bail!("{} of {} {} failed", self.failed, total, what);
        }
        Ok(())
    }
}

/// Progress bar for a batch of `len` inputs.
pub fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_define_accepts_name_value() {
        assert_eq!(parse_define("nVoice=32"), Ok(("nVoice".to_string(), 32)));
        assert_eq!(parse_define(" n = -4 "), Ok(("n".to_string(), -4)));
    }

    #[test]
    fn parse_define_rejects_bad_input() {
        assert!(parse_define("nVoice").is_err());
        assert!(parse_define("nVoice=many").is_err());
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Container.to_string(), "container");
        assert_eq!(Stage::Decode.to_string(), "decode");
    }

    #[test]
    fn report_counts_failures() {
        let mut report = BatchReport::default();
        report.ok();
        let err = std::io::Error::other("boom");
        report.fail(Path::new("a.vstpreset"), Stage::Read, &err);
        assert_eq!(report.failed(), 1);
        assert!(report.finish("presets").is_err());

        let mut clean = BatchReport::default();
        clean.ok();
        assert!(clean.finish("presets").is_ok());
    }

    #[test]
    fn endian_arg_maps_to_endianness() {
        assert_eq!(Endianness::from(EndianArg::Big), Endianness::Big);
        assert_eq!(Endianness::from(EndianArg::default()), Endianness::Little);
    }
}
