//! Append-only checkpoint log.
//!
//! The log is both the human-readable audit trail of a run and its sole
//! resume mechanism. One file per run:
//!
//! ```text
//! RUN noise=on slow=off layers=1 zne=on rot=on
//! STOPPING max_steps=1000 stopping_delta=0.001
//!
//! STEP 0 index=39
//!   COST -13.248
//!   CHANGE 0.5
//!   PARAMS 0.1,0.2,...
//! ```
//!
//! Writer and parser share one line-prefix + key=value grammar; there is
//! no positional string slicing anywhere. Each step block is formatted
//! into a buffer and appended with a single write followed by a flush, so
//! an interrupt between steps always leaves a parseable, resumable file.
//! Float values round-trip exactly through Rust's shortest-representation
//! `Display`.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{VqeError, VqeResult};
use crate::schedule::IndexSchedule;
use crate::variant::PARAMS_PER_LAYER;

/// Run configuration encoded in the log header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Whether the run targets a noisy service.
    pub noise: bool,
    /// Noise-free but full-simulation ("slow") mode.
    pub slow: bool,
    /// Ansatz depth.
    pub layers: usize,
    /// Zero-noise extrapolation over CNOT multipliers enabled.
    pub zne: bool,
    /// Rotation symmetry averaging enabled.
    pub rot: bool,
}

impl RunConfig {
    fn header_line(&self) -> String {
        format!(
            "RUN noise={} slow={} layers={} zne={} rot={}",
            onoff(self.noise),
            onoff(self.slow),
            self.layers,
            onoff(self.zne),
            onoff(self.rot),
        )
    }

    fn parse(line: &str) -> VqeResult<Self> {
        let mut fields = Fields::parse("RUN", line)?;
        let config = Self {
            noise: fields.take_bool("noise")?,
            slow: fields.take_bool("slow")?,
            layers: fields.take_parsed("layers")?,
            zne: fields.take_bool("zne")?,
            rot: fields.take_bool("rot")?,
        };
        fields.finish()?;
        Ok(config)
    }
}

/// Stopping criteria encoded in the log header.
#[derive(Debug, Clone, PartialEq)]
pub struct StoppingCriteria {
    /// Hard step budget.
    pub max_steps: usize,
    /// Convergence threshold on the per-step cost change.
    pub stopping_delta: f64,
}

impl StoppingCriteria {
    fn header_line(&self) -> String {
        format!(
            "STOPPING max_steps={} stopping_delta={}",
            self.max_steps, self.stopping_delta
        )
    }

    fn parse(line: &str) -> VqeResult<Self> {
        let mut fields = Fields::parse("STOPPING", line)?;
        let stopping = Self {
            max_steps: fields.take_parsed("max_steps")?,
            stopping_delta: fields.take_parsed("stopping_delta")?,
        };
        fields.finish()?;
        Ok(stopping)
    }
}

/// One completed optimization step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    /// Step number, 0-based.
    pub step: usize,
    /// Parameter index varied in this step.
    pub index: usize,
    /// Cost after the update.
    pub cost: f64,
    /// Cost change achieved by the update (previous − new).
    pub change: f64,
    /// Full parameter vector after the update.
    pub theta: Vec<f64>,
}

impl StepRecord {
    fn format_block(&self) -> String {
        let params = self
            .theta
            .iter()
            .map(f64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "STEP {} index={}\n  COST {}\n  CHANGE {}\n  PARAMS {}\n",
            self.step, self.index, self.cost, self.change, params
        )
    }
}

/// Sink for per-step checkpoint records.
pub trait CheckpointSink {
    /// Persist one completed step. Must be all-or-nothing.
    fn append(&mut self, record: &StepRecord) -> VqeResult<()>;
}

/// Collecting sink; used by tests and dry runs.
impl CheckpointSink for Vec<StepRecord> {
    fn append(&mut self, record: &StepRecord) -> VqeResult<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Append-only writer for one run's log file.
pub struct CheckpointWriter {
    file: File,
    path: PathBuf,
}

impl CheckpointWriter {
    /// Create a fresh log and write its header. Fails if the file exists.
    pub fn create(
        path: impl Into<PathBuf>,
        config: &RunConfig,
        stopping: &StoppingCriteria,
    ) -> VqeResult<Self> {
        let path = path.into();
        let mut file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)?;
        let header = format!(
            "{}\n{}\n\n",
            config.header_line(),
            stopping.header_line()
        );
        file.write_all(header.as_bytes())?;
        file.flush()?;
        Ok(Self { file, path })
    }

    /// Reopen an existing log for appending; the header is not rewritten.
    pub fn resume(path: impl Into<PathBuf>) -> VqeResult<Self> {
        let path = path.into();
        let file = OpenOptions::new().append(true).open(&path)?;
        Ok(Self { file, path })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointSink for CheckpointWriter {
    fn append(&mut self, record: &StepRecord) -> VqeResult<()> {
        let block = record.format_block();
        self.file.write_all(block.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}

/// Everything a resumed run needs, reconstructed from the log.
#[derive(Debug, Clone)]
pub struct ResumeState {
    /// Run configuration from the header.
    pub config: RunConfig,
    /// Stopping criteria from the header.
    pub stopping: StoppingCriteria,
    /// Number of completed steps; also the next step number.
    pub completed_steps: usize,
    /// Cost after the last completed step, if any step was recorded.
    pub cost: Option<f64>,
    /// Parameter vector after the last completed step.
    pub theta: Option<Vec<f64>>,
    /// Last step whose change reached the stopping delta, re-derived from
    /// the recorded CHANGE values.
    pub last_significant_change: Option<usize>,
}

/// Read and parse a checkpoint log file.
pub fn read_log(path: &Path) -> VqeResult<ResumeState> {
    let text = std::fs::read_to_string(path)?;
    parse_log(&text)
}

/// Parse a checkpoint log.
pub fn parse_log(text: &str) -> VqeResult<ResumeState> {
    let mut lines = text.lines();

    let config = RunConfig::parse(
        lines
            .next()
            .ok_or_else(|| VqeError::Checkpoint("empty log".into()))?,
    )?;
    let stopping = StoppingCriteria::parse(
        lines
            .next()
            .ok_or_else(|| VqeError::Checkpoint("missing STOPPING line".into()))?,
    )?;

    let n_params = config.layers * PARAMS_PER_LAYER;
    let schedule = IndexSchedule::new(config.layers.max(1));

    let mut last: Option<(usize, f64, Vec<f64>)> = None;
    let mut last_significant: Option<usize> = None;
    let mut pending: Option<PendingBlock> = None;

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("STEP ") {
            if pending.is_some() {
                return Err(VqeError::Checkpoint("truncated step block".into()));
            }
            let (step_text, index_field) = rest
                .split_once(' ')
                .ok_or_else(|| VqeError::Checkpoint(format!("bad STEP line: {trimmed}")))?;
            let step = parse_value("STEP", step_text)?;
            let index = parse_value(
                "index",
                index_field.strip_prefix("index=").ok_or_else(|| {
                    VqeError::Checkpoint(format!("bad STEP line: {trimmed}"))
                })?,
            )?;
            pending = Some(PendingBlock::new(step, index));
        } else if let Some(rest) = trimmed.strip_prefix("COST ") {
            pending_mut(&mut pending, trimmed)?.cost = Some(parse_value("COST", rest)?);
        } else if let Some(rest) = trimmed.strip_prefix("CHANGE ") {
            pending_mut(&mut pending, trimmed)?.change = Some(parse_value("CHANGE", rest)?);
        } else if let Some(rest) = trimmed.strip_prefix("PARAMS ") {
            let block = pending
                .take()
                .ok_or_else(|| VqeError::Checkpoint(format!("PARAMS outside a block: {trimmed}")))?;
            let theta = rest
                .split(',')
                .map(|v| parse_value("PARAMS", v))
                .collect::<VqeResult<Vec<f64>>>()?;
            if theta.len() != n_params {
                return Err(VqeError::Checkpoint(format!(
                    "expected {} parameters for {} layers, got {}",
                    n_params,
                    config.layers,
                    theta.len()
                )));
            }
            let (cost, change) = block.complete()?;
            if block.index != schedule.index_at(block.step) {
                return Err(VqeError::Checkpoint(format!(
                    "step {} varied index {} but the schedule draws {}",
                    block.step,
                    block.index,
                    schedule.index_at(block.step)
                )));
            }
            if change >= stopping.stopping_delta {
                last_significant = Some(block.step);
            }
            last = Some((block.step, cost, theta));
        } else {
            return Err(VqeError::Checkpoint(format!("unrecognized line: {trimmed}")));
        }
    }

    if pending.is_some() {
        return Err(VqeError::Checkpoint("truncated step block at end of log".into()));
    }

    let (completed_steps, cost, theta) = match last {
        Some((step, cost, theta)) => (step + 1, Some(cost), Some(theta)),
        None => (0, None, None),
    };

    Ok(ResumeState {
        config,
        stopping,
        completed_steps,
        cost,
        theta,
        last_significant_change: last_significant,
    })
}

struct PendingBlock {
    step: usize,
    index: usize,
    cost: Option<f64>,
    change: Option<f64>,
}

impl PendingBlock {
    fn new(step: usize, index: usize) -> Self {
        Self {
            step,
            index,
            cost: None,
            change: None,
        }
    }

    fn complete(&self) -> VqeResult<(f64, f64)> {
        match (self.cost, self.change) {
            (Some(cost), Some(change)) => Ok((cost, change)),
            _ => Err(VqeError::Checkpoint(format!(
                "incomplete block for step {}",
                self.step
            ))),
        }
    }
}

fn pending_mut<'a>(
    pending: &'a mut Option<PendingBlock>,
    line: &str,
) -> VqeResult<&'a mut PendingBlock> {
    pending
        .as_mut()
        .ok_or_else(|| VqeError::Checkpoint(format!("field outside a STEP block: {line}")))
}

fn onoff(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn parse_value<T: std::str::FromStr>(key: &str, text: &str) -> VqeResult<T> {
    text.trim()
        .parse()
        .map_err(|_| VqeError::Checkpoint(format!("bad {key} value: {text}")))
}

/// key=value fields of one header line.
struct Fields<'a> {
    tag: &'static str,
    entries: Vec<(&'a str, &'a str)>,
}

impl<'a> Fields<'a> {
    fn parse(tag: &'static str, line: &'a str) -> VqeResult<Self> {
        let rest = line
            .strip_prefix(tag)
            .ok_or_else(|| VqeError::Checkpoint(format!("expected {tag} line, got: {line}")))?;
        let entries = rest
            .split_whitespace()
            .map(|token| {
                token
                    .split_once('=')
                    .ok_or_else(|| VqeError::Checkpoint(format!("bad {tag} field: {token}")))
            })
            .collect::<VqeResult<Vec<_>>>()?;
        Ok(Self { tag, entries })
    }

    fn take(&mut self, key: &str) -> VqeResult<&'a str> {
        let position = self
            .entries
            .iter()
            .position(|(k, _)| *k == key)
            .ok_or_else(|| {
                VqeError::Checkpoint(format!("{} line is missing {key}", self.tag))
            })?;
        Ok(self.entries.remove(position).1)
    }

    fn take_bool(&mut self, key: &str) -> VqeResult<bool> {
        match self.take(key)? {
            "on" => Ok(true),
            "off" => Ok(false),
            other => Err(VqeError::Checkpoint(format!(
                "bad {key} value: {other} (expected on/off)"
            ))),
        }
    }

    fn take_parsed<T: std::str::FromStr>(&mut self, key: &str) -> VqeResult<T> {
        let text = self.take(key)?;
        parse_value(key, text)
    }

    fn finish(self) -> VqeResult<()> {
        if let Some((key, _)) = self.entries.first() {
            return Err(VqeError::Checkpoint(format!(
                "unexpected {} field: {key}",
                self.tag
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RunConfig {
        RunConfig {
            noise: true,
            slow: false,
            layers: 1,
            zne: true,
            rot: true,
        }
    }

    fn stopping() -> StoppingCriteria {
        StoppingCriteria {
            max_steps: 1000,
            stopping_delta: 0.001,
        }
    }

    fn record(step: usize, cost: f64, change: f64) -> StepRecord {
        StepRecord {
            step,
            index: IndexSchedule::new(1).index_at(step),
            cost,
            change,
            theta: vec![0.1; PARAMS_PER_LAYER],
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("alsvid-checkpoint-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_header_lines_roundtrip() {
        let parsed = RunConfig::parse(&config().header_line()).unwrap();
        assert_eq!(parsed, config());

        let parsed = StoppingCriteria::parse(&stopping().header_line()).unwrap();
        assert_eq!(parsed, stopping());
    }

    #[test]
    fn test_write_and_parse_roundtrip() {
        let path = temp_path("roundtrip.txt");
        let _ = std::fs::remove_file(&path);

        let mut writer = CheckpointWriter::create(&path, &config(), &stopping()).unwrap();
        let mut theta = vec![0.25; PARAMS_PER_LAYER];
        theta[39] = 1.0 / 3.0;
        writer
            .append(&StepRecord {
                step: 0,
                index: 39,
                cost: -13.25,
                change: 0.5,
                theta: theta.clone(),
            })
            .unwrap();
        writer
            .append(&StepRecord {
                step: 1,
                index: 40,
                cost: -13.5,
                change: 0.25,
                theta: theta.clone(),
            })
            .unwrap();

        let state = read_log(&path).unwrap();
        assert_eq!(state.config, config());
        assert_eq!(state.stopping, stopping());
        assert_eq!(state.completed_steps, 2);
        assert_eq!(state.cost, Some(-13.5));
        assert_eq!(state.theta, Some(theta));
        assert_eq!(state.last_significant_change, Some(1));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_resume_appends_without_header() {
        let path = temp_path("resume.txt");
        let _ = std::fs::remove_file(&path);

        let mut writer = CheckpointWriter::create(&path, &config(), &stopping()).unwrap();
        writer.append(&record(0, -1.0, 0.5)).unwrap();
        drop(writer);

        let mut writer = CheckpointWriter::resume(&path).unwrap();
        writer.append(&record(1, -1.2, 0.2)).unwrap();

        let state = read_log(&path).unwrap();
        assert_eq!(state.completed_steps, 2);
        assert_eq!(state.cost, Some(-1.2));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_header_only_log_parses_as_fresh() {
        let text = format!("{}\n{}\n\n", config().header_line(), stopping().header_line());
        let state = parse_log(&text).unwrap();
        assert_eq!(state.completed_steps, 0);
        assert!(state.cost.is_none());
        assert!(state.theta.is_none());
        assert!(state.last_significant_change.is_none());
    }

    #[test]
    fn test_sub_delta_changes_leave_no_significant_step() {
        let mut text = format!("{}\n{}\n\n", config().header_line(), stopping().header_line());
        for step in 0..3 {
            let mut r = record(step, -1.0, 0.000_1);
            r.step = step;
            text.push_str(&r.format_block());
        }
        let state = parse_log(&text).unwrap();
        assert_eq!(state.completed_steps, 3);
        assert!(state.last_significant_change.is_none());
    }

    #[test]
    fn test_float_values_roundtrip_exactly() {
        let mut theta = vec![0.0; PARAMS_PER_LAYER];
        theta[0] = 0.1 + 0.2; // 0.30000000000000004
        theta[1] = std::f64::consts::PI;
        let mut text = format!("{}\n{}\n\n", config().header_line(), stopping().header_line());
        text.push_str(
            &StepRecord {
                step: 0,
                index: 39,
                cost: -1.0 / 3.0,
                change: 1e-9_f64,
                theta: theta.clone(),
            }
            .format_block(),
        );

        let state = parse_log(&text).unwrap();
        assert_eq!(state.cost, Some(-1.0 / 3.0));
        assert_eq!(state.theta, Some(theta));
    }

    #[test]
    fn test_malformed_logs_are_rejected() {
        // Missing header entirely.
        assert!(matches!(
            parse_log("STEP 0 index=1\n"),
            Err(VqeError::Checkpoint(_))
        ));

        // Truncated block at end of file.
        let text = format!(
            "{}\n{}\n\nSTEP 0 index=39\n  COST -1\n",
            config().header_line(),
            stopping().header_line()
        );
        assert!(matches!(parse_log(&text), Err(VqeError::Checkpoint(_))));

        // Wrong parameter count for the configured layer depth.
        let text = format!(
            "{}\n{}\n\nSTEP 0 index=39\n  COST -1\n  CHANGE 0.1\n  PARAMS 0.1,0.2\n",
            config().header_line(),
            stopping().header_line()
        );
        assert!(matches!(parse_log(&text), Err(VqeError::Checkpoint(_))));

        // Unknown garbage line.
        let text = format!(
            "{}\n{}\n\nNOISE everywhere\n",
            config().header_line(),
            stopping().header_line()
        );
        assert!(matches!(parse_log(&text), Err(VqeError::Checkpoint(_))));
    }

    #[test]
    fn test_create_refuses_existing_file() {
        let path = temp_path("existing.txt");
        let _ = std::fs::remove_file(&path);
        std::fs::write(&path, "already here").unwrap();

        assert!(CheckpointWriter::create(&path, &config(), &stopping()).is_err());

        std::fs::remove_file(&path).unwrap();
    }
}
