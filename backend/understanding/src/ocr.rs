//! Optical Character Recognition (OCR)
//!
//! Bridges the Tesseract command-line program. The image is piped to
//! `tesseract stdin stdout ... tsv` and the word-level TSV output is folded
//! into line records.

use std::collections::HashMap;
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;

use textgate_config::EngineConfig;
use textgate_core::{EngineError, LineRecord, RecognitionEngine, RecognitionResult};
use tracing::{debug, info};

/// TSV `level` value for word rows.
const WORD_LEVEL: u32 = 5;

/// Number of columns in a tesseract TSV row.
const TSV_COLUMNS: usize = 12;

pub struct TesseractEngine {
    binary: String,
    language: String,
    page_segmentation_mode: u8,
    version: String,
}

impl TesseractEngine {
    /// Probe the tesseract binary and build an engine.
    ///
    /// Fails with [`EngineError::Init`] if the binary cannot be run.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let output = Command::new(&config.tesseract_bin)
            .arg("--version")
            .output()
            .map_err(|e| {
                EngineError::Init(format!("cannot run '{}': {e}", config.tesseract_bin))
            })?;
        if !output.status.success() {
            return Err(EngineError::Init(format!(
                "'{} --version' exited with {}",
                config.tesseract_bin, output.status
            )));
        }

        // Older releases print the version banner on stderr.
        let banner = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        let version = String::from_utf8_lossy(&banner)
            .lines()
            .next()
            .unwrap_or("tesseract")
            .trim()
            .to_string();
        info!(version = %version, language = %config.language, "Tesseract engine ready");

        Ok(Self {
            binary: config.tesseract_bin.clone(),
            language: config.language.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
            version,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn run(&self, image: &[u8]) -> Result<String, EngineError> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", self.language.as_str(), "--psm"])
            .arg(self.page_segmentation_mode.to_string())
            .arg("tsv")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Recognition("tesseract stdin unavailable".into()))?;

        // Feed stdin from a second thread so a full stdout pipe cannot deadlock us.
        let (output, written) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(image));
            let output = child.wait_with_output();
            (output, writer.join())
        });
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        match written {
            Ok(result) => result?,
            Err(_) => return Err(EngineError::Recognition("stdin writer panicked".into())),
        }

        String::from_utf8(output.stdout)
            .map_err(|e| EngineError::Recognition(format!("tesseract output is not UTF-8: {e}")))
    }
}

impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &[u8]) -> Result<RecognitionResult, EngineError> {
        let started = Instant::now();
        let tsv = self.run(image)?;
        let lines = parse_tsv(&tsv)?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if lines.is_empty() {
            info!(elapsed_ms, "OCR completed: no text detected");
        } else {
            info!(
                payload_kb = %format!("{:.1}", image.len() as f64 / 1024.0),
                lines = lines.len(),
                elapsed_ms,
                "OCR completed"
            );
        }
        Ok(RecognitionResult::from_lines(lines))
    }
}

#[derive(Default)]
struct LineAccumulator {
    words: Vec<String>,
    confidence_sum: f64,
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl LineAccumulator {
    fn push(&mut self, word: &str, confidence: f64, left: f64, top: f64, width: f64, height: f64) {
        if self.words.is_empty() {
            self.left = left;
            self.top = top;
            self.right = left + width;
            self.bottom = top + height;
        } else {
            self.left = self.left.min(left);
            self.top = self.top.min(top);
            self.right = self.right.max(left + width);
            self.bottom = self.bottom.max(top + height);
        }
        self.words.push(word.to_string());
        self.confidence_sum += confidence;
    }

    fn finish(self) -> LineRecord {
        let confidence = self.confidence_sum / self.words.len() as f64 / 100.0;
        LineRecord::new(
            self.words.join(" "),
            confidence,
            [
                [self.left, self.top],
                [self.right, self.top],
                [self.right, self.bottom],
                [self.left, self.bottom],
            ],
        )
    }
}

/// Fold tesseract TSV output into line records, in first-appearance order.
///
/// Word rows (level 5) with a non-negative confidence and non-blank text are
/// grouped by (page, block, paragraph, line). Confidence is the mean word
/// confidence scaled to `[0, 1]`; the box is the clockwise union of the word
/// boxes starting at the top-left corner.
pub fn parse_tsv(tsv: &str) -> Result<Vec<LineRecord>, EngineError> {
    let mut order: Vec<LineAccumulator> = Vec::new();
    let mut index: HashMap<[u32; 4], usize> = HashMap::new();

    for (row, raw) in tsv.lines().enumerate() {
        if raw.is_empty() || raw.starts_with("level") {
            continue;
        }
        let cols: Vec<&str> = raw.splitn(TSV_COLUMNS, '\t').collect();
        if cols.len() < TSV_COLUMNS - 1 {
            return Err(EngineError::Recognition(format!(
                "malformed tesseract TSV at row {}: expected {TSV_COLUMNS} columns, got {}",
                row + 1,
                cols.len()
            )));
        }

        let level: u32 = parse_col(&cols, 0, row)?;
        if level != WORD_LEVEL {
            continue;
        }
        let confidence: f64 = parse_col(&cols, 10, row)?;
        let text = cols.get(11).map(|t| t.trim()).unwrap_or("");
        if confidence < 0.0 || text.is_empty() {
            continue;
        }

        let key = [
            parse_col(&cols, 1, row)?,
            parse_col(&cols, 2, row)?,
            parse_col(&cols, 3, row)?,
            parse_col(&cols, 4, row)?,
        ];
        let slot = *index.entry(key).or_insert_with(|| {
            order.push(LineAccumulator::default());
            order.len() - 1
        });
        order[slot].push(
            text,
            confidence,
            parse_col(&cols, 6, row)?,
            parse_col(&cols, 7, row)?,
            parse_col(&cols, 8, row)?,
            parse_col(&cols, 9, row)?,
        );
    }

    debug!(lines = order.len(), "Parsed tesseract TSV");
    Ok(order.into_iter().map(LineAccumulator::finish).collect())
}

fn parse_col<T: std::str::FromStr>(cols: &[&str], i: usize, row: usize) -> Result<T, EngineError> {
    cols[i].trim().parse().map_err(|_| {
        EngineError::Recognition(format!(
            "malformed tesseract TSV at row {}: bad value {:?} in column {}",
            row + 1,
            cols[i],
            i + 1
        ))
    })
}
