use crate::error::ProfileError;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// One alignment of a database read against a query window, as reported by
/// the external search. Coordinates are 1-based inclusive and local to the
/// searched window.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    pub read_id: String,
    pub identity: f64,
    pub align_length: usize,
    pub query_start: usize,
    pub query_end: usize,
}

/// Boundary to the external sequence-similarity search. Implementations are
/// handed one window's subsequence and return the matching database reads.
/// Identity/length filtering is the implementation's contract; the profile
/// builder does not re-validate it.
pub trait AlignmentSearch: Sync {
    fn search(&self, window_seq: &[u8]) -> Result<Vec<RawHit>, ProfileError>;
}

/// Similarity-search settings forwarded to blastn, plus the hit acceptance
/// thresholds applied to its output.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub e_value: String,
    pub word_size: usize,
    pub task: String,
    pub max_alignments: usize,
    pub dust: String,
    pub min_identity: f64,
    pub min_align_length: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            e_value: "1e-15".to_string(),
            word_size: 11,
            task: "blastn".to_string(),
            max_alignments: 10_000_000,
            dust: "20 64 1".to_string(),
            min_identity: 95.0,
            min_align_length: 40,
        }
    }
}

/// blastn-backed alignment search. Each window subsequence is piped to a
/// fresh blastn process on stdin and the tabular output is parsed back, so
/// reported coordinates are window-local without translation.
pub struct BlastnSearch {
    database: PathBuf,
    params: SearchParams,
}

impl BlastnSearch {
    pub fn new(database: PathBuf, params: SearchParams) -> Self {
        BlastnSearch { database, params }
    }
}

impl AlignmentSearch for BlastnSearch {
    fn search(&self, window_seq: &[u8]) -> Result<Vec<RawHit>, ProfileError> {
        let mut child = Command::new("blastn")
            .arg("-query")
            .arg("-")
            .arg("-db")
            .arg(&self.database)
            .arg("-evalue")
            .arg(&self.params.e_value)
            .arg("-word_size")
            .arg(self.params.word_size.to_string())
            .arg("-dust")
            .arg(&self.params.dust)
            .arg("-task")
            .arg(&self.params.task)
            .arg("-num_alignments")
            .arg(self.params.max_alignments.to_string())
            .arg("-outfmt")
            .arg("6 sseqid pident length qstart qend")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ProfileError::adapter(format!("failed to spawn blastn: {}", e)))?;

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| ProfileError::adapter("blastn stdin unavailable"))?;
            stdin
                .write_all(b">window\n")
                .and_then(|_| stdin.write_all(window_seq))
                .and_then(|_| stdin.write_all(b"\n"))
                .map_err(|e| ProfileError::adapter(format!("failed to write query: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| ProfileError::adapter(format!("failed to wait for blastn: {}", e)))?;
        if !output.status.success() {
            return Err(ProfileError::adapter(format!(
                "blastn exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut hits = Vec::new();
        for line in stdout.lines() {
            if line.is_empty() {
                continue;
            }
            let hit = parse_hit_line(line)?;
            if hit.identity >= self.params.min_identity
                && hit.align_length >= self.params.min_align_length
            {
                hits.push(hit);
            }
        }
        Ok(hits)
    }
}

/// Parse one tabular hit record:
/// `read_id<TAB>percent_identity<TAB>length<TAB>qstart<TAB>qend`.
pub fn parse_hit_line(line: &str) -> Result<RawHit, ProfileError> {
    let fields: Vec<&str> = line.trim_end().split('\t').collect();
    if fields.len() != 5 {
        return Err(ProfileError::adapter(format!(
            "malformed hit record (expected 5 fields, got {}): {:?}",
            fields.len(),
            line
        )));
    }
    let malformed = |what: &str| {
        ProfileError::adapter(format!("malformed hit record ({}): {:?}", what, line))
    };
    Ok(RawHit {
        read_id: fields[0].to_string(),
        identity: fields[1].parse().map_err(|_| malformed("identity"))?,
        align_length: fields[2].parse().map_err(|_| malformed("length"))?,
        query_start: fields[3].parse().map_err(|_| malformed("qstart"))?,
        query_end: fields[4].parse().map_err(|_| malformed("qend"))?,
    })
}
