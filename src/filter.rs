use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Quality thresholds for filtering already-produced annotation records.
#[derive(Debug, Clone)]
pub struct FilterThresholds {
    /// Minimum alignment identity (`Identity` attribute), inclusive.
    pub min_identity: f64,
    /// Minimum alignment similarity (`Similarity` attribute), inclusive.
    pub min_similarity: f64,
    /// Minimum relative alignment length (`Relat_Length`), inclusive.
    pub min_length: f64,
    /// Maximum interruptions per 100 bp (`Relat_Interruptions`), inclusive.
    pub max_interruptions: f64,
    /// Substring the `Final_Classification` attribute must contain;
    /// "All" disables the constraint.
    pub classification: String,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        FilterThresholds {
            min_identity: 0.35,
            min_similarity: 0.45,
            min_length: 0.8,
            max_interruptions: 3.0,
            classification: "All".to_string(),
        }
    }
}

/// Records kept/seen by one filtering pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilterStats {
    pub records_in: u64,
    pub records_out: u64,
}

fn attribute<'a>(attributes: &'a str, key: &str) -> Option<&'a str> {
    attributes.split(',').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k.trim() == key).then_some(v.trim())
    })
}

fn parse_attribute(attributes: &str, key: &str) -> Option<f64> {
    attribute(attributes, key)?.parse().ok()
}

/// Decide whether one record's attribute column passes the thresholds.
/// Records missing a required attribute never pass.
pub fn record_passes(attributes: &str, thresholds: &FilterThresholds) -> bool {
    let Some(identity) = parse_attribute(attributes, "Identity") else {
        return false;
    };
    let Some(similarity) = parse_attribute(attributes, "Similarity") else {
        return false;
    };
    let Some(length) = parse_attribute(attributes, "Relat_Length") else {
        return false;
    };
    let Some(interruptions) = parse_attribute(attributes, "Relat_Interruptions") else {
        return false;
    };

    if identity < thresholds.min_identity
        || similarity < thresholds.min_similarity
        || length < thresholds.min_length
        || interruptions > thresholds.max_interruptions
    {
        return false;
    }

    if thresholds.classification == "All" {
        return true;
    }
    attribute(attributes, "Final_Classification")
        .is_some_and(|c| c.contains(&thresholds.classification))
}

/// Copy the records of `input` that pass `thresholds` to `output`,
/// preserving comment/header lines verbatim.
pub fn filter_gff(
    input: &Path,
    output: &Path,
    thresholds: &FilterThresholds,
) -> Result<FilterStats> {
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("Failed to open GFF: {}", input.display()))?,
    );
    let mut writer = BufWriter::new(
        File::create(output)
            .with_context(|| format!("Failed to create GFF: {}", output.display()))?,
    );

    let mut stats = FilterStats::default();
    for line in reader.lines() {
        let line = line?;
        if line.starts_with('#') {
            writeln!(writer, "{}", line)?;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        stats.records_in += 1;
        let attributes = line.rsplit('\t').next().unwrap_or("");
        if record_passes(attributes, thresholds) {
            writeln!(writer, "{}", line)?;
            stats.records_out += 1;
        }
    }
    writer.flush()?;
    Ok(stats)
}
