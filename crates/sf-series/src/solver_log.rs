//! Energy table from the solver's text output.
//!
//! The solver prints blocks like
//!
//! ```text
//!  Time   0.004000000000000
//!                 Volume            Mass         Density        Pressure Internal Energy  Kinetic Energy    Total Energy
//!  step:      2    0.1000E+03    0.3450E+03    0.3450E+01    0.2047E+03    0.3380E+03    0.8410E-02    0.3380E+03
//! ```
//!
//! Each block becomes one [`EnergyRecord`] keyed by step. A block whose
//! numbers do not parse is reported and dropped; a later block for the
//! same step replaces an earlier one.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LogParseError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyRecord {
    pub time: f64,
    pub volume: f64,
    pub mass: f64,
    pub density: f64,
    pub pressure: f64,
    pub internal_energy: f64,
    pub kinetic_energy: f64,
    pub total_energy: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverLog {
    pub records: BTreeMap<u64, EnergyRecord>,
    pub errors: Vec<LogParseError>,
}

fn block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let pattern = r"Time\s+(\S+)\s+Volume\s+Mass\s+Density\s+Pressure\s+Internal Energy\s+Kinetic Energy\s+Total Energy\s+step:\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)";
        Regex::new(pattern).unwrap_or_else(|e| unreachable!("static pattern: {e}"))
    })
}

pub fn parse_solver_log(text: &str) -> SolverLog {
    let mut log = SolverLog::default();
    for caps in block_pattern().captures_iter(text) {
        let start = caps.get(0).map_or(0, |m| m.start());
        let line = text[..start].matches('\n').count() + 1;
        match parse_block(&caps) {
            Ok((step, record)) => {
                log.records.insert(step, record);
            }
            Err(reason) => {
                let err = LogParseError::Block { line, reason };
                warn!(%err, "skipping solver log block");
                log.errors.push(err);
            }
        }
    }
    debug!(
        records = log.records.len(),
        errors = log.errors.len(),
        "solver log parsed"
    );
    log
}

/// Read and parse a log file. An unreadable file yields an empty table
/// with the error recorded.
pub fn read_solver_log(path: &Path) -> SolverLog {
    match fs::read_to_string(path) {
        Ok(text) => parse_solver_log(&text),
        Err(e) => {
            let err = LogParseError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            };
            warn!(%err, "solver log ignored");
            SolverLog {
                records: BTreeMap::new(),
                errors: vec![err],
            }
        }
    }
}

fn parse_block(caps: &regex::Captures<'_>) -> Result<(u64, EnergyRecord), String> {
    let text = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let number = |i: usize, what: &str| -> Result<f64, String> {
        let token = text(i);
        token
            .parse::<f64>()
            .or_else(|_| token.replace(['D', 'd'], "E").parse::<f64>())
            .map_err(|_| format!("{} '{}' is not a number", what, token))
    };

    let step = text(2)
        .parse::<u64>()
        .map_err(|_| format!("step '{}' is not an integer", text(2)))?;
    let record = EnergyRecord {
        time: number(1, "time")?,
        volume: number(3, "volume")?,
        mass: number(4, "mass")?,
        density: number(5, "density")?,
        pressure: number(6, "pressure")?,
        internal_energy: number(7, "internal energy")?,
        kinetic_energy: number(8, "kinetic energy")?,
        total_energy: number(9, "total energy")?,
    };
    Ok((step, record))
}
