// src/persistence/json_file.rs
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use serde_json::{from_str, to_string};
use crate::domain::Bid;

/// Read an archived bid ledger, one JSON bid record per line.
pub fn read_bids<P: AsRef<Path>>(path: P) -> Result<Vec<Bid>, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open file: {}", e))?;
    let reader = BufReader::new(file);

    let mut bids = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|e| format!("Failed to read line: {}", e))?;
        if line.is_empty() {
            continue;
        }
        let parsed: Bid = from_str(&line)
            .map_err(|e| format!("Failed to parse bid record: {}", e))?;

        bids.push(parsed);
    }

    Ok(bids)
}

/// Write a full ledger archive, replacing whatever was at `path`.
pub fn write_bids<P: AsRef<Path>>(path: P, bids: &[Bid]) -> Result<(), String> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| format!("Failed to open file for writing: {}", e))?;

    for bid in bids {
        let json = to_string(bid).map_err(|e| format!("Failed to serialize bid record: {}", e))?;
        writeln!(file, "{}", json)
            .map_err(|e| format!("Failed to write to file: {}", e))?;
    }

    Ok(())
}

/// Append a single bid record to an archive. The archive is append-only;
/// records are never rewritten or removed.
pub fn append_bid<P: AsRef<Path>>(path: P, bid: &Bid) -> Result<(), String> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| format!("Failed to open file for appending: {}", e))?;

    let json = to_string(bid).map_err(|e| format!("Failed to serialize bid record: {}", e))?;
    writeln!(file, "{}", json)
        .map_err(|e| format!("Failed to append to file: {}", e))
}
