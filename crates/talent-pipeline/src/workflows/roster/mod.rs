//! CSV roster import and pipeline export for recruiter reports.

mod parser;

use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::workflows::pipeline::domain::{NewCandidate, ValidationError};
use crate::workflows::pipeline::CandidateStore;

#[derive(Debug)]
pub enum RosterError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow {
        row: usize,
        source: ValidationError,
    },
}

impl std::fmt::Display for RosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterError::Io(err) => write!(f, "failed to read roster: {}", err),
            RosterError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterError::InvalidRow { row, source } => {
                write!(f, "roster row {} rejected: {}", row, source)
            }
        }
    }
}

impl std::error::Error for RosterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterError::Io(err) => Some(err),
            RosterError::Csv(err) => Some(err),
            RosterError::InvalidRow { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for RosterError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads `Name, Job Title, Stage, Notes, Skills, Location` rows into add-candidate inputs.
pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<NewCandidate>, RosterError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Rows come back in file order; feeding them to the engine leaves the last row first.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<NewCandidate>, RosterError> {
        parser::parse_rows(reader)?
            .into_iter()
            .map(|(row, record)| {
                record
                    .into_new_candidate()
                    .map_err(|source| RosterError::InvalidRow { row, source })
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct RosterExportRow<'a> {
    #[serde(rename = "Id")]
    id: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Job Title")]
    job_title: &'a str,
    #[serde(rename = "Stage")]
    stage: &'static str,
    #[serde(rename = "Offer Status")]
    offer_status: &'static str,
    #[serde(rename = "Position")]
    position: &'a str,
    #[serde(rename = "Salary")]
    salary: &'a str,
    #[serde(rename = "Start Date")]
    start_date: String,
    #[serde(rename = "Tags")]
    tags: String,
}

/// Write the pipeline in store order, one row per candidate.
pub fn export_roster<W: Write>(store: &CandidateStore, writer: W) -> Result<(), RosterError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for candidate in store.iter() {
        let details = candidate.offer.as_ref().map(|offer| &offer.details);
        csv_writer.serialize(RosterExportRow {
            id: candidate.id.as_str(),
            name: &candidate.name,
            job_title: &candidate.job_title,
            stage: candidate.stage.label(),
            offer_status: candidate.offer_status().label(),
            position: details.map_or("", |details| details.position.as_str()),
            salary: details.map_or("", |details| details.salary.as_str()),
            start_date: details
                .map(|details| details.start_date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            tags: candidate
                .tags
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(";"),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}
