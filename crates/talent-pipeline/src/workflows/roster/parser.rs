use serde::{Deserialize, Deserializer};
use std::io::Read;

use crate::workflows::pipeline::domain::{NewCandidate, Stage, ValidationError};

/// Row number as a spreadsheet shows it: the header is row 1.
pub(crate) type RowNumber = usize;

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<(RowNumber, RosterRow)>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<RosterRow>().enumerate() {
        rows.push((index + 2, record?));
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RosterRow {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Job Title", default)]
    job_title: String,
    #[serde(rename = "Stage", default, deserialize_with = "empty_string_as_none")]
    stage: Option<String>,
    #[serde(rename = "Notes", default, deserialize_with = "empty_string_as_none")]
    notes: Option<String>,
    #[serde(rename = "Skills", default, deserialize_with = "empty_string_as_none")]
    skills: Option<String>,
    #[serde(rename = "Location", default, deserialize_with = "empty_string_as_none")]
    location: Option<String>,
}

impl RosterRow {
    pub(crate) fn into_new_candidate(self) -> Result<NewCandidate, ValidationError> {
        let stage = self
            .stage
            .as_deref()
            .map(str::parse::<Stage>)
            .transpose()?;

        if self.name.trim().is_empty() {
            return Err(ValidationError::Blank { field: "name" });
        }
        if self.job_title.trim().is_empty() {
            return Err(ValidationError::Blank { field: "job_title" });
        }

        Ok(NewCandidate {
            name: self.name,
            job_title: self.job_title,
            stage,
            notes: self.notes,
            skills: self
                .skills
                .map(|raw| raw.split(';').map(|skill| skill.trim().to_string()).collect())
                .unwrap_or_default(),
            location: self.location,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
