use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for candidates tracked by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl CandidateId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Hiring stage a candidate currently occupies.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Stage {
    #[default]
    Applied,
    Screening,
    Interview,
    Offer,
    Hired,
    Rejected,
}

impl Stage {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Applied,
            Self::Screening,
            Self::Interview,
            Self::Offer,
            Self::Hired,
            Self::Rejected,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::Screening => "Screening",
            Self::Interview => "Interview",
            Self::Offer => "Offer",
            Self::Hired => "Hired",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Stage {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|stage| stage.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::UnknownStage(trimmed.to_string()))
    }
}

/// Offer status as exposed at serialization boundaries, including the `none` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    None,
    Sent,
    Accepted,
    Declined,
}

impl OfferStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of an offer that exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferState {
    Sent,
    Accepted,
    Declined,
}

impl OfferState {
    pub const fn status(self) -> OfferStatus {
        match self {
            Self::Sent => OfferStatus::Sent,
            Self::Accepted => OfferStatus::Accepted,
            Self::Declined => OfferStatus::Declined,
        }
    }
}

impl fmt::Display for OfferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status().label())
    }
}

/// Complete offer terms. All three fields are required together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferDetails {
    pub position: String,
    pub salary: String,
    pub start_date: NaiveDate,
}

/// Unvalidated offer terms as typed into the "Send Offer" form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferDraft {
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub start_date: String,
}

impl OfferDraft {
    pub fn new(
        position: impl Into<String>,
        salary: impl Into<String>,
        start_date: impl Into<String>,
    ) -> Self {
        Self {
            position: position.into(),
            salary: salary.into(),
            start_date: start_date.into(),
        }
    }
}

/// The single offer extended to a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRecord {
    pub status: OfferState,
    pub details: OfferDetails,
}

/// Free-text message exchanged with a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMessage {
    pub sent_on: NaiveDateTime,
    pub author: String,
    pub body: String,
}

/// Interview start time on the half-hour grid of the scheduling picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    const FIRST_HOUR: u32 = 9;
    const LAST_HOUR: u32 = 16;

    pub fn new(time: NaiveTime) -> Result<Self, ValidationError> {
        let on_grid = time.second() == 0 && time.nanosecond() == 0 && time.minute() % 30 == 0;
        let in_hours = (Self::FIRST_HOUR..=Self::LAST_HOUR).contains(&time.hour());
        if on_grid && in_hours {
            Ok(Self(time))
        } else {
            Err(ValidationError::InvalidSlot(time.format("%H:%M").to_string()))
        }
    }

    /// Every bookable slot in display order.
    pub fn all() -> Vec<Self> {
        (Self::FIRST_HOUR..=Self::LAST_HOUR)
            .flat_map(|hour| [0, 30].map(|minute| (hour, minute)))
            .filter_map(|(hour, minute)| NaiveTime::from_hms_opt(hour, minute, 0))
            .map(Self)
            .collect()
    }

    pub fn time(self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for TimeSlot {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let time = NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .map_err(|_| ValidationError::InvalidSlot(raw.trim().to_string()))?;
        Self::new(time)
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSlot> for String {
    fn from(value: TimeSlot) -> Self {
        value.to_string()
    }
}

/// Interview booked through the calendar picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledInterview {
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub interviewer: String,
    #[serde(default)]
    pub notes: String,
}

/// Candidate tracked through the hiring pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub job_title: String,
    pub stage: Stage,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub messages: Vec<CandidateMessage>,
    #[serde(default)]
    pub interviews: Vec<ScheduledInterview>,
    #[serde(default)]
    pub offer: Option<OfferRecord>,
}

impl Candidate {
    pub fn offer_status(&self) -> OfferStatus {
        self.offer
            .as_ref()
            .map_or(OfferStatus::None, |offer| offer.status.status())
    }
}

/// Input for the add-candidate operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCandidate {
    pub name: String,
    pub job_title: String,
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl NewCandidate {
    pub fn new(name: impl Into<String>, job_title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            job_title: job_title.into(),
            ..Self::default()
        }
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Badge count for a single stage tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub stage: Stage,
    pub stage_label: &'static str,
    pub count: usize,
}

/// Caller supplied input that cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
    #[error("'{0}' is not a pipeline stage")]
    UnknownStage(String),
    #[error("start date '{0}' must be formatted as YYYY-MM-DD")]
    InvalidStartDate(String),
    #[error("interview slot '{0}' must start on the half hour between 09:00 and 16:30")]
    InvalidSlot(String),
    #[error("interview slot {date} {slot} is already booked")]
    SlotTaken { date: NaiveDate, slot: TimeSlot },
}

/// Operation attempted against an offer state that forbids it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidStateError {
    #[error("candidate {0} has no offer")]
    NoOffer(CandidateId),
    #[error("candidate {id} already has an offer that is {status}")]
    OfferExists { id: CandidateId, status: OfferState },
    #[error("offer for candidate {id} is already {status}")]
    OfferClosed { id: CandidateId, status: OfferState },
}

/// Error raised by pipeline operations. State is unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("candidate {0} not found")]
    NotFound(CandidateId),
    #[error("invalid state: {0}")]
    InvalidState(#[from] InvalidStateError),
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Blank { field })
    } else {
        Ok(trimmed.to_string())
    }
}
