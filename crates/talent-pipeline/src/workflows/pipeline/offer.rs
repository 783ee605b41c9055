use chrono::NaiveDate;

use super::domain::{
    require_text, Candidate, InvalidStateError, OfferDetails, OfferDraft, OfferRecord, OfferState,
    PipelineError, ValidationError,
};

/// Start dates must be zero-padded `YYYY-MM-DD`.
const START_DATE_FORMAT: &str = "%Y-%m-%d";

impl OfferDraft {
    /// Validate the three mandatory offer fields together.
    pub fn validate(&self) -> Result<OfferDetails, ValidationError> {
        let position = require_text("position", &self.position)?;
        let salary = require_text("salary", &self.salary)?;
        let raw_date = require_text("start_date", &self.start_date)?;
        let start_date = NaiveDate::parse_from_str(&raw_date, START_DATE_FORMAT)
            .ok()
            .filter(|parsed| parsed.format(START_DATE_FORMAT).to_string() == raw_date)
            .ok_or_else(|| ValidationError::InvalidStartDate(raw_date.clone()))?;

        Ok(OfferDetails {
            position,
            salary,
            start_date,
        })
    }
}

impl OfferRecord {
    pub fn sent(details: OfferDetails) -> Self {
        Self {
            status: OfferState::Sent,
            details,
        }
    }

    fn resolve(&mut self, candidate: &Candidate, next: OfferState) -> Result<(), InvalidStateError> {
        match self.status {
            OfferState::Sent => {
                self.status = next;
                Ok(())
            }
            closed => Err(InvalidStateError::OfferClosed {
                id: candidate.id.clone(),
                status: closed,
            }),
        }
    }
}

/// `none -> sent`. Only reachable while the candidate holds no offer.
pub(crate) fn send_offer(
    candidate: &mut Candidate,
    draft: &OfferDraft,
) -> Result<OfferRecord, PipelineError> {
    if let Some(existing) = &candidate.offer {
        return Err(InvalidStateError::OfferExists {
            id: candidate.id.clone(),
            status: existing.status,
        }
        .into());
    }

    let record = OfferRecord::sent(draft.validate()?);
    candidate.offer = Some(record.clone());
    Ok(record)
}

/// `sent -> accepted`.
pub(crate) fn mark_accepted(candidate: &mut Candidate) -> Result<OfferRecord, PipelineError> {
    transition(candidate, OfferState::Accepted)
}

/// `sent -> declined`.
pub(crate) fn mark_declined(candidate: &mut Candidate) -> Result<OfferRecord, PipelineError> {
    transition(candidate, OfferState::Declined)
}

fn transition(candidate: &mut Candidate, next: OfferState) -> Result<OfferRecord, PipelineError> {
    let mut offer = candidate
        .offer
        .clone()
        .ok_or_else(|| InvalidStateError::NoOffer(candidate.id.clone()))?;

    offer.resolve(candidate, next)?;
    candidate.offer = Some(offer.clone());
    Ok(offer)
}
