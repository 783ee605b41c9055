//! Codec for the browser storage layout the recruiter dashboard wrote before the engine existed.
//!
//! That layout spreads one pipeline across several keys, each holding a JSON blob:
//! `shortlistedTalents`, `talentNotes`, `talentTags`, plus `talentMessages_{id}` and
//! `talentInterviews_{id}` per candidate. Offers carry the literal `"none"` status when absent.

use std::collections::{BTreeMap, BTreeSet};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::domain::{
    Candidate, CandidateId, CandidateMessage, OfferDraft, OfferStatus, ScheduledInterview, Stage,
};
use super::persistence::{offer_from_parts, PersistenceError, PipelineSnapshot};
use super::store::CandidateStore;

pub const SHORTLIST_KEY: &str = "shortlistedTalents";
pub const NOTES_KEY: &str = "talentNotes";
pub const TAGS_KEY: &str = "talentTags";
pub const MESSAGES_KEY_PREFIX: &str = "talentMessages_";
pub const INTERVIEWS_KEY_PREFIX: &str = "talentInterviews_";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyTalent {
    id: CandidateId,
    name: String,
    job_title: String,
    status: Stage,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    offer_status: OfferStatus,
    #[serde(default)]
    offer_details: Option<LegacyOfferDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyOfferDetails {
    position: String,
    salary: String,
    start_date: String,
}

/// Flat key/value dump of the browser storage layout, one JSON blob per key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegacyTalentState {
    entries: BTreeMap<String, String>,
}

impl LegacyTalentState {
    pub fn from_entries(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn from_store(store: &CandidateStore) -> Result<Self, PersistenceError> {
        encode(store).map(Self::from_entries)
    }

    pub fn into_store(self) -> Result<CandidateStore, PersistenceError> {
        decode(&self.entries)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn into_entries(self) -> BTreeMap<String, String> {
        self.entries
    }
}

/// Split a store into the flat key/value entries of the browser layout.
pub fn encode(store: &CandidateStore) -> Result<BTreeMap<String, String>, PersistenceError> {
    let mut entries = BTreeMap::new();
    let mut notes = BTreeMap::new();
    let mut tags = BTreeMap::new();
    let mut shortlist = Vec::with_capacity(store.len());

    for candidate in store.iter() {
        shortlist.push(LegacyTalent {
            id: candidate.id.clone(),
            name: candidate.name.clone(),
            job_title: candidate.job_title.clone(),
            status: candidate.stage,
            skills: candidate.skills.clone(),
            location: candidate.location.clone(),
            offer_status: candidate.offer_status(),
            offer_details: candidate.offer.as_ref().map(|offer| LegacyOfferDetails {
                position: offer.details.position.clone(),
                salary: offer.details.salary.clone(),
                start_date: offer.details.start_date.format("%Y-%m-%d").to_string(),
            }),
        });

        if !candidate.notes.is_empty() {
            notes.insert(candidate.id.clone(), candidate.notes.clone());
        }
        if !candidate.tags.is_empty() {
            tags.insert(candidate.id.clone(), candidate.tags.clone());
        }
        if !candidate.messages.is_empty() {
            entries.insert(
                format!("{MESSAGES_KEY_PREFIX}{}", candidate.id),
                serde_json::to_string(&candidate.messages)?,
            );
        }
        if !candidate.interviews.is_empty() {
            entries.insert(
                format!("{INTERVIEWS_KEY_PREFIX}{}", candidate.id),
                serde_json::to_string(&candidate.interviews)?,
            );
        }
    }

    entries.insert(SHORTLIST_KEY.to_string(), serde_json::to_string(&shortlist)?);
    entries.insert(NOTES_KEY.to_string(), serde_json::to_string(&notes)?);
    entries.insert(TAGS_KEY.to_string(), serde_json::to_string(&tags)?);
    Ok(entries)
}

/// Reassemble a store from browser layout entries. A missing shortlist yields an empty store.
pub fn decode(entries: &BTreeMap<String, String>) -> Result<CandidateStore, PersistenceError> {
    let shortlist: Vec<LegacyTalent> = read_entry(entries, SHORTLIST_KEY)?.unwrap_or_default();
    let mut notes: BTreeMap<CandidateId, String> =
        read_entry(entries, NOTES_KEY)?.unwrap_or_default();
    let mut tags: BTreeMap<CandidateId, BTreeSet<String>> =
        read_entry(entries, TAGS_KEY)?.unwrap_or_default();

    let mut seen = BTreeSet::new();
    let mut candidates = Vec::with_capacity(shortlist.len());
    for talent in shortlist {
        if !seen.insert(talent.id.clone()) {
            return Err(PersistenceError::Corrupt(format!(
                "duplicate candidate id {}",
                talent.id
            )));
        }

        let details = talent
            .offer_details
            .map(|raw| {
                OfferDraft::new(raw.position, raw.salary, raw.start_date)
                    .validate()
                    .map_err(|err| {
                        PersistenceError::Corrupt(format!(
                            "offer details for candidate {}: {err}",
                            talent.id
                        ))
                    })
            })
            .transpose()?;
        let offer = offer_from_parts(&talent.id, talent.offer_status, details)?;

        let messages: Vec<CandidateMessage> =
            read_entry(entries, &format!("{MESSAGES_KEY_PREFIX}{}", talent.id))?
                .unwrap_or_default();
        let interviews: Vec<ScheduledInterview> =
            read_entry(entries, &format!("{INTERVIEWS_KEY_PREFIX}{}", talent.id))?
                .unwrap_or_default();

        candidates.push(Candidate {
            notes: notes.remove(&talent.id).unwrap_or_default(),
            tags: tags.remove(&talent.id).unwrap_or_default(),
            id: talent.id,
            name: talent.name,
            job_title: talent.job_title,
            stage: talent.status,
            skills: talent.skills,
            location: talent.location,
            messages,
            interviews,
            offer,
        });
    }

    CandidateStore::from_parts(candidates, 1)
}

/// Convenience for importing a browser storage dump straight into a snapshot.
pub fn snapshot_from_entries(
    entries: &BTreeMap<String, String>,
) -> Result<PipelineSnapshot, PersistenceError> {
    decode(entries).map(|store| PipelineSnapshot::capture(&store))
}

fn read_entry<T: DeserializeOwned>(
    entries: &BTreeMap<String, String>,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    entries
        .get(key)
        .filter(|raw| !raw.trim().is_empty() && raw.trim() != "null")
        .map(|raw| serde_json::from_str(raw))
        .transpose()
        .map_err(PersistenceError::from)
}
