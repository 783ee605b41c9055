use serde::{Deserialize, Serialize};

use super::domain::{Candidate, Stage};

const DEFAULT_PER_PAGE: usize = 10;
const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Name,
    Stage,
}

/// Talent directory filter: free text, stage, tag and location, then sort and page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateQuery {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub per_page: Option<usize>,
}

impl CandidateQuery {
    pub fn matches(&self, candidate: &Candidate) -> bool {
        if self.stage.is_some_and(|stage| stage != candidate.stage) {
            return false;
        }

        if let Some(tag) = non_blank(&self.tag) {
            if !candidate.tags.iter().any(|held| held.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }

        if let Some(location) = non_blank(&self.location) {
            let needle = location.to_lowercase();
            let held = candidate.location.as_deref().unwrap_or_default();
            if !held.to_lowercase().contains(&needle) {
                return false;
            }
        }

        match non_blank(&self.text) {
            Some(text) => {
                let needle = text.to_lowercase();
                std::iter::once(candidate.name.as_str())
                    .chain(std::iter::once(candidate.job_title.as_str()))
                    .chain(candidate.skills.iter().map(String::as_str))
                    .any(|field| field.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }

    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> usize {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    /// Sort and paginate candidates that already passed `matches`.
    pub fn paginate(&self, mut matched: Vec<Candidate>) -> CandidatePage {
        match self.sort {
            SortOrder::Newest => {}
            SortOrder::Name => matched.sort_by_key(|candidate| candidate.name.to_lowercase()),
            SortOrder::Stage => matched.sort_by_key(|candidate| candidate.stage),
        }

        let total = matched.len();
        let page = self.page();
        let per_page = self.per_page();
        let total_pages = total.div_ceil(per_page);
        let items = matched
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        CandidatePage {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

/// One page of directory results.
#[derive(Debug, Clone, Serialize)]
pub struct CandidatePage {
    pub items: Vec<Candidate>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
