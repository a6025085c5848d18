use super::Item;
use crate::config::SearchConfig;

/// Why an item was filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Location(String),
    ExcludedKeyword(String),
}

/// Inclusion/exclusion predicates applied to every extracted card.
///
/// Both lists are matched case-insensitively as substrings. An empty
/// location allow-list admits every location.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    allowed_locations: Vec<String>,
    excluded_keywords: Vec<String>,
}

impl ItemFilter {
    pub fn new(allowed_locations: &[String], excluded_keywords: &[String]) -> Self {
        let lower = |values: &[String]| {
            values
                .iter()
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .collect()
        };
        Self {
            allowed_locations: lower(allowed_locations),
            excluded_keywords: lower(excluded_keywords),
        }
    }

    pub fn from_config(search: &SearchConfig) -> Self {
        Self::new(&search.allowed_locations, &search.excluded_keywords)
    }

    pub fn check(&self, item: &Item) -> Result<(), Rejection> {
        let location = item.location.to_lowercase();
        if !self.allowed_locations.is_empty()
            && !self.allowed_locations.iter().any(|l| location.contains(l))
        {
            return Err(Rejection::Location(item.location.clone()));
        }

        let title = item.title.to_lowercase();
        if let Some(keyword) = self.excluded_keywords.iter().find(|k| title.contains(*k)) {
            return Err(Rejection::ExcludedKeyword(keyword.clone()));
        }
        Ok(())
    }
}
