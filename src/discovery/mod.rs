//! Discovery pipeline: search, load every card on a page, extract, filter,
//! de-duplicate, paginate.

pub mod card;
pub mod filter;

use std::collections::HashSet;

use reqwest::Url;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::{BrowserError, ElementRef, Page};
use crate::config::{SearchConfig, Timing};
use crate::selectors;

pub use filter::ItemFilter;

/// A discovered posting. Immutable once extracted; `id` is the dedup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub organization: String,
    pub location: String,
    pub detail_link: String,
    pub supports_quick_submit: bool,
}

impl Item {
    #[cfg(test)]
    pub fn sample(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: "Data Engineer".to_string(),
            organization: "Acme".to_string(),
            location: "Boston, MA".to_string(),
            detail_link: format!("https://www.linkedin.com/jobs/view/{id}/"),
            supports_quick_submit: true,
        }
    }
}

/// An item together with the card it was read from. The handle is only a
/// hint: [`card::locate`] re-checks it against the live list before use.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub item: Item,
    pub card: ElementRef,
}

/// Ids already yielded during this run, across pages and keywords.
#[derive(Debug, Default)]
pub struct SeenIds(HashSet<String>);

impl SeenIds {
    /// Records `id`; false if it was already seen.
    pub fn insert(&mut self, id: &str) -> bool {
        self.0.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub cards: usize,
    pub malformed: usize,
    pub filtered: usize,
    pub duplicates: usize,
}

impl ScanStats {
    pub fn merge(&mut self, other: ScanStats) {
        self.cards += other.cards;
        self.malformed += other.malformed;
        self.filtered += other.filtered;
        self.duplicates += other.duplicates;
    }
}

/// Result of scanning one result page.
#[derive(Debug, Default)]
pub struct PageScan {
    pub candidates: Vec<Candidate>,
    pub stats: ScanStats,
}

/// Search URL with the quick-apply and past-24-hours filters applied.
pub fn search_url(base: &Url, keyword: &str, location: &str) -> Url {
    let mut url = base.clone();
    url.set_path("/jobs/search/");
    url.query_pairs_mut()
        .clear()
        .append_pair("keywords", keyword)
        .append_pair("location", location)
        .append_pair("f_AL", "true")
        .append_pair("f_TPR", "r86400");
    url
}

pub struct Discovery<'a, P> {
    page: &'a P,
    base_url: &'a Url,
    search: &'a SearchConfig,
    timing: &'a Timing,
    filter: ItemFilter,
}

impl<'a, P: Page> Discovery<'a, P> {
    pub fn new(page: &'a P, base_url: &'a Url, search: &'a SearchConfig, timing: &'a Timing) -> Self {
        Self {
            page,
            base_url,
            search,
            timing,
            filter: ItemFilter::from_config(search),
        }
    }

    /// Navigates to the search results for `keyword`.
    pub async fn open(&self, keyword: &str) -> Result<Url, BrowserError> {
        let url = search_url(self.base_url, keyword, &self.search.location);
        info!(keyword, url = %url, "opening search");
        self.page.goto(url.as_str()).await?;
        sleep(self.timing.page_load()).await;
        Ok(url)
    }

    /// Waits for the result list, then scrolls until the card count is
    /// stable or the round cap is hit. A list that never appears is a
    /// [`BrowserError::Timeout`].
    pub async fn load_all(&self) -> Result<Vec<ElementRef>, BrowserError> {
        let first = selectors::JOB_CARD
            .wait(self.page, None, self.timing.list_timeout(), self.timing.poll())
            .await?;
        if first.is_none() {
            return Err(BrowserError::Timeout("job list did not appear".into()));
        }

        let container = selectors::RESULTS_CONTAINER.first(self.page, None).await?;
        let mut count = self.card_count().await?;
        let mut stable = false;

        for round in 1..=self.search.max_scroll_rounds {
            self.page.scroll_to_bottom(container.as_ref()).await?;
            sleep(self.timing.scroll_settle()).await;
            let mut now = self.card_count().await?;

            if now == count {
                self.page.scroll_by(self.search.nudge_px).await?;
                sleep(self.timing.nudge_settle()).await;
                now = self.card_count().await?;
                if now == count {
                    debug!(round, cards = now, "result list stable");
                    stable = true;
                    break;
                }
            }
            debug!(round, before = count, after = now, "more cards loaded");
            count = now;
        }

        if !stable {
            debug!(cards = count, "scroll round cap reached, using what loaded");
        }
        selectors::JOB_CARD.all(self.page, None).await
    }

    /// Loads the current page and turns its cards into fresh candidates.
    ///
    /// Per-card failures are logged and the card skipped; only a lost
    /// session propagates.
    pub async fn scan(&self, seen: &mut SeenIds) -> Result<PageScan, BrowserError> {
        let cards = self.load_all().await?;
        let mut scan = PageScan::default();

        for handle in cards {
            scan.stats.cards += 1;
            let item = match card::extract(self.page, &handle, self.base_url).await {
                Ok(Some(item)) => item,
                Ok(None) => {
                    scan.stats.malformed += 1;
                    warn!(card = %handle.0, "skipping card with missing fields");
                    continue;
                }
                Err(e) if e.is_session_lost() => return Err(e),
                Err(e) => {
                    scan.stats.malformed += 1;
                    warn!(card = %handle.0, error = %e, "failed to parse card");
                    continue;
                }
            };

            if let Err(rejection) = self.filter.check(&item) {
                scan.stats.filtered += 1;
                info!(id = %item.id, title = %item.title, ?rejection, "filtered out");
                continue;
            }
            if !seen.insert(&item.id) {
                scan.stats.duplicates += 1;
                debug!(id = %item.id, "duplicate id, skipping");
                continue;
            }
            scan.candidates.push(Candidate { item, card: handle });
        }

        Ok(scan)
    }

    /// Clicks the next-page control if it is present and enabled.
    pub async fn next_page(&self) -> Result<bool, BrowserError> {
        sleep(self.timing.action_settle()).await;
        let Some(next) = selectors::NEXT_PAGE.first(self.page, None).await? else {
            return Ok(false);
        };
        if !self.page.is_enabled(&next).await? {
            return Ok(false);
        }
        self.page.click(&next).await?;
        sleep(self.timing.page_load()).await;
        Ok(true)
    }

    async fn card_count(&self) -> Result<usize, BrowserError> {
        Ok(selectors::JOB_CARD.all(self.page, None).await?.len())
    }
}
