use std::collections::BTreeMap;

use anyhow::Result;
use reqwest::Url;
use tokio::time::sleep;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::browser::{BrowserError, ElementRef, Page};
use crate::config::{AutoApplyConfig, Timing};
use crate::diagnostics::Diagnostics;
use crate::discovery::{Candidate, Discovery, ScanStats, SeenIds, card};
use crate::form::{ControlKind, FormStep, StepClassifier, StepFiller};
use crate::ledger::Ledger;
use crate::profile::CandidateProfile;
use crate::selectors;
use crate::state_machine::{Attempt, Decision, FlowLimits, Outcome, StepMachine};
use crate::ui::{ItemProgress, outcome_bucket};

/// Confirmation dialogs after a submit get this many dismissal attempts.
const CONFIRMATION_ATTEMPTS: u32 = 2;

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemResult {
    /// The ledger already had the id; nothing was touched.
    AlreadyRecorded,
    /// The flow ran to a terminal outcome, which was written to the ledger.
    Recorded(Outcome),
    /// The card disappeared from the list before it could be opened.
    /// Nothing is written, so a later run picks the item up again.
    CardGone,
}

/// Drives one item from its result card to a terminal ledger entry.
pub struct ApplyEngine {
    ledger: Ledger,
    filler: StepFiller,
    limits: FlowLimits,
    timing: Timing,
}

impl ApplyEngine {
    pub fn new(ledger: Ledger, profile: CandidateProfile, limits: FlowLimits, timing: Timing) -> Self {
        let filler = StepFiller::new(
            StepClassifier::new(profile),
            limits.numeric_attempts,
            timing.field_settle(),
        );
        Self {
            ledger,
            filler,
            limits,
            timing,
        }
    }

    #[cfg(test)]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Runs the submission flow for `candidate` unless the ledger already
    /// knows it.
    ///
    /// Every failure after the card is opened becomes a recorded outcome. A
    /// lost session is recorded too and then returned, since nothing else
    /// can proceed on this page.
    pub async fn process<P: Page>(
        &self,
        page: &P,
        candidate: &Candidate,
    ) -> Result<ItemResult, BrowserError> {
        let item = &candidate.item;
        if self.ledger.has(&item.id) {
            info!(id = %item.id, "already in ledger, skipping");
            return Ok(ItemResult::AlreadyRecorded);
        }

        let card = match card::locate(page, &item.id, &candidate.card).await {
            Ok(Some(card)) => card,
            Ok(None) => {
                warn!(id = %item.id, "card no longer in the list, leaving it for a later run");
                return Ok(ItemResult::CardGone);
            }
            Err(e) if e.is_session_lost() => return Err(e),
            Err(e) => {
                warn!(id = %item.id, error = %e, "could not re-locate card");
                return Ok(ItemResult::CardGone);
            }
        };

        let progress = ItemProgress::start(item);
        let mut attempt = Attempt::new(item.clone(), self.limits.clone());

        let (outcome, fatal) = match self
            .open_and_apply(page, &card, &mut attempt, &progress)
            .await
        {
            Ok(outcome) => (outcome, None),
            Err(e) if e.is_session_lost() => (Outcome::Error(e.to_string()), Some(e)),
            Err(e) if e.is_timeout() => {
                warn!(error = %e, "flow timed out");
                self.discard(page).await;
                (Outcome::ErrorTimeout, None)
            }
            Err(e) => {
                warn!(error = %e, "flow failed");
                self.discard(page).await;
                (Outcome::Error(e.to_string()), None)
            }
        };

        attempt.finish(outcome.clone());
        self.record(&attempt);

        let result = ItemResult::Recorded(outcome);
        progress.complete(&result);
        match fatal {
            Some(e) => Err(e),
            None => Ok(result),
        }
    }

    /// Logs the finished attempt and writes its outcome to the ledger.
    /// A ledger write failure is logged and does not stop the run.
    fn record(&self, attempt: &Attempt) {
        let Some(outcome) = &attempt.outcome else {
            return;
        };
        info!(
            outcome = %outcome,
            quick_apply = attempt.item.supports_quick_submit,
            steps = attempt.steps,
            reviews = attempt.review_attempts,
            elapsed_ms = attempt.elapsed_ms(),
            history = ?attempt.state_history,
            "item finished"
        );

        if let Err(e) = self.ledger.record(
            &attempt.item.id,
            &attempt.item.title,
            &attempt.item.organization,
            outcome,
        ) {
            error!(id = %attempt.item.id, error = %e, "could not write ledger entry");
        }
    }

    async fn open_and_apply<P: Page>(
        &self,
        page: &P,
        card: &ElementRef,
        attempt: &mut Attempt,
        progress: &ItemProgress,
    ) -> Result<Outcome, BrowserError> {
        debug!(link = %attempt.item.detail_link, "opening details");
        page.click(card).await?;
        sleep(self.timing.action_settle()).await;

        let pane = selectors::DETAILS_PANE
            .wait(page, None, self.timing.details_timeout(), self.timing.poll())
            .await?;
        if pane.is_none() {
            return Ok(Outcome::ErrorDetailsPane);
        }

        let Some(quick_apply) = selectors::QUICK_APPLY.first(page, None).await? else {
            attempt.item.supports_quick_submit = false;
            return Ok(Outcome::SkippedNoApplyButton);
        };
        attempt.item.supports_quick_submit = true;

        page.click(&quick_apply).await?;
        sleep(self.timing.action_settle()).await;
        self.run_flow(page, attempt, progress).await
    }

    /// The transition loop: read the step, fill it, decide, act, re-read.
    async fn run_flow<P: Page>(
        &self,
        page: &P,
        attempt: &mut Attempt,
        progress: &ItemProgress,
    ) -> Result<Outcome, BrowserError> {
        let opened = selectors::DIALOG
            .wait(page, None, self.timing.dialog_timeout(), self.timing.poll())
            .await?;
        if opened.is_none() {
            return Err(BrowserError::Timeout("submission dialog did not open".into()));
        }

        loop {
            let step = match selectors::DIALOG.first(page, None).await? {
                Some(dialog) => {
                    page.scroll_into_view(&dialog).await?;
                    page.scroll_to_bottom(Some(&dialog)).await?;
                    let step = FormStep::read(page, &dialog).await?;
                    let report = self.filler.fill(page, &step).await?;
                    debug!(
                        fields = step.fields.len(),
                        filled = report.filled,
                        prefilled = report.prefilled,
                        unresolved = ?report.unresolved,
                        "step filled"
                    );
                    step
                }
                // The dialog closed underneath us: nothing left to act on.
                None => FormStep::default(),
            };

            let observation = step.observe();
            let decision = StepMachine::next(attempt, &observation);
            debug!(
                step = attempt.steps,
                fingerprint = %observation.fingerprint,
                stall = attempt.stall_count,
                ?decision,
                "decision"
            );

            match decision {
                Decision::Submit => {
                    progress.step(attempt.steps, "submit");
                    self.click_control(page, &step, ControlKind::Submit).await?;
                    self.dismiss_confirmation(page).await;
                    return Ok(Outcome::Applied);
                }
                Decision::Review { escalate } => {
                    progress.step(attempt.steps, "review");
                    self.click_control(page, &step, ControlKind::Review).await?;
                    if !escalate {
                        attempt.reenter();
                        continue;
                    }

                    info!(reviews = attempt.review_attempts, "review budget spent, trying submit");
                    let dialog = selectors::DIALOG.first(page, None).await?;
                    if let Some(submit) = selectors::SUBMIT.first(page, dialog.as_ref()).await? {
                        page.click(&submit).await?;
                        sleep(self.timing.action_settle()).await;
                        self.dismiss_confirmation(page).await;
                        return Ok(Outcome::Applied);
                    }
                    self.discard(page).await;
                    return Ok(Outcome::DiscardedStuckInReview);
                }
                Decision::Advance => {
                    progress.step(attempt.steps, "next");
                    self.click_control(page, &step, ControlKind::Advance).await?;
                    attempt.reenter();
                }
                Decision::Discard(outcome) => {
                    info!(stall = attempt.stall_count, steps = attempt.steps, "flow is stuck");
                    self.discard(page).await;
                    return Ok(outcome);
                }
                Decision::Skip => {
                    info!("no submit, review or next control on step");
                    self.discard(page).await;
                    return Ok(Outcome::SkippedUnsupported);
                }
            }
        }
    }

    async fn click_control<P: Page>(
        &self,
        page: &P,
        step: &FormStep,
        kind: ControlKind,
    ) -> Result<(), BrowserError> {
        let control = step
            .control(kind)
            .ok_or_else(|| BrowserError::NoSuchElement(kind.locator().name.into()))?;
        page.click(&control.handle).await?;
        sleep(self.timing.action_settle()).await;
        Ok(())
    }

    /// Best effort: closes the post-submit confirmation if one shows up.
    async fn dismiss_confirmation<P: Page>(&self, page: &P) {
        for attempt in 1..=CONFIRMATION_ATTEMPTS {
            let button = match selectors::CONFIRMATION_DONE.first(page, None).await {
                Ok(Some(button)) => Some(button),
                _ => selectors::CONFIRMATION_FALLBACK
                    .first(page, None)
                    .await
                    .ok()
                    .flatten(),
            };
            if let Some(button) = button {
                match page.click(&button).await {
                    Ok(()) => {
                        sleep(self.timing.action_settle()).await;
                        return;
                    }
                    Err(e) => debug!(attempt, error = %e, "confirmation click failed"),
                }
            }
            sleep(self.timing.action_settle()).await;
        }
    }

    /// Best effort: closes the dialog and confirms discarding the draft.
    async fn discard<P: Page>(&self, page: &P) {
        if let Err(e) = self.try_discard(page).await {
            debug!(error = %e, "could not discard dialog");
        }
    }

    async fn try_discard<P: Page>(&self, page: &P) -> Result<(), BrowserError> {
        if let Some(dismiss) = selectors::DISMISS.first(page, None).await? {
            page.click(&dismiss).await?;
            sleep(self.timing.action_settle()).await;
        }
        if let Some(confirm) = selectors::DISCARD.first(page, None).await? {
            page.click(&confirm).await?;
            sleep(self.timing.action_settle()).await;
        }
        Ok(())
    }
}

/// Counters for the end-of-run report.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub pages: u32,
    pub scan: ScanStats,
    pub already_recorded: usize,
    pub cards_gone: usize,
    pub outcomes: BTreeMap<String, usize>,
    pub aborted_keywords: usize,
}

impl RunSummary {
    pub fn record(&mut self, result: &ItemResult) {
        match result {
            ItemResult::AlreadyRecorded => self.already_recorded += 1,
            ItemResult::CardGone => self.cards_gone += 1,
            ItemResult::Recorded(outcome) => {
                *self.outcomes.entry(outcome_bucket(outcome)).or_default() += 1;
            }
        }
    }

    pub fn count(&self, outcome: &Outcome) -> usize {
        self.outcomes
            .get(&outcome_bucket(outcome))
            .copied()
            .unwrap_or(0)
    }
}

/// Runs the keyword → page → item loop over one browsing context.
pub struct Orchestrator<'a, P> {
    page: &'a P,
    config: &'a AutoApplyConfig,
    base_url: Url,
    engine: ApplyEngine,
    diagnostics: Diagnostics,
}

impl<'a, P: Page> Orchestrator<'a, P> {
    pub fn new(page: &'a P, config: &'a AutoApplyConfig, run_id: Uuid) -> Result<Self> {
        let engine = ApplyEngine::new(
            Ledger::new(&config.ledger_path),
            config.profile.clone(),
            config.flow.clone(),
            config.timing.clone(),
        );
        Ok(Self {
            page,
            config,
            base_url: config.base_url()?,
            engine,
            diagnostics: Diagnostics::new(&config.screenshots_dir, run_id),
        })
    }

    pub async fn run(&self) -> RunSummary {
        let span = info_span!("run", run_id = %self.diagnostics.run_id());
        async {
            let mut summary = RunSummary::default();
            let mut seen = SeenIds::default();

            for keyword in &self.config.search.keywords {
                let span = info_span!("keyword", keyword = %keyword);
                let outcome = self
                    .run_keyword(keyword, &mut seen, &mut summary)
                    .instrument(span)
                    .await;
                match outcome {
                    Ok(()) => {}
                    Err(e) if e.is_session_lost() => {
                        error!(keyword = %keyword, error = %e, "session lost, abandoning keyword");
                        summary.aborted_keywords += 1;
                    }
                    Err(e) => {
                        warn!(keyword = %keyword, error = %e, "keyword aborted");
                        self.diagnostics
                            .capture(self.page, keyword, summary.pages, "keyword-error")
                            .await;
                    }
                }
            }

            info!(
                pages = summary.pages,
                cards = summary.scan.cards,
                unique = seen.len(),
                applied = summary.count(&Outcome::Applied),
                "run finished"
            );
            summary
        }
        .instrument(span)
        .await
    }

    async fn run_keyword(
        &self,
        keyword: &str,
        seen: &mut SeenIds,
        summary: &mut RunSummary,
    ) -> Result<(), BrowserError> {
        let discovery = Discovery::new(
            self.page,
            &self.base_url,
            &self.config.search,
            &self.config.timing,
        );
        discovery.open(keyword).await?;

        for page_number in 1..=self.config.search.max_pages {
            let scan = match discovery.scan(seen).await {
                Ok(scan) => scan,
                Err(e) if e.is_session_lost() => return Err(e),
                Err(e) => {
                    warn!(page = page_number, error = %e, "could not load result list");
                    self.diagnostics
                        .capture(self.page, keyword, page_number, "list-timeout")
                        .await;
                    return Ok(());
                }
            };
            summary.pages += 1;
            summary.scan.merge(scan.stats);
            info!(
                page = page_number,
                cards = scan.stats.cards,
                candidates = scan.candidates.len(),
                "page scanned"
            );

            for candidate in &scan.candidates {
                let span = info_span!("item", item_id = %candidate.item.id);
                let result = self.engine.process(self.page, candidate).instrument(span).await?;
                summary.record(&result);
            }

            if page_number == self.config.search.max_pages {
                info!(max_pages = page_number, "page cap reached");
                break;
            }
            match discovery.next_page().await {
                Ok(true) => debug!(page = page_number + 1, "next page"),
                Ok(false) => {
                    info!(page = page_number, "no more pages");
                    break;
                }
                Err(e) if e.is_session_lost() => return Err(e),
                Err(e) => {
                    warn!(error = %e, "pagination failed");
                    break;
                }
            }
        }
        Ok(())
    }
}
