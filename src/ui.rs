//! Interface de terminal do autoapply: spinners e saída colorida.
//!
//! Usa as crates `indicatif` para spinners de progresso e `console` para
//! estilização com cores. O [`ItemProgress`] acompanha visualmente o
//! processamento de uma vaga; [`print_summary`] e [`print_status`] imprimem
//! os relatórios de fim de execução e do ledger. Nada aqui influencia o
//! fluxo de controle.

use std::collections::BTreeMap;
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::discovery::Item;
use crate::ledger::LedgerEntry;
use crate::orchestrator::{ItemResult, RunSummary};
use crate::state_machine::{FlowState, Outcome};

// Quantidade de entradas recentes mostradas por `status`.
const RECENT_ENTRIES: usize = 10;

struct Palette {
    green: Style,
    red: Style,
    yellow: Style,
    dim: Style,
}

impl Palette {
    fn new() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
        }
    }

    fn for_outcome(&self, outcome: &Outcome) -> (&Style, &'static str) {
        match outcome.state() {
            FlowState::Submitted => (&self.green, "✓"),
            FlowState::Skipped => (&self.dim, "–"),
            FlowState::Discarded => (&self.yellow, "↺"),
            FlowState::Error | FlowState::Filling => (&self.red, "✗"),
        }
    }
}

/// Indicador visual de progresso para uma vaga no terminal.
pub struct ItemProgress {
    // Spinner do indicatif.
    pb: ProgressBar,
    palette: Palette,
    label: String,
}

impl ItemProgress {
    /// Inicia o spinner com título e empresa da vaga.
    pub fn start(item: &Item) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        let label = format!("{} @ {} [{}]", item.title, item.organization, item.id);
        pb.set_message(format!("FILLING: {label}"));
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            palette: Palette::new(),
            label,
        }
    }

    /// Atualiza a mensagem do spinner com o passo atual do formulário.
    pub fn step(&self, step: u32, action: &str) {
        self.pb
            .set_message(format!("step {step} ({action}): {}", self.label));
    }

    /// Finaliza o spinner e exibe o resultado da vaga.
    pub fn complete(&self, result: &ItemResult) {
        self.pb.finish_and_clear();
        match result {
            ItemResult::AlreadyRecorded => {
                println!(
                    "  {} {} (already in ledger)",
                    self.palette.dim.apply_to("="),
                    self.label
                );
            }
            ItemResult::CardGone => {
                println!(
                    "  {} {} (card vanished, left for next run)",
                    self.palette.yellow.apply_to("?"),
                    self.label
                );
            }
            ItemResult::Recorded(outcome) => {
                let (style, mark) = self.palette.for_outcome(outcome);
                println!("  {} {}: {outcome}", style.apply_to(mark), self.label);
            }
        }
    }
}

/// Imprime o resumo de uma execução de `run`.
pub fn print_summary(summary: &RunSummary) {
    let palette = Palette::new();
    println!();
    println!("{}", palette.green.apply_to("─── Run Summary ───"));
    println!("  pages scanned     {}", summary.pages);
    println!("  cards seen        {}", summary.scan.cards);
    println!("  malformed cards   {}", summary.scan.malformed);
    println!("  filtered out      {}", summary.scan.filtered);
    println!("  duplicates        {}", summary.scan.duplicates);
    println!("  already recorded  {}", summary.already_recorded);
    if summary.cards_gone > 0 {
        println!("  cards vanished    {}", summary.cards_gone);
    }
    if summary.aborted_keywords > 0 {
        println!(
            "  {} {} keyword(s) aborted after session loss",
            palette.red.apply_to("!"),
            summary.aborted_keywords
        );
    }
    for (outcome, count) in &summary.outcomes {
        println!("  {outcome:<36} {count}");
    }
}

/// Imprime a contagem por status do ledger e as entradas mais recentes.
pub fn print_status(entries: &[LedgerEntry]) {
    let palette = Palette::new();
    if entries.is_empty() {
        println!("{}", palette.dim.apply_to("Ledger is empty."));
        return;
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for entry in entries {
        *counts.entry(outcome_bucket(&entry.outcome)).or_default() += 1;
    }

    println!("{}", palette.green.apply_to("─── Ledger ───"));
    println!("  {} entries", entries.len());
    for (outcome, count) in &counts {
        println!("  {outcome:<36} {count}");
    }

    let mut recent: Vec<&LedgerEntry> = entries.iter().collect();
    recent.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    println!();
    println!("{}", palette.green.apply_to("─── Most recent ───"));
    for entry in recent.into_iter().take(RECENT_ENTRIES) {
        let (style, mark) = palette.for_outcome(&entry.outcome);
        println!(
            "  {} {} {} @ {} [{}]: {}",
            style.apply_to(mark),
            entry.recorded_at.format("%Y-%m-%d %H:%M"),
            entry.title,
            entry.organization,
            entry.id,
            entry.outcome
        );
    }
}

/// Chave de agrupamento: mensagens de erro livres caem num balde só.
pub fn outcome_bucket(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Error(_) => "error - <message>".to_string(),
        other => other.to_string(),
    }
}
