//! Interface de linha de comando do autoapply baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, status, check)
//! e flags globais (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// autoapply: candidaturas rápidas automatizadas com ledger de auditoria.
#[derive(Debug, Parser)]
#[command(name = "autoapply", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./autoapply.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Faz login, busca vagas e se candidata às que têm candidatura rápida.
    Run {
        /// Palavra-chave de busca; pode ser repetida. Substitui as do arquivo.
        #[arg(long = "keyword", short = 'k')]
        keywords: Vec<String>,

        /// Máximo de páginas de resultado por palavra-chave.
        #[arg(long)]
        max_pages: Option<u32>,

        /// Roda o navegador sem janela.
        #[arg(long, default_value_t = false)]
        headless: bool,
    },

    /// Mostra o resumo do ledger e as entradas mais recentes.
    Status,

    /// Informa se uma vaga já está registrada no ledger.
    Check {
        /// Id da vaga.
        id: String,
    },
}
