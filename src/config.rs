//! Configuração do autoapply carregada a partir de `autoapply.toml`.
//!
//! A struct [`AutoApplyConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `AUTOAPPLY_EMAIL`, `AUTOAPPLY_PASSWORD` e
//! `AUTOAPPLY_WEBDRIVER_URL` têm precedência sobre o arquivo.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;

use crate::profile::CandidateProfile;
use crate::state_machine::FlowLimits;

pub const DEFAULT_CONFIG_FILE: &str = "autoapply.toml";

/// Configuração de nível superior carregada de `autoapply.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AutoApplyConfig {
    /// Endpoint do servidor WebDriver (chromedriver, geckodriver...).
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default)]
    pub headless: bool,

    /// Origem do site; links relativos dos cards são resolvidos contra ela.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Arquivo CSV do ledger de auditoria.
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    #[serde(default = "default_screenshots_dir")]
    pub screenshots_dir: PathBuf,

    /// Pula o login quando o perfil do navegador já está autenticado.
    #[serde(default)]
    pub skip_login: bool,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub flow: FlowLimits,

    #[serde(default)]
    pub timing: Timing,

    #[serde(default)]
    pub credentials: Credentials,

    #[serde(default)]
    pub profile: CandidateProfile,
}

/// Parâmetros da busca e do carregamento das páginas de resultado.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    #[serde(default = "default_location")]
    pub location: String,

    /// Substrings aceitas na localização do card. Vazio aceita tudo.
    #[serde(default)]
    pub allowed_locations: Vec<String>,

    /// Palavras que descartam um card quando aparecem no título.
    #[serde(default)]
    pub excluded_keywords: Vec<String>,

    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Teto de rodadas de scroll por página.
    #[serde(default = "default_max_scroll_rounds")]
    pub max_scroll_rounds: u32,

    /// Distância do scroll extra antes de considerar a lista estável.
    #[serde(default = "default_nudge_px")]
    pub nudge_px: i64,
}

/// Esperas e tetos de polling, em milissegundos.
#[derive(Debug, Clone, Deserialize)]
pub struct Timing {
    /// Espera após cliques e navegação dentro do diálogo.
    #[serde(default = "default_action_settle_ms")]
    pub action_settle_ms: u64,

    /// Espera após preencher cada campo.
    #[serde(default = "default_field_settle_ms")]
    pub field_settle_ms: u64,

    #[serde(default = "default_page_load_ms")]
    pub page_load_ms: u64,

    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,

    #[serde(default = "default_nudge_settle_ms")]
    pub nudge_settle_ms: u64,

    #[serde(default = "default_list_timeout_ms")]
    pub list_timeout_ms: u64,

    #[serde(default = "default_details_timeout_ms")]
    pub details_timeout_ms: u64,

    #[serde(default = "default_dialog_timeout_ms")]
    pub dialog_timeout_ms: u64,

    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,

    /// Teto da espera por verificação de segurança após o login.
    #[serde(default = "default_challenge_timeout_ms")]
    pub challenge_timeout_ms: u64,

    #[serde(default = "default_challenge_poll_ms")]
    pub challenge_poll_ms: u64,
}

/// Credenciais de login. O `Debug` nunca mostra a senha.
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_base_url() -> String {
    "https://www.linkedin.com".to_string()
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("applied_jobs.csv")
}

fn default_screenshots_dir() -> PathBuf {
    PathBuf::from("screenshots")
}

fn default_keywords() -> Vec<String> {
    vec!["Data Engineer".to_string()]
}

fn default_location() -> String {
    "United States".to_string()
}

// 25 páginas por keyword, como a paginação do site permite.
fn default_max_pages() -> u32 {
    25
}

fn default_max_scroll_rounds() -> u32 {
    10
}

fn default_nudge_px() -> i64 {
    1000
}

fn default_action_settle_ms() -> u64 {
    2000
}

fn default_field_settle_ms() -> u64 {
    300
}

fn default_page_load_ms() -> u64 {
    4000
}

fn default_scroll_settle_ms() -> u64 {
    2000
}

fn default_nudge_settle_ms() -> u64 {
    1000
}

fn default_list_timeout_ms() -> u64 {
    10_000
}

fn default_details_timeout_ms() -> u64 {
    10_000
}

fn default_dialog_timeout_ms() -> u64 {
    5000
}

fn default_poll_ms() -> u64 {
    500
}

// 10 minutos para o usuário resolver a verificação manualmente.
fn default_challenge_timeout_ms() -> u64 {
    600_000
}

fn default_challenge_poll_ms() -> u64 {
    3000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            location: default_location(),
            allowed_locations: Vec::new(),
            excluded_keywords: Vec::new(),
            max_pages: default_max_pages(),
            max_scroll_rounds: default_max_scroll_rounds(),
            nudge_px: default_nudge_px(),
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            action_settle_ms: default_action_settle_ms(),
            field_settle_ms: default_field_settle_ms(),
            page_load_ms: default_page_load_ms(),
            scroll_settle_ms: default_scroll_settle_ms(),
            nudge_settle_ms: default_nudge_settle_ms(),
            list_timeout_ms: default_list_timeout_ms(),
            details_timeout_ms: default_details_timeout_ms(),
            dialog_timeout_ms: default_dialog_timeout_ms(),
            poll_ms: default_poll_ms(),
            challenge_timeout_ms: default_challenge_timeout_ms(),
            challenge_poll_ms: default_challenge_poll_ms(),
        }
    }
}

impl Timing {
    /// Todas as esperas zeradas, para testes.
    #[cfg(test)]
    pub fn instant() -> Self {
        Self {
            action_settle_ms: 0,
            field_settle_ms: 0,
            page_load_ms: 0,
            scroll_settle_ms: 0,
            nudge_settle_ms: 0,
            list_timeout_ms: 0,
            details_timeout_ms: 0,
            dialog_timeout_ms: 0,
            poll_ms: 0,
            challenge_timeout_ms: 0,
            challenge_poll_ms: 0,
        }
    }

    pub fn action_settle(&self) -> Duration {
        Duration::from_millis(self.action_settle_ms)
    }

    pub fn field_settle(&self) -> Duration {
        Duration::from_millis(self.field_settle_ms)
    }

    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn nudge_settle(&self) -> Duration {
        Duration::from_millis(self.nudge_settle_ms)
    }

    pub fn list_timeout(&self) -> Duration {
        Duration::from_millis(self.list_timeout_ms)
    }

    pub fn details_timeout(&self) -> Duration {
        Duration::from_millis(self.details_timeout_ms)
    }

    pub fn dialog_timeout(&self) -> Duration {
        Duration::from_millis(self.dialog_timeout_ms)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn challenge_timeout(&self) -> Duration {
        Duration::from_millis(self.challenge_timeout_ms)
    }

    pub fn challenge_poll(&self) -> Duration {
        Duration::from_millis(self.challenge_poll_ms)
    }
}

impl Default for AutoApplyConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: false,
            base_url: default_base_url(),
            ledger_path: default_ledger_path(),
            screenshots_dir: default_screenshots_dir(),
            skip_login: false,
            search: SearchConfig::default(),
            flow: FlowLimits::default(),
            timing: Timing::default(),
            credentials: Credentials::default(),
            profile: CandidateProfile::default(),
        }
    }
}

impl AutoApplyConfig {
    /// Carrega a configuração de `path`, ou de `autoapply.toml` no diretório
    /// atual. Usa valores padrão se o arquivo padrão não existir; um arquivo
    /// pedido explicitamente precisa existir.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str::<AutoApplyConfig>(&contents)
            .with_context(|| format!("parsing config {}", path.display()))
    }

    /// Variáveis de ambiente têm precedência sobre o arquivo de configuração.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(email) = var("AUTOAPPLY_EMAIL")
            && !email.is_empty()
        {
            self.credentials.email = email;
        }
        if let Some(password) = var("AUTOAPPLY_PASSWORD")
            && !password.is_empty()
        {
            self.credentials.password = password;
        }
        if let Some(url) = var("AUTOAPPLY_WEBDRIVER_URL")
            && !url.is_empty()
        {
            self.webdriver_url = url;
        }
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).with_context(|| format!("invalid base_url {}", self.base_url))
    }
}
