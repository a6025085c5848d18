//! Screenshot capture for post-mortem inspection.
//!
//! Purely advisory: a failed capture is logged and otherwise ignored.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::browser::Page;

pub struct Diagnostics {
    dir: PathBuf,
    run_id: Uuid,
}

impl Diagnostics {
    pub fn new(dir: impl Into<PathBuf>, run_id: Uuid) -> Self {
        Self {
            dir: dir.into(),
            run_id,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Saves a screenshot of the current viewport keyed by keyword, page number and kind.
    pub async fn capture<P: Page>(
        &self,
        page: &P,
        keyword: &str,
        page_number: u32,
        kind: &str,
    ) -> Option<PathBuf> {
        let png = match page.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                warn!(error = %e, kind, "screenshot failed");
                return None;
            }
        };

        let path = self.dir.join(self.file_name(keyword, page_number, kind));
        let written = fs::create_dir_all(&self.dir).and_then(|_| fs::write(&path, png));
        match written {
            Ok(()) => {
                debug!(path = %path.display(), "screenshot saved");
                Some(path)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not write screenshot");
                None
            }
        }
    }

    fn file_name(&self, keyword: &str, page_number: u32, kind: &str) -> String {
        let run = self.run_id.simple().to_string();
        format!(
            "{}_{}_p{page_number}_{}.png",
            &run[..8],
            slug(keyword),
            slug(kind)
        )
    }
}

fn slug(text: &str) -> String {
    let slug: String = text
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let parts: Vec<&str> = slug.split('-').filter(|p| !p.is_empty()).collect();
    parts.join("-")
}
