//! Authenticated-session collaborator.
//!
//! Logs in with the configured credentials and, when the site interposes a
//! security challenge, waits (bounded) for the user to solve it in the
//! browser window. Everything downstream assumes this has succeeded.

use reqwest::Url;
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

use crate::browser::{BrowserError, Page};
use crate::config::{Credentials, Timing};
use crate::error::AutoApplyError;
use crate::selectors;

const CHALLENGE_PROBES: u32 = 3;

/// URL areas that only an authenticated session reaches.
pub fn is_authenticated_url(url: &str) -> bool {
    url.contains("/feed") || url.contains("/jobs")
}

pub async fn login<P: Page>(
    page: &P,
    base_url: &Url,
    credentials: &Credentials,
    timing: &Timing,
) -> Result<(), AutoApplyError> {
    if credentials.email.is_empty() || credentials.password.is_empty() {
        return Err(AutoApplyError::Config(
            "login needs credentials.email and credentials.password (or AUTOAPPLY_EMAIL / AUTOAPPLY_PASSWORD)"
                .into(),
        ));
    }

    let mut login_url = base_url.clone();
    login_url.set_path("/login");
    page.goto(login_url.as_str()).await?;

    let Some(email) = selectors::LOGIN_EMAIL
        .wait(page, None, timing.list_timeout(), timing.poll())
        .await?
    else {
        if is_authenticated_url(&page.current_url().await?) {
            info!("already logged in");
            return Ok(());
        }
        return Err(AutoApplyError::Session("login form did not appear".into()));
    };
    page.fill(&email, &credentials.email).await?;

    let password = selectors::LOGIN_PASSWORD
        .first(page, None)
        .await?
        .ok_or_else(|| BrowserError::NoSuchElement(selectors::LOGIN_PASSWORD.name.into()))?;
    page.fill(&password, &credentials.password).await?;

    let submit = selectors::LOGIN_SUBMIT
        .first(page, None)
        .await?
        .ok_or_else(|| BrowserError::NoSuchElement(selectors::LOGIN_SUBMIT.name.into()))?;
    page.click(&submit).await?;
    sleep(timing.page_load()).await;

    if challenge_present(page, timing).await? {
        warn!("security check detected, complete it in the browser window");
    } else if is_authenticated_url(&page.current_url().await?) {
        info!("logged in");
        return Ok(());
    }

    wait_until_authenticated(page, timing).await
}

/// Probes the challenge selectors a few times, since the challenge may
/// render after the redirect settles.
async fn challenge_present<P: Page>(page: &P, timing: &Timing) -> Result<bool, BrowserError> {
    for probe in 1..=CHALLENGE_PROBES {
        if selectors::SECURITY_CHALLENGE.first(page, None).await?.is_some() {
            return Ok(true);
        }
        if probe < CHALLENGE_PROBES {
            sleep(timing.action_settle()).await;
        }
    }
    Ok(false)
}

async fn wait_until_authenticated<P: Page>(
    page: &P,
    timing: &Timing,
) -> Result<(), AutoApplyError> {
    let deadline = Instant::now() + timing.challenge_timeout();
    loop {
        if is_authenticated_url(&page.current_url().await?) {
            info!("security check completed");
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(AutoApplyError::Session(format!(
                "login did not complete within {}s",
                timing.challenge_timeout().as_secs()
            )));
        }
        sleep(timing.challenge_poll()).await;
    }
}
