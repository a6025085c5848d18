//! Extraction of one result card into an [`Item`].

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use tracing::debug;

use super::Item;
use crate::browser::{BrowserError, ElementRef, Page};
use crate::selectors;

static ID_IN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/jobs/view/(\d+)|currentJobId=(\d+)").expect("valid regex")
});

const VERIFICATION_BADGE: &str = "with verification";

/// Reads title, organization, location, link and id from `card`.
///
/// Returns `Ok(None)` when any of them is missing; the caller discards the
/// card.
pub async fn extract<P: Page>(
    page: &P,
    card: &ElementRef,
    base_url: &Url,
) -> Result<Option<Item>, BrowserError> {
    page.scroll_into_view(card).await?;

    let title = selectors::CARD_TITLE
        .text(page, Some(card))
        .await?
        .map(|t| normalize_title(&t))
        .filter(|t| !t.is_empty());
    let link = selectors::CARD_TITLE
        .attribute(page, Some(card), "href")
        .await?
        .and_then(|href| resolve_link(base_url, &href));
    let organization = selectors::CARD_COMPANY.text(page, Some(card)).await?;
    let location = selectors::CARD_LOCATION.text(page, Some(card)).await?;

    let id = match page.attribute(card, "data-job-id").await? {
        Some(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        _ => link.as_deref().and_then(id_from_link),
    };

    let (Some(id), Some(title), Some(organization), Some(location), Some(detail_link)) =
        (id, title, organization, location, link)
    else {
        debug!(card = %card.0, "card is missing title, organization, location, link or id");
        return Ok(None);
    };

    Ok(Some(Item {
        id,
        title,
        organization,
        location,
        detail_link,
        supports_quick_submit: false,
    }))
}

/// Item id of `card`: its `data-job-id`, else the id in its title link.
pub async fn card_id<P: Page>(page: &P, card: &ElementRef) -> Result<Option<String>, BrowserError> {
    if let Some(id) = page.attribute(card, "data-job-id").await?
        && !id.trim().is_empty()
    {
        return Ok(Some(id.trim().to_string()));
    }
    let href = selectors::CARD_TITLE
        .attribute(page, Some(card), "href")
        .await?;
    Ok(href.as_deref().and_then(id_from_link))
}

/// Finds the live card for `id`.
///
/// The list re-renders while dialogs are open, so the handle captured at
/// scan time is only trusted if it still reports the same id; otherwise the
/// current list is searched. `Ok(None)` means the card is gone.
pub async fn locate<P: Page>(
    page: &P,
    id: &str,
    cached: &ElementRef,
) -> Result<Option<ElementRef>, BrowserError> {
    match card_id(page, cached).await {
        Ok(Some(found)) if found == id => return Ok(Some(cached.clone())),
        Ok(_) => {}
        Err(e) if e.is_session_lost() => return Err(e),
        Err(e) => debug!(card = %cached.0, error = %e, "cached card handle is stale"),
    }

    for handle in selectors::JOB_CARD.all(page, None).await? {
        if card_id(page, &handle).await?.as_deref() == Some(id) {
            debug!(id, card = %handle.0, "card re-located after re-render");
            return Ok(Some(handle));
        }
    }
    Ok(None)
}

/// Keeps the first line of a title and drops a trailing verification badge.
pub fn normalize_title(raw: &str) -> String {
    let title = raw.split(VERIFICATION_BADGE).next().unwrap_or_default();
    let title = title.lines().next().unwrap_or_default();
    title.trim().to_string()
}

/// Absolute form of a card link; relative links resolve against `base`.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(String::from)
}

fn id_from_link(link: &str) -> Option<String> {
    let caps = ID_IN_LINK.captures(link)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeNode, FakePage};

    fn base() -> Url {
        Url::parse("https://www.linkedin.com").unwrap()
    }

    #[test]
    fn title_normalization() {
        assert_eq!(
            normalize_title("Data Engineer\nData Engineer"),
            "Data Engineer"
        );
        assert_eq!(
            normalize_title("  Data Engineer with verification  "),
            "Data Engineer"
        );
        assert_eq!(normalize_title("\n"), "");
    }

    #[test]
    fn links_resolve_against_base() {
        assert_eq!(
            resolve_link(&base(), "/jobs/view/42/?refId=x").as_deref(),
            Some("https://www.linkedin.com/jobs/view/42/?refId=x")
        );
        assert_eq!(
            resolve_link(&base(), "https://example.com/jobs/view/7").as_deref(),
            Some("https://example.com/jobs/view/7")
        );
        assert_eq!(resolve_link(&base(), "  "), None);
    }

    #[test]
    fn id_is_recovered_from_link() {
        assert_eq!(
            id_from_link("https://www.linkedin.com/jobs/view/4242/").as_deref(),
            Some("4242")
        );
        assert_eq!(
            id_from_link("https://www.linkedin.com/jobs/search/?currentJobId=99").as_deref(),
            Some("99")
        );
        assert_eq!(id_from_link("https://www.linkedin.com/feed/"), None);
    }

    #[tokio::test]
    async fn extracts_card_without_id_attribute() {
        let page = FakePage::single(vec![
            FakeNode::new("card", selectors::JOB_CARD.selectors[0]),
            FakeNode::new("t", selectors::CARD_TITLE.selectors[1])
                .within("card")
                .text("Data Engineer\nData Engineer with verification")
                .attr("href", "/jobs/view/42/"),
            FakeNode::new("c", selectors::CARD_COMPANY.selectors[0])
                .within("card")
                .text("Acme"),
            FakeNode::new("l", selectors::CARD_LOCATION.selectors[2])
                .within("card")
                .text("Boston, MA"),
        ]);

        let item = extract(&page, &ElementRef("card".into()), &base())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.id, "42");
        assert_eq!(item.title, "Data Engineer");
        assert_eq!(item.organization, "Acme");
        assert_eq!(item.location, "Boston, MA");
        assert_eq!(item.detail_link, "https://www.linkedin.com/jobs/view/42/");
        assert!(!item.supports_quick_submit);
    }

    #[tokio::test]
    async fn card_missing_company_is_discarded() {
        let page = FakePage::single(vec![
            FakeNode::new("card", selectors::JOB_CARD.selectors[0]).attr("data-job-id", "1"),
            FakeNode::new("t", selectors::CARD_TITLE.selectors[0])
                .within("card")
                .text("Engineer")
                .attr("href", "/jobs/view/1/"),
            FakeNode::new("l", selectors::CARD_LOCATION.selectors[0])
                .within("card")
                .text("Boston"),
        ]);
        let item = extract(&page, &ElementRef("card".into()), &base())
            .await
            .unwrap();
        assert!(item.is_none());
    }

    #[tokio::test]
    async fn locate_follows_a_rerendered_card() {
        let page = FakePage::single(vec![
            FakeNode::new("card-1", selectors::JOB_CARD.selectors[0]).attr("data-job-id", "1"),
            FakeNode::new("card-2-rerendered", selectors::JOB_CARD.selectors[0])
                .attr("data-job-id", "2"),
        ]);

        let found = locate(&page, "2", &ElementRef("card-2".into())).await.unwrap();
        assert_eq!(found, Some(ElementRef("card-2-rerendered".into())));

        let kept = locate(&page, "1", &ElementRef("card-1".into())).await.unwrap();
        assert_eq!(kept, Some(ElementRef("card-1".into())));
    }

    #[tokio::test]
    async fn locate_rejects_a_reused_handle_and_missing_cards() {
        let page = FakePage::single(vec![
            FakeNode::new("slot", selectors::JOB_CARD.selectors[0]).attr("data-job-id", "9"),
            FakeNode::new("slot-t", selectors::CARD_TITLE.selectors[0])
                .within("slot")
                .attr("href", "/jobs/view/9/"),
        ]);

        // The handle now points at a different posting.
        let found = locate(&page, "3", &ElementRef("slot".into())).await.unwrap();
        assert_eq!(found, None);
        assert_eq!(
            card_id(&page, &ElementRef("slot".into())).await.unwrap().as_deref(),
            Some("9")
        );
    }
}
