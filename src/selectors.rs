//! Locator tables for the job board's UI.
//!
//! Every element the crate touches is reached through one of these chains.
//! Layout changes are absorbed by appending selectors; nothing else needs
//! to change.

use crate::browser::{Locator, Selector};

// Login page.
pub const LOGIN_EMAIL: Locator = Locator::new(
    "login email",
    &[Selector::Css("input[name='session_key']"), Selector::Css("input#username")],
);
pub const LOGIN_PASSWORD: Locator = Locator::new(
    "login password",
    &[Selector::Css("input[name='session_password']"), Selector::Css("input#password")],
);
pub const LOGIN_SUBMIT: Locator = Locator::new(
    "login submit",
    &[Selector::Css("button[type='submit']")],
);
pub const SECURITY_CHALLENGE: Locator = Locator::new(
    "security challenge",
    &[
        Selector::Css("div.challenge-dialog"),
        Selector::Css("div[class*='challenge']"),
        Selector::Css("div[class*='security']"),
        Selector::Css("div[class*='verification']"),
        Selector::Css("div[class*='captcha']"),
        Selector::Css("div[class*='puzzle']"),
        Selector::Css("iframe[src*='challenge']"),
        Selector::Css("iframe[src*='security']"),
        Selector::Css("iframe[src*='captcha']"),
        Selector::Css("div[role='dialog']"),
    ],
);

// Result list.
pub const JOB_CARD: Locator = Locator::new(
    "job card",
    &[
        Selector::Css("div.job-card-container"),
        Selector::Css("li.jobs-search-results__list-item"),
    ],
);
pub const RESULTS_CONTAINER: Locator = Locator::new(
    "results container",
    &[
        Selector::Css("div.jobs-search-results-list"),
        Selector::Css("div.scaffold-layout__list"),
    ],
);
pub const CARD_TITLE: Locator = Locator::new(
    "card title",
    &[
        Selector::Css("a.job-card-list__title"),
        Selector::Css("a.job-card-container__link"),
        Selector::Css("a"),
    ],
);
pub const CARD_COMPANY: Locator = Locator::new(
    "card company",
    &[
        Selector::Css("div.artdeco-entity-lockup__subtitle span"),
        Selector::Css("span.job-search-card__company-name"),
        Selector::Css("h4.base-search-card__subtitle a"),
    ],
);
pub const CARD_LOCATION: Locator = Locator::new(
    "card location",
    &[
        Selector::Css("div.artdeco-entity-lockup__caption span"),
        Selector::Css("span.job-search-card__location"),
        Selector::Css("span[aria-label*='location']"),
    ],
);
pub const NEXT_PAGE: Locator = Locator::new(
    "next page",
    &[
        Selector::Css("button.jobs-search-pagination__button--next"),
        Selector::Css("button.artdeco-pagination__button--next"),
    ],
);

// Detail pane.
pub const DETAILS_PANE: Locator = Locator::new(
    "details pane",
    &[
        Selector::Css("div.scaffold-layout__detail.jobs-search__job-details"),
        Selector::Css("div.jobs-search__job-details"),
        Selector::Css("div.scaffold-layout__detail"),
    ],
);
pub const QUICK_APPLY: Locator = Locator::new(
    "quick apply",
    &[
        Selector::Css("#jobs-apply-button-id"),
        Selector::Css("div.jobs-search__job-details button.jobs-apply-button"),
        Selector::Css("button.jobs-apply-button"),
    ],
);

// Submission dialog.
pub const DIALOG: Locator = Locator::new("dialog", &[Selector::Css("div[role='dialog']")]);
pub const REQUIRED_INPUTS: Locator = Locator::new(
    "required inputs",
    &[Selector::Css("input[required]"), Selector::Css("textarea[required]")],
);
pub const REQUIRED_SELECTS: Locator =
    Locator::new("required selects", &[Selector::Css("select[required]")]);
pub const FILE_INPUTS: Locator = Locator::new("file inputs", &[Selector::Css("input[type='file']")]);
pub const SELECT_OPTIONS: Locator = Locator::new("options", &[Selector::Css("option")]);
pub const DIALOG_HEADING: Locator = Locator::new(
    "dialog heading",
    &[Selector::Css("h3"), Selector::Css("h2")],
);
pub const DIALOG_PROGRESS: Locator = Locator::new(
    "dialog progress",
    &[Selector::Css("[role='progressbar']"), Selector::Css("progress")],
);
pub const FIELD_LABELS: Locator = Locator::new(
    "field labels",
    &[Selector::Css("label"), Selector::Css("legend")],
);

pub const SUBMIT: Locator = Locator::new(
    "submit",
    &[
        Selector::Css("button[aria-label='Submit application']"),
        Selector::Text {
            tag: "button",
            text: "Submit application",
        },
    ],
);
pub const REVIEW: Locator = Locator::new(
    "review",
    &[
        Selector::Css("button[aria-label='Review your application']"),
        Selector::Css("button[aria-label='Review']"),
        Selector::Text {
            tag: "button",
            text: "Review",
        },
    ],
);
pub const ADVANCE: Locator = Locator::new(
    "next",
    &[
        Selector::Css("button[aria-label='Continue to next step']"),
        Selector::Text {
            tag: "button",
            text: "Next",
        },
    ],
);
pub const DISMISS: Locator = Locator::new(
    "dismiss",
    &[
        Selector::Css("button[aria-label='Dismiss']"),
        Selector::Css("button[aria-label='Close']"),
    ],
);
pub const DISCARD: Locator = Locator::new(
    "discard",
    &[
        Selector::Css("button[data-control-name='discard_application_confirm_btn']"),
        Selector::Text {
            tag: "button",
            text: "Discard",
        },
    ],
);
pub const CONFIRMATION_DONE: Locator =
    Locator::new("done", &[Selector::Css("button[aria-label='Done']")]);
pub const CONFIRMATION_FALLBACK: Locator = Locator::new(
    "done fallback",
    &[
        Selector::Text {
            tag: "button",
            text: "Done",
        },
        Selector::Text {
            tag: "button",
            text: "Close",
        },
    ],
);
