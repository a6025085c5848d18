//! Field classification: label text in, answer out.
//!
//! [`StepClassifier::classify`] is a pure function of the field kind and
//! its label. The policy is an ordered table; the first row whose pattern
//! matches the lowercased label decides the answer.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use super::{Field, FieldKind, SelectOption};
use crate::profile::CandidateProfile;

static YEARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"years of experience|how many years|years in|experience in years|\d+\+?\s*years?|years.*\b(experience|work|industry|field)\b",
    )
    .expect("valid regex")
});
static SOFTWARE_TOPIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"software|development|programming").expect("valid regex"));
static DATA_TOPIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"data|analytics|machine learning|\bml\b|\bai\b").expect("valid regex")
});
static AUTHORIZATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"authori[sz]|citizen|visa|sponsorship|work in").expect("valid regex")
});
static SELECT_AUTHORIZATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"citizen|authorization|authorized|work in the united states|relocat|\bmove\b")
        .expect("valid regex")
});
static SELECT_SPONSORSHIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sponsorship|require visa").expect("valid regex"));
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"select|choose|option").expect("valid regex"));
static YES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\byes\b").expect("valid regex"));
static NO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bno\b").expect("valid regex"));
static FIVE_PLUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b5\b|more than 5|\bfive\b").expect("valid regex"));

/// Generic affirmative answer for unmatched text fields.
const AFFIRMATIVE: &str = "Yes";

/// True for option texts like "Select an option".
pub fn is_placeholder(text: &str) -> bool {
    PLACEHOLDER.is_match(&text.to_lowercase())
}

/// Answer chosen for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Integer answer; the filler verifies it survives the UI.
    Number(String),
    Text(String),
    Select(SelectStrategy),
    Upload(PathBuf),
}

/// How to pick an option out of a select's list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectStrategy {
    /// First option whose text contains this string (case-insensitive).
    Containing(String),
    Yes,
    No,
    FivePlusYears,
    FirstNonPlaceholder,
}

impl SelectStrategy {
    /// The option to select, falling back to the first non-placeholder.
    pub fn pick<'a>(&self, options: &'a [SelectOption]) -> Option<&'a SelectOption> {
        let usable: Vec<&SelectOption> = options
            .iter()
            .filter(|o| !o.disabled && !o.value.trim().is_empty())
            .collect();

        let preferred = usable.iter().copied().find(|o| {
            let text = o.text.to_lowercase();
            match self {
                SelectStrategy::Containing(needle) => text.contains(&needle.to_lowercase()),
                SelectStrategy::Yes => YES.is_match(&text),
                SelectStrategy::No => NO.is_match(&text),
                SelectStrategy::FivePlusYears => FIVE_PLUS.is_match(&text),
                SelectStrategy::FirstNonPlaceholder => false,
            }
        });

        preferred.or_else(|| {
            usable
                .into_iter()
                .find(|o| !o.text.trim().is_empty() && !is_placeholder(&o.text))
        })
    }
}

/// Decides an answer for every required field from the candidate profile.
#[derive(Debug, Clone)]
pub struct StepClassifier {
    profile: CandidateProfile,
}

impl StepClassifier {
    pub fn new(profile: CandidateProfile) -> Self {
        Self { profile }
    }

    /// Classifies a live field. Identical to [`classify`](Self::classify)
    /// except that `email`/`tel` inputs with an uninformative label get the
    /// profile's email or phone instead of the generic fallback.
    pub fn classify_field(&self, field: &Field) -> Resolution {
        let resolution = self.classify(field.kind, &field.label);
        if resolution != Resolution::Text(AFFIRMATIVE.to_string()) {
            return resolution;
        }
        match field.input_type.as_str() {
            "email" if !self.profile.email.is_empty() => {
                Resolution::Text(self.profile.email.clone())
            }
            "tel" if !self.profile.phone.is_empty() => Resolution::Text(self.profile.phone.clone()),
            _ => resolution,
        }
    }

    /// Answer for a field of `kind` labelled `label`.
    pub fn classify(&self, kind: FieldKind, label: &str) -> Resolution {
        let label = label.to_lowercase();
        match kind {
            FieldKind::File => Resolution::Upload(self.profile.resume_path.clone()),
            FieldKind::Select => Resolution::Select(self.select_strategy(&label)),
            FieldKind::Numeric | FieldKind::Text => self.text_answer(kind, &label),
        }
    }

    fn text_answer(&self, kind: FieldKind, label: &str) -> Resolution {
        let p = &self.profile;

        if kind == FieldKind::Numeric || YEARS.is_match(label) {
            return Resolution::Number(self.years_for(label).to_string());
        }
        if label.contains("salary") {
            return Resolution::Text(p.salary.clone());
        }
        if label.contains("phone") {
            return Resolution::Text(p.phone.clone());
        }
        if label.contains("email") {
            return Resolution::Text(p.email.clone());
        }
        if AUTHORIZATION.is_match(label) {
            return Resolution::Text(AFFIRMATIVE.to_string());
        }

        let education = p.latest_education();
        let job = p.latest_job();
        let from_profile: Option<String> = if label.contains("skills") {
            Some(p.skills_line())
        } else if label.contains("degree") || label.contains("major") {
            education.map(|e| e.degree.clone())
        } else if label.contains("school") || label.contains("university") {
            education.map(|e| e.school.clone())
        } else if label.contains("gpa") {
            education.map(|e| e.gpa.clone())
        } else if label.contains("employer") || label.contains("company") {
            job.map(|j| j.company.clone())
        } else if label.contains("job title") || label.contains("current title") {
            job.map(|j| j.title.clone())
        } else if label.contains("first name") {
            Some(p.first_name.clone())
        } else if label.contains("last name") {
            Some(p.last_name.clone())
        } else if label.contains("city") {
            Some(p.city.clone())
        } else {
            None
        };

        match from_profile {
            Some(answer) if !answer.trim().is_empty() => Resolution::Text(answer),
            _ => Resolution::Text(AFFIRMATIVE.to_string()),
        }
    }

    fn years_for(&self, label: &str) -> u32 {
        let years = &self.profile.years;
        if SOFTWARE_TOPIC.is_match(label) {
            years.software
        } else if DATA_TOPIC.is_match(label) {
            years.data
        } else {
            years.other
        }
    }

    fn select_strategy(&self, label: &str) -> SelectStrategy {
        if label.contains("email") && !self.profile.email.is_empty() {
            SelectStrategy::Containing(self.profile.email.clone())
        } else if label.contains("country") || label.contains("location") {
            SelectStrategy::Containing(self.profile.country.clone())
        } else if SELECT_AUTHORIZATION.is_match(label) {
            SelectStrategy::Yes
        } else if SELECT_SPONSORSHIP.is_match(label) {
            SelectStrategy::No
        } else if label.contains("experience") || label.contains("years") {
            SelectStrategy::FivePlusYears
        } else {
            SelectStrategy::FirstNonPlaceholder
        }
    }
}
