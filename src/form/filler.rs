//! Applies classifier answers to the live step.

use std::path::Path;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use super::{Field, FormStep, Resolution, StepClassifier};
use crate::browser::{BrowserError, Page};

/// What happened while filling one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub filled: usize,
    /// Fields that already held an answer and were left untouched.
    pub prefilled: usize,
    /// Labels of fields that could not be answered or did not keep the answer.
    pub unresolved: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum NumericStage {
    Type,
    Assign,
    ClearAndAssign,
}

impl NumericStage {
    const ORDER: [NumericStage; 3] = [
        NumericStage::Type,
        NumericStage::Assign,
        NumericStage::ClearAndAssign,
    ];
}

pub struct StepFiller {
    classifier: StepClassifier,
    numeric_attempts: u32,
    settle: Duration,
}

impl StepFiller {
    pub fn new(classifier: StepClassifier, numeric_attempts: u32, settle: Duration) -> Self {
        Self {
            classifier,
            numeric_attempts: numeric_attempts.max(1),
            settle,
        }
    }

    /// Answers every required field of `step` that is still empty.
    ///
    /// Unanswerable fields are reported, not treated as errors; the dialog
    /// itself decides whether the step can advance.
    pub async fn fill<P: Page>(&self, page: &P, step: &FormStep) -> Result<FillReport, BrowserError> {
        let mut report = FillReport::default();

        for field in &step.fields {
            if field.is_filled() {
                report.prefilled += 1;
                continue;
            }
            let resolution = self.classifier.classify_field(field);
            debug!(label = %field.label, kind = %field.kind, ?resolution, "answering field");

            let answered = match resolution {
                Resolution::Number(answer) => self.harden_numeric(page, field, &answer).await?,
                Resolution::Text(answer) => {
                    page.fill(&field.handle, &answer).await?;
                    true
                }
                Resolution::Select(strategy) => match strategy.pick(&field.options) {
                    Some(option) => {
                        page.select_option(&field.handle, &option.handle).await?;
                        true
                    }
                    None => {
                        warn!(label = %field.label, "no usable option in select");
                        false
                    }
                },
                Resolution::Upload(path) => self.upload(page, field, &path).await?,
            };

            if answered {
                report.filled += 1;
            } else {
                report.unresolved.push(field.label.clone());
            }
            self.settle().await;
        }

        Ok(report)
    }

    /// Some numeric inputs swallow keystrokes. Escalate from typing to
    /// direct assignment to clear-then-assign until the control holds an
    /// integer, giving up (non-fatally) after the last stage.
    async fn harden_numeric<P: Page>(
        &self,
        page: &P,
        field: &Field,
        answer: &str,
    ) -> Result<bool, BrowserError> {
        for stage in NumericStage::ORDER {
            for attempt in 1..=self.numeric_attempts {
                match stage {
                    NumericStage::Type => page.fill(&field.handle, answer).await?,
                    NumericStage::Assign => page.force_value(&field.handle, answer).await?,
                    NumericStage::ClearAndAssign => {
                        page.fill(&field.handle, "").await?;
                        page.force_value(&field.handle, answer).await?;
                    }
                }
                self.settle().await;

                let value = page.value(&field.handle).await?;
                if is_integer(&value) {
                    return Ok(true);
                }
                debug!(label = %field.label, ?stage, attempt, value = %value, "numeric answer did not stick");
            }
        }
        warn!(label = %field.label, answer, "numeric field rejected every input strategy");
        Ok(false)
    }

    async fn upload<P: Page>(
        &self,
        page: &P,
        field: &Field,
        path: &Path,
    ) -> Result<bool, BrowserError> {
        let Ok(absolute) = path.canonicalize() else {
            warn!(path = %path.display(), "resume file not found, leaving upload empty");
            return Ok(false);
        };
        page.upload(&field.handle, &absolute.to_string_lossy()).await?;
        Ok(true)
    }

    async fn settle(&self) {
        if !self.settle.is_zero() {
            sleep(self.settle).await;
        }
    }
}

fn is_integer(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::ElementRef;
    use crate::browser::fake::{FakeNode, FakePage};
    use crate::form::{FieldKind, SelectOption};
    use crate::profile::CandidateProfile;
    use crate::selectors;

    fn field(id: &str, kind: FieldKind, label: &str) -> Field {
        Field {
            handle: ElementRef(id.into()),
            kind,
            input_type: match kind {
                FieldKind::Numeric => "number".into(),
                FieldKind::File => "file".into(),
                _ => "text".into(),
            },
            label: label.into(),
            value: String::new(),
            options: Vec::new(),
        }
    }

    fn filler(profile: CandidateProfile) -> StepFiller {
        StepFiller::new(StepClassifier::new(profile), 2, Duration::ZERO)
    }

    fn input(id: &str) -> FakeNode {
        FakeNode::new(id, selectors::REQUIRED_INPUTS.selectors[0])
    }

    #[test]
    fn integer_check() {
        assert!(is_integer(" 42 "));
        assert!(!is_integer(""));
        assert!(!is_integer("4.2"));
        assert!(!is_integer("five"));
    }

    #[tokio::test]
    async fn typed_number_sticks_on_first_try() {
        let page = FakePage::single(vec![input("years")]);
        let step = FormStep {
            fields: vec![field("years", FieldKind::Numeric, "Years with Rust")],
            ..FormStep::default()
        };
        let report = filler(CandidateProfile::default())
            .fill(&page, &step)
            .await
            .unwrap();
        assert_eq!(report.filled, 1);
        assert_eq!(page.value_of("years").as_deref(), Some("3"));
        assert_eq!(page.fills().len(), 1);
    }

    #[tokio::test]
    async fn rejected_keystrokes_escalate_to_assignment() {
        let page = FakePage::single(vec![input("years").rejects_typing()]);
        let step = FormStep {
            fields: vec![field(
                "years",
                FieldKind::Text,
                "How many years of software development experience?",
            )],
            ..FormStep::default()
        };
        let report = filler(CandidateProfile::default())
            .fill(&page, &step)
            .await
            .unwrap();
        assert!(report.unresolved.is_empty());
        assert_eq!(page.value_of("years").as_deref(), Some("5"));
        // Both typing attempts were spent before direct assignment.
        assert_eq!(page.fills().len(), 2);
    }

    #[tokio::test]
    async fn prefilled_fields_are_left_alone() {
        let page = FakePage::single(vec![input("city").value("Paris")]);
        let mut city = field("city", FieldKind::Text, "City");
        city.value = "Paris".into();
        let step = FormStep {
            fields: vec![city],
            ..FormStep::default()
        };
        let report = filler(CandidateProfile::default())
            .fill(&page, &step)
            .await
            .unwrap();
        assert_eq!(report.prefilled, 1);
        assert!(page.fills().is_empty());
    }

    #[tokio::test]
    async fn select_picks_matching_option() {
        let option = |id: &str, text: &str| {
            FakeNode::new(id, selectors::SELECT_OPTIONS.selectors[0])
                .within("auth")
                .text(text)
                .attr("value", text)
        };
        let page = FakePage::single(vec![
            FakeNode::new("auth", selectors::REQUIRED_SELECTS.selectors[0]),
            option("o0", "Select an option"),
            option("o1", "Yes"),
            option("o2", "No"),
        ]);
        let mut select = field("auth", FieldKind::Select, "Are you authorized to work?");
        select.options = ["Select an option", "Yes", "No"]
            .iter()
            .enumerate()
            .map(|(i, t)| SelectOption {
                handle: ElementRef(format!("o{i}")),
                value: t.to_string(),
                text: t.to_string(),
                disabled: false,
            })
            .collect();
        let step = FormStep {
            fields: vec![select],
            ..FormStep::default()
        };
        filler(CandidateProfile::default())
            .fill(&page, &step)
            .await
            .unwrap();
        assert_eq!(page.value_of("auth").as_deref(), Some("Yes"));
    }

    #[tokio::test]
    async fn missing_resume_is_reported_not_fatal() {
        let page = FakePage::single(vec![FakeNode::new(
            "resume",
            selectors::FILE_INPUTS.selectors[0],
        )]);
        let profile = CandidateProfile {
            resume_path: "/nonexistent/resume.pdf".into(),
            ..CandidateProfile::default()
        };
        let step = FormStep {
            fields: vec![field("resume", FieldKind::File, "Resume")],
            ..FormStep::default()
        };
        let report = filler(profile).fill(&page, &step).await.unwrap();
        assert_eq!(report.unresolved, vec!["Resume".to_string()]);
        assert!(page.value_of("resume").is_none());
    }

    #[tokio::test]
    async fn existing_resume_is_uploaded() {
        let dir = tempfile::tempdir().unwrap();
        let resume = dir.path().join("resume.pdf");
        std::fs::write(&resume, b"%PDF").unwrap();

        let page = FakePage::single(vec![FakeNode::new(
            "resume",
            selectors::FILE_INPUTS.selectors[0],
        )]);
        let profile = CandidateProfile {
            resume_path: resume.clone(),
            ..CandidateProfile::default()
        };
        let step = FormStep {
            fields: vec![field("resume", FieldKind::File, "Resume")],
            ..FormStep::default()
        };
        let report = filler(profile).fill(&page, &step).await.unwrap();
        assert_eq!(report.filled, 1);
        let uploaded = page.value_of("resume").unwrap();
        assert!(uploaded.ends_with("resume.pdf"));
    }
}
