//! The currently visible step of the submission dialog.
//!
//! A [`FormStep`] is rebuilt from the live UI on every iteration of the
//! transition engine and discarded at the end of it.

pub mod classifier;
pub mod filler;
mod fingerprint;

use std::fmt;

use crate::browser::{BrowserError, ElementRef, Locator, Page};
use crate::selectors;

pub use classifier::{Resolution, StepClassifier, is_placeholder};
pub use filler::StepFiller;
pub use fingerprint::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Numeric,
    File,
    Select,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Numeric => write!(f, "numeric"),
            FieldKind::File => write!(f, "file"),
            FieldKind::Select => write!(f, "select"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectOption {
    pub handle: ElementRef,
    pub value: String,
    pub text: String,
    pub disabled: bool,
}

/// A required input of the current step.
#[derive(Debug, Clone)]
pub struct Field {
    pub handle: ElementRef,
    pub kind: FieldKind,
    /// The `type` attribute for inputs (`email`, `tel`, ...), empty otherwise.
    pub input_type: String,
    pub label: String,
    pub value: String,
    pub options: Vec<SelectOption>,
}

impl Field {
    /// True when the UI already holds an answer that must not be overwritten.
    pub fn is_filled(&self) -> bool {
        let value = self.value.trim();
        if value.is_empty() {
            return false;
        }
        if self.kind != FieldKind::Select {
            return true;
        }
        self.options
            .iter()
            .find(|o| o.value == value)
            .is_some_and(|o| !is_placeholder(&o.text))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlKind {
    Submit,
    Review,
    Advance,
    Dismiss,
}

impl ControlKind {
    pub const ALL: [ControlKind; 4] = [
        ControlKind::Submit,
        ControlKind::Review,
        ControlKind::Advance,
        ControlKind::Dismiss,
    ];

    pub fn locator(&self) -> &'static Locator {
        match self {
            ControlKind::Submit => &selectors::SUBMIT,
            ControlKind::Review => &selectors::REVIEW,
            ControlKind::Advance => &selectors::ADVANCE,
            ControlKind::Dismiss => &selectors::DISMISS,
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlKind::Submit => write!(f, "submit"),
            ControlKind::Review => write!(f, "review"),
            ControlKind::Advance => write!(f, "next"),
            ControlKind::Dismiss => write!(f, "dismiss"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Control {
    pub kind: ControlKind,
    pub handle: ElementRef,
    /// Visible button text.
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct FormStep {
    /// Title of the step, e.g. "Contact info" or "Resume".
    pub heading: String,
    /// Completion shown by the progress bar, as reported by the page.
    pub progress: String,
    /// Every visible label in the dialog, required or not.
    pub labels: Vec<String>,
    pub fields: Vec<Field>,
    pub controls: Vec<Control>,
}

/// What the state machine gets to see of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepObservation {
    pub fingerprint: Fingerprint,
    pub controls: Vec<ControlKind>,
}

impl StepObservation {
    pub fn has(&self, kind: ControlKind) -> bool {
        self.controls.contains(&kind)
    }
}

impl FormStep {
    pub fn control(&self, kind: ControlKind) -> Option<&Control> {
        self.controls.iter().find(|c| c.kind == kind)
    }

    pub fn observe(&self) -> StepObservation {
        StepObservation {
            fingerprint: Fingerprint::of(self),
            controls: self.controls.iter().map(|c| c.kind).collect(),
        }
    }

    /// Reads the heading, progress, labels, required fields and action
    /// controls currently inside `dialog`.
    pub async fn read<P: Page>(page: &P, dialog: &ElementRef) -> Result<Self, BrowserError> {
        let heading = selectors::DIALOG_HEADING
            .text(page, Some(dialog))
            .await?
            .unwrap_or_default();
        let progress = match selectors::DIALOG_PROGRESS
            .attribute(page, Some(dialog), "aria-valuenow")
            .await?
        {
            Some(value) => value,
            None => selectors::DIALOG_PROGRESS
                .text(page, Some(dialog))
                .await?
                .unwrap_or_default(),
        };
        let mut labels = Vec::new();
        for handle in selectors::FIELD_LABELS.all(page, Some(dialog)).await? {
            let text = page.text(&handle).await?;
            if !text.trim().is_empty() {
                labels.push(text.trim().to_string());
            }
        }

        let mut fields = Vec::new();

        let mut inputs = selectors::REQUIRED_INPUTS.all(page, Some(dialog)).await?;
        for file_input in selectors::FILE_INPUTS.all(page, Some(dialog)).await? {
            if !inputs.contains(&file_input) {
                inputs.push(file_input);
            }
        }
        for handle in inputs {
            let input_type = page
                .attribute(&handle, "type")
                .await?
                .unwrap_or_default()
                .to_lowercase();
            let kind = match input_type.as_str() {
                "number" => FieldKind::Numeric,
                "file" => FieldKind::File,
                _ => FieldKind::Text,
            };
            fields.push(Field {
                label: page.label_text(&handle).await?.trim().to_string(),
                value: page.value(&handle).await?,
                handle,
                kind,
                input_type,
                options: Vec::new(),
            });
        }

        for handle in selectors::REQUIRED_SELECTS.all(page, Some(dialog)).await? {
            let mut options = Vec::new();
            for option in selectors::SELECT_OPTIONS.all(page, Some(&handle)).await? {
                let text = page.text(&option).await?.trim().to_string();
                let value = page.attribute(&option, "value").await?.unwrap_or_default();
                let disabled = page.attribute(&option, "disabled").await?.is_some();
                options.push(SelectOption {
                    handle: option,
                    value,
                    text,
                    disabled,
                });
            }
            fields.push(Field {
                label: page.label_text(&handle).await?.trim().to_string(),
                value: page.value(&handle).await?,
                handle,
                kind: FieldKind::Select,
                input_type: String::new(),
                options,
            });
        }

        let mut controls = Vec::new();
        for kind in ControlKind::ALL {
            if let Some(handle) = kind.locator().first(page, Some(dialog)).await? {
                let label = page.text(&handle).await?.trim().to_string();
                controls.push(Control {
                    kind,
                    handle,
                    label,
                });
            }
        }

        Ok(Self {
            heading,
            progress,
            labels,
            fields,
            controls,
        })
    }
}
