use std::fmt;

use sha2::{Digest, Sha256};

use super::FormStep;

/// Structural digest of a step: heading, progress, every visible label,
/// field kinds and labels, and the visible controls with their text.
/// Attribute churn and typed values do not affect it, so two equal
/// fingerprints on consecutive iterations mean the dialog did not move.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn of(step: &FormStep) -> Self {
        let mut parts = vec![
            format!("heading:{}", normalize(&step.heading)),
            format!("progress:{}", normalize(&step.progress)),
        ];

        let mut body: Vec<String> = step
            .fields
            .iter()
            .map(|f| format!("field:{}:{}", f.kind, normalize(&f.label)))
            .chain(step.labels.iter().map(|l| format!("label:{}", normalize(l))))
            .collect();
        body.sort();
        parts.extend(body);

        let mut controls: Vec<_> = step
            .controls
            .iter()
            .map(|c| (c.kind, normalize(&c.label)))
            .collect();
        controls.sort();
        controls.dedup();
        parts.extend(controls.iter().map(|(k, l)| format!("control:{k}:{l}")));

        let mut hasher = Sha256::new();
        for part in &parts {
            hasher.update(part.as_bytes());
            hasher.update(b"\n");
        }
        Fingerprint(hex::encode(&hasher.finalize()[..8]))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn normalize(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::ElementRef;
    use crate::form::{Control, ControlKind, Field, FieldKind};

    fn field(label: &str, value: &str) -> Field {
        Field {
            handle: ElementRef(format!("h-{label}")),
            kind: FieldKind::Text,
            input_type: "text".into(),
            label: label.into(),
            value: value.into(),
            options: Vec::new(),
        }
    }

    fn control(kind: ControlKind, handle: &str) -> Control {
        Control {
            kind,
            handle: ElementRef(handle.into()),
            label: "Next".into(),
        }
    }

    fn empty_step(heading: &str) -> FormStep {
        FormStep {
            heading: heading.into(),
            controls: vec![control(ControlKind::Advance, "n")],
            ..FormStep::default()
        }
    }

    #[test]
    fn values_and_handles_do_not_change_fingerprint() {
        let a = FormStep {
            fields: vec![field("Phone", ""), field("Email", "")],
            controls: vec![control(ControlKind::Advance, "n1")],
            ..FormStep::default()
        };
        let mut b = FormStep {
            fields: vec![field("Email", "a@b.c"), field("Phone  ", "555")],
            controls: vec![control(ControlKind::Advance, "n2")],
            ..FormStep::default()
        };
        b.fields[0].handle = ElementRef("regenerated".into());
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn different_controls_change_fingerprint() {
        let a = FormStep {
            fields: vec![field("Phone", "")],
            controls: vec![control(ControlKind::Advance, "n")],
            ..FormStep::default()
        };
        let b = FormStep {
            fields: vec![field("Phone", "")],
            controls: vec![control(ControlKind::Review, "r")],
            ..FormStep::default()
        };
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
        assert_eq!(Fingerprint::of(&a).0.len(), 16);
    }

    #[test]
    fn steps_without_fields_differ_by_heading_and_progress() {
        let contact = empty_step("Contact info");
        let resume = empty_step("Resume");
        assert_ne!(Fingerprint::of(&contact), Fingerprint::of(&resume));

        let mut later = empty_step("Contact info");
        later.progress = "75".into();
        assert_ne!(Fingerprint::of(&contact), Fingerprint::of(&later));
    }

    #[test]
    fn optional_labels_and_control_text_count() {
        let mut a = empty_step("Additional questions");
        let mut b = a.clone();
        a.labels = vec!["Cover letter".into()];
        b.labels = vec!["Portfolio link".into()];
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));

        let mut c = empty_step("Additional questions");
        c.controls[0].label = "Continue".into();
        assert_ne!(Fingerprint::of(&empty_step("Additional questions")), Fingerprint::of(&c));
    }
}
