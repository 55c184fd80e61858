use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::schemas::{FieldKind, FieldSpec, FieldValue};

/// One choice of a select or reference control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// What a front end needs to draw one field
#[derive(Debug, Clone)]
pub struct FieldControl {
    pub spec: FieldSpec,
    pub value: Option<FieldValue>,
    pub error: Option<String>,
    pub options: Vec<SelectOption>,
}

impl FieldControl {
    pub fn is_checkbox(&self) -> bool {
        matches!(self.spec.kind, FieldKind::Checkbox)
    }

    /// Current value as shown in the control
    pub fn display_value(&self) -> String {
        match (&self.spec.kind, &self.value) {
            (FieldKind::Password, Some(_)) => "********".to_string(),
            (FieldKind::Reference { .. }, Some(FieldValue::List(ids))) => ids
                .iter()
                .map(|id| self.option_label(id))
                .collect::<Vec<_>>()
                .join(", "),
            (FieldKind::Reference { .. }, Some(FieldValue::Text(id))) => self.option_label(id),
            (_, Some(value)) => value.display(),
            (_, None) => String::new(),
        }
    }

    fn option_label(&self, value: &str) -> String {
        self.options
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label.clone())
            .unwrap_or_else(|| value.to_string())
    }
}

/// Submit button state, shareable with whoever renders it while a submission runs
#[derive(Debug, Clone)]
pub struct SubmitButton {
    idle_label: String,
    submitting: Arc<AtomicBool>,
}

impl SubmitButton {
    pub(crate) fn new(idle_label: String) -> Self {
        Self {
            idle_label,
            submitting: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn label(&self) -> &str {
        if self.is_disabled() {
            "Saving..."
        } else {
            &self.idle_label
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    pub(crate) fn set_busy(&self, busy: bool) {
        self.submitting.store(busy, Ordering::SeqCst);
    }
}
