//! Schema-bound form model
//!
//! `ResourceForm<S>` holds the raw values of one create or edit dialog and
//! re-validates on every change. Errors are reported per dotted field path
//! for fields the user has touched, and for every field once a submission was
//! attempted. Failures of the submission itself land in a separate root error.

pub mod controls;

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::marker::PhantomData;
use tracing::debug;

use crate::errors::{FieldErrors, PanelError, PanelResult};
use crate::schemas::{FieldKind, FieldValue, FormValues, Schema};

pub use controls::{FieldControl, SelectOption, SubmitButton};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

/// Validated payload handed to the submit callback
pub enum Submission<S: Schema> {
    Create(S::Create),
    Update { id: String, payload: S::Update },
}

pub struct ResourceForm<S: Schema> {
    mode: FormMode,
    values: FormValues,
    errors: FieldErrors,
    touched: BTreeSet<String>,
    submit_attempted: bool,
    root_error: Option<String>,
    options: HashMap<&'static str, Vec<SelectOption>>,
    button: SubmitButton,
    _schema: PhantomData<fn() -> S>,
}

impl<S: Schema> ResourceForm<S> {
    /// Blank form pre-filled with the schema defaults
    pub fn create() -> Self {
        Self::build(FormMode::Create, S::defaults())
    }

    /// Form for an existing record; the record's values overlay the defaults
    pub fn edit(id: impl Into<String>, values: FormValues) -> Self {
        let mut merged = S::defaults();
        merged.merge(values);
        Self::build(FormMode::Edit { id: id.into() }, merged)
    }

    fn build(mode: FormMode, values: FormValues) -> Self {
        let verb = match mode {
            FormMode::Create => "Create",
            FormMode::Edit { .. } => "Update",
        };
        let mut form = Self {
            mode,
            values,
            errors: FieldErrors::new(),
            touched: BTreeSet::new(),
            submit_attempted: false,
            root_error: None,
            options: HashMap::new(),
            button: SubmitButton::new(format!("{} {}", verb, S::ENTITY)),
            _schema: PhantomData,
        };
        form.revalidate();
        form
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn set(&mut self, path: &str, value: FieldValue) {
        self.values.set(path, value);
        self.touched.insert(path.to_string());
        self.revalidate();
    }

    pub fn set_text(&mut self, path: &str, value: impl Into<String>) {
        self.set(path, FieldValue::Text(value.into()));
    }

    pub fn set_bool(&mut self, path: &str, value: bool) {
        self.set(path, FieldValue::Bool(value));
    }

    pub fn set_list<I, T>(&mut self, path: &str, items: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.set(path, FieldValue::List(items.into_iter().map(Into::into).collect()));
    }

    /// Runtime choices for a reference field (agent ids, rule ids)
    pub fn set_options(&mut self, path: &'static str, options: Vec<SelectOption>) {
        self.options.insert(path, options);
    }

    fn revalidate(&mut self) {
        self.errors = match self.validate() {
            Ok(_) => FieldErrors::new(),
            Err(errors) => errors,
        };
    }

    fn validate(&self) -> Result<Submission<S>, FieldErrors> {
        match &self.mode {
            FormMode::Create => S::validate_create(&self.values).map(Submission::Create),
            FormMode::Edit { id } => S::validate_update(&self.values).map(|payload| {
                Submission::Update {
                    id: id.clone(),
                    payload,
                }
            }),
        }
    }

    fn shows_error(&self, path: &str) -> bool {
        self.submit_attempted || self.touched.contains(path)
    }

    /// Error shown under a field, if it has been touched or a submit was attempted
    pub fn field_error(&self, path: &str) -> Option<&str> {
        if self.shows_error(path) {
            self.errors.first(path)
        } else {
            None
        }
    }

    /// Every current validation failure, shown or not
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn root_error(&self) -> Option<&str> {
        self.root_error.as_deref()
    }

    pub fn clear_root_error(&mut self) {
        self.root_error = None;
    }

    pub fn controls(&self) -> Vec<FieldControl> {
        S::fields()
            .iter()
            .map(|spec| {
                let options = match spec.kind {
                    FieldKind::Select(choices) => choices
                        .iter()
                        .map(|choice| SelectOption::new(*choice, *choice))
                        .collect(),
                    FieldKind::Reference { .. } => {
                        self.options.get(spec.path).cloned().unwrap_or_default()
                    }
                    _ => Vec::new(),
                };
                FieldControl {
                    spec: *spec,
                    value: self.values.get(spec.path).cloned(),
                    error: self.field_error(spec.path).map(str::to_string),
                    options,
                }
            })
            .collect()
    }

    pub fn submit_button(&self) -> SubmitButton {
        self.button.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.button.is_disabled()
    }

    /// Validate, then hand the payload to `callback` while the button is busy.
    ///
    /// Validation failures mark every field for display and never reach the
    /// callback. A failing callback leaves its message in the root error.
    pub async fn submit<F, Fut, T>(&mut self, callback: F) -> PanelResult<T>
    where
        F: FnOnce(Submission<S>) -> Fut,
        Fut: Future<Output = PanelResult<T>>,
    {
        self.submit_attempted = true;
        let submission = match self.validate() {
            Ok(submission) => submission,
            Err(errors) => {
                debug!("{} form has {} invalid field(s)", S::ENTITY, errors.len());
                self.errors = errors.clone();
                return Err(PanelError::Validation(errors));
            }
        };

        self.root_error = None;
        self.button.set_busy(true);
        let result = callback(submission).await;
        self.button.set_busy(false);

        if let Err(e) = &result {
            self.root_error = Some(e.root_message());
        }
        result
    }

    /// Back to the initial state of a blank create form
    pub fn reset(&mut self) {
        *self = Self::create();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;
    use crate::schemas::{AgentSchema, UserSchema};

    #[test]
    fn test_create_form_labels_and_defaults() {
        let form = ResourceForm::<AgentSchema>::create();
        assert_eq!(form.submit_button().label(), "Create Agent");
        assert_eq!(form.values().text("port"), Some("8080"));
        assert!(!form.is_valid());
        // nothing touched yet
        assert!(form.controls().iter().all(|c| c.error.is_none()));
    }

    #[test]
    fn test_on_change_validation_reports_touched_fields_only() {
        let mut form = ResourceForm::<AgentSchema>::create();
        form.set_text("ip", "300.1.1.1");
        assert_eq!(form.field_error("ip"), Some("Invalid IPv4 address"));
        assert_eq!(form.field_error("name"), None);

        form.set_text("ip", "10.0.0.1");
        assert_eq!(form.field_error("ip"), None);
    }

    #[tokio::test]
    async fn test_invalid_submit_never_calls_back() {
        let mut form = ResourceForm::<AgentSchema>::create();
        let result: PanelResult<()> = form
            .submit(|_| async { Err(PanelError::Other("callback ran".to_string())) })
            .await;

        assert!(matches!(result, Err(PanelError::Validation(_))));
        assert_eq!(form.field_error("name"), Some("Name is required"));
        assert!(form.root_error().is_none());
    }

    #[tokio::test]
    async fn test_submit_marks_busy_and_records_root_error() {
        let mut form = ResourceForm::<AgentSchema>::create();
        form.set_text("name", "edge-1");
        form.set_text("ip", "10.0.0.5");
        let button = form.submit_button();

        let result: PanelResult<()> = form
            .submit(|submission| {
                let button = button.clone();
                async move {
                    assert!(button.is_disabled());
                    assert_eq!(button.label(), "Saving...");
                    match submission {
                        Submission::Create(agent) => assert_eq!(agent.port, 8080),
                        Submission::Update { .. } => panic!("expected create"),
                    }
                    Err(ApiError::Validation {
                        message: Some("Agent name already exists".to_string()),
                    }
                    .into())
                }
            })
            .await;

        assert!(result.is_err());
        assert!(!form.is_submitting());
        assert_eq!(form.submit_button().label(), "Create Agent");
        assert_eq!(form.root_error(), Some("Agent name already exists"));
    }

    #[tokio::test]
    async fn test_edit_form_submits_update() {
        let values = FormValues::new()
            .with_text("username", "ops")
            .with_text("role", "admin");
        let mut form = ResourceForm::<UserSchema>::edit("u1", values);
        assert_eq!(form.submit_button().label(), "Update User");

        let id = form
            .submit(|submission| async move {
                match submission {
                    Submission::Update { id, payload } => {
                        assert!(payload.password.is_none());
                        Ok(id)
                    }
                    Submission::Create(_) => panic!("expected update"),
                }
            })
            .await
            .unwrap();
        assert_eq!(id, "u1");
    }
}
