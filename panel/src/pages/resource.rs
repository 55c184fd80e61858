use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::api::Resource;
use crate::errors::{ApiError, PanelError, PanelResult};
use crate::form::{ResourceForm, SelectOption, Submission};
use crate::query::ResourceHooks;
use crate::schemas::Record;
use crate::table::{Column, DataTable};

/// One CRUD screen: list table, create/edit dialog and delete confirmation
pub struct ResourcePage<R: Resource> {
    hooks: ResourceHooks<R>,
    table: DataTable<R::Record>,
    dialog: Option<ResourceForm<R::Schema>>,
    pending_delete: Option<String>,
    references: HashMap<&'static str, Vec<SelectOption>>,
    load_error: Option<ApiError>,
}

impl<R: Resource> ResourcePage<R> {
    pub fn new(hooks: ResourceHooks<R>, columns: Vec<Column<R::Record>>) -> Self {
        Self {
            hooks,
            table: DataTable::for_records(columns),
            dialog: None,
            pending_delete: None,
            references: HashMap::new(),
            load_error: None,
        }
    }

    pub fn with_selection(mut self) -> Self {
        self.table = self.table.with_selection();
        self
    }

    pub fn hooks(&self) -> &ResourceHooks<R> {
        &self.hooks
    }

    pub fn table(&self) -> &DataTable<R::Record> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut DataTable<R::Record> {
        &mut self.table
    }

    /// Last failed load; the table keeps showing the previous rows
    pub fn load_error(&self) -> Option<&ApiError> {
        self.load_error.as_ref()
    }

    /// Load the list through the cache into the table
    pub async fn refresh(&mut self) -> Result<usize, ApiError> {
        match self.hooks.list().await {
            Ok(records) => {
                let count = records.len();
                debug!("Loaded {} {}", count, R::PLURAL);
                self.table.set_data(records);
                self.load_error = None;
                Ok(count)
            }
            Err(e) => {
                self.load_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Choices for a reference field, applied to the open form and any form opened later
    pub fn set_reference_options(&mut self, path: &'static str, options: Vec<SelectOption>) {
        if let Some(form) = self.dialog.as_mut() {
            form.set_options(path, options.clone());
        }
        self.references.insert(path, options);
    }

    fn with_references(&self, mut form: ResourceForm<R::Schema>) -> ResourceForm<R::Schema> {
        for (path, options) in &self.references {
            form.set_options(path, options.clone());
        }
        form
    }

    pub fn open_create(&mut self) -> &mut ResourceForm<R::Schema> {
        let form = self.with_references(ResourceForm::create());
        self.dialog.insert(form)
    }

    /// Open the edit dialog pre-filled from the listed record, or fetched when not listed
    pub async fn open_edit(&mut self, id: &str) -> PanelResult<&mut ResourceForm<R::Schema>> {
        let listed = self.table.data().iter().find(|r| r.id() == id).cloned();
        let record = match listed {
            Some(record) => record,
            None => self.hooks.get(id).await?,
        };
        let form = self.with_references(ResourceForm::edit(id, record.to_form_values()));
        Ok(self.dialog.insert(form))
    }

    pub fn form(&self) -> Option<&ResourceForm<R::Schema>> {
        self.dialog.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut ResourceForm<R::Schema>> {
        self.dialog.as_mut()
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog.is_some()
    }

    /// Submit the open dialog. It closes on success and stays open with a
    /// root error on failure.
    pub async fn submit(&mut self) -> PanelResult<R::Record> {
        let hooks = self.hooks.clone();
        let form = self
            .dialog
            .as_mut()
            .ok_or_else(|| PanelError::Other("No dialog is open".to_string()))?;

        let saved = form
            .submit(move |submission| async move {
                match submission {
                    Submission::Create(payload) => hooks.create(payload).await,
                    Submission::Update { id, payload } => hooks.update(&id, payload).await,
                }
            })
            .await?;

        info!("Saved {} {}", R::SINGULAR, saved.id());
        self.dialog = None;
        self.reload().await;
        Ok(saved)
    }

    pub fn cancel(&mut self) {
        self.dialog = None;
    }

    /// First step of a delete: remember the record awaiting confirmation
    pub fn request_delete(&mut self, id: &str) {
        self.pending_delete = Some(id.to_string());
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub async fn confirm_delete(&mut self) -> PanelResult<()> {
        let id = self
            .pending_delete
            .take()
            .ok_or_else(|| PanelError::Other("No delete is pending".to_string()))?;
        self.hooks.delete(&id).await?;
        self.reload().await;
        Ok(())
    }

    // Refetch after a mutation; a failure was already notified
    pub(crate) async fn reload(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!("Reloading {} after a change failed: {}", R::PLURAL, e);
        }
    }
}
