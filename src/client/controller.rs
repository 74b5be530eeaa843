use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};
use userbook_common::{Field, FieldViolation, Record};

use super::form::{ADD, Action, REMOVE, UPDATE, serialize_form};
use super::transport::{Transport, UsersRequest};
use super::view::{ControlId, FormKey, Page};
use crate::errors::ClientError;

/// Records requested per load-more unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// What a click or operation ended up doing.
#[derive(Debug)]
pub enum Outcome {
    /// The control was disabled, unwired, or its form is gone
    Ignored,
    /// Validation failed; no request was sent
    Invalid(Vec<FieldViolation>),
    Succeeded,
    /// Load-more succeeded and appended this many forms
    Loaded { appended: usize },
    Failed(ClientError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded | Outcome::Loaded { .. })
    }
}

/// Owns the page and runs the add, update, remove and load-more operations.
///
/// Each operation disables its control and builds the request while holding
/// the page lock, releases it for the network call, and reacquires it to apply
/// the result. Operations on different controls therefore run concurrently.
/// Every operation checks and sets its control's `disabled` under that same
/// lock, so a busy control returns `Outcome::Ignored` however it is reached.
pub struct RecordFormController {
    transport: Arc<dyn Transport>,
    page: Mutex<Page>,
    page_size: u32,
}

impl RecordFormController {
    /// Wire the page around records that are already known.
    pub fn setup(transport: Arc<dyn Transport>, initial: &[Record], page_size: u32) -> Self {
        Self {
            transport,
            page: Mutex::new(Page::new(initial)),
            page_size,
        }
    }

    /// Fetch the first page of records and wire the page around it.
    pub async fn bootstrap(
        transport: Arc<dyn Transport>,
        page_size: u32,
    ) -> Result<Self, ClientError> {
        let body = transport
            .send(&UsersRequest::List {
                limit: page_size,
                offset: 0,
            })
            .await?;
        let initial: Vec<Record> = serde_json::from_str(&body).map_err(ClientError::Decode)?;
        debug!(count = initial.len(), "loaded initial records");
        Ok(Self::setup(transport, &initial, page_size))
    }

    fn page(&self) -> MutexGuard<'_, Page> {
        // A panic mid-update leaves plain data behind; keep serving it.
        self.page.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read the page, e.g. to render it.
    pub fn view<R>(&self, f: impl FnOnce(&Page) -> R) -> R {
        f(&self.page())
    }

    /// Mutate the page, e.g. to type into an input.
    pub fn edit<R>(&self, f: impl FnOnce(&mut Page) -> R) -> R {
        f(&mut self.page())
    }

    /// Dispatch a click the way a browser would: unwired controls do nothing,
    /// and the operation itself ignores a disabled control.
    pub async fn click(&self, target: ControlId) -> Outcome {
        let handler = self.view(|page| page.control(target).and_then(|c| c.handler));
        match (handler, target.form()) {
            (Some(Action::Add), _) => self.add().await,
            (Some(Action::LoadMore), _) => self.load_more().await,
            (Some(Action::Update), Some(key)) => self.update(key).await,
            (Some(Action::Remove), Some(key)) => self.remove(key).await,
            _ => Outcome::Ignored,
        }
    }

    /// Submit the creation form as a new record.
    ///
    /// On success the record is not added to the list; it shows up on a later
    /// load-more.
    pub async fn add(&self) -> Outcome {
        let request = {
            let mut page = self.page();
            match begin_submit(&mut page, ControlId::Add) {
                Ok(body) => UsersRequest::Create { body },
                Err(outcome) => return outcome,
            }
        };
        let result = self.transport.send(&request).await;
        finish_submit(&mut self.page(), ControlId::Add, result)
    }

    /// Submit a record form's current values.
    pub async fn update(&self, key: FormKey) -> Outcome {
        let target = ControlId::Update(key);
        let request = {
            let mut page = self.page();
            match begin_submit(&mut page, target) {
                Ok(body) => UsersRequest::Update { body },
                Err(outcome) => return outcome,
            }
        };
        let result = self.transport.send(&request).await;
        finish_submit(&mut self.page(), target, result)
    }

    /// Delete a record and drop its form.
    ///
    /// On failure the remove control keeps its failed-flag and stays disabled.
    pub async fn remove(&self, key: FormKey) -> Outcome {
        let target = ControlId::Remove(key);
        let request = {
            let mut page = self.page();
            let Some(form) = page.list.get_mut(key) else {
                return Outcome::Ignored;
            };
            let body = serde_json::json!({ "id": form.value(Field::Id) }).to_string();
            let Some(control) = form.control_mut(REMOVE).filter(|c| !c.disabled) else {
                return Outcome::Ignored;
            };
            control.disabled = true;
            UsersRequest::Delete { body }
        };

        let result = self.transport.send(&request).await;

        let mut page = self.page();
        match result {
            Ok(_) => {
                page.list.remove(key);
                Outcome::Succeeded
            }
            Err(e) => {
                warn!(error = %e, "remove failed");
                if let Some(control) = page.control_mut(target) {
                    control.failed = true;
                }
                Outcome::Failed(e)
            }
        }
    }

    /// Fetch the next page, offset by the number of listed forms, and append
    /// a wired form per returned record.
    pub async fn load_more(&self) -> Outcome {
        let request = {
            let mut page = self.page();
            if page.more.disabled {
                return Outcome::Ignored;
            }
            page.more.disabled = true;
            UsersRequest::List {
                limit: self.page_size,
                offset: page.list.len(),
            }
        };

        let result = self.transport.send(&request).await.and_then(|body| {
            serde_json::from_str::<Vec<Record>>(&body).map_err(ClientError::Decode)
        });

        let mut page = self.page();
        page.more.disabled = false;
        match result {
            Ok(records) => {
                page.more.failed = false;
                for record in &records {
                    page.append_record(record);
                }
                debug!(appended = records.len(), total = page.list.len(), "loaded more records");
                Outcome::Loaded {
                    appended: records.len(),
                }
            }
            Err(e) => {
                warn!(error = %e, "load more failed");
                page.more.failed = true;
                Outcome::Failed(e)
            }
        }
    }
}

/// Validation gate shared by add and update: a disabled control is ignored,
/// otherwise on success the control is disabled and the serialized form is
/// returned.
fn begin_submit(page: &mut Page, target: ControlId) -> Result<String, Outcome> {
    let (form, control_name) = match target {
        ControlId::Add => (&mut page.add_form, ADD),
        ControlId::Update(key) => match page.list.get_mut(key) {
            Some(form) => (form, UPDATE),
            None => return Err(Outcome::Ignored),
        },
        _ => return Err(Outcome::Ignored),
    };
    if form.control(control_name).is_none_or(|c| c.disabled) {
        return Err(Outcome::Ignored);
    }

    let violations = form.check_validity();
    form.violations = violations.clone();
    if !violations.is_empty() {
        debug!(count = violations.len(), "form failed validation");
        return Err(Outcome::Invalid(violations));
    }

    let body = serialize_form(form).map_err(|e| Outcome::Failed(ClientError::Encode(e)))?;
    if let Some(control) = form.control_mut(control_name) {
        control.disabled = true;
    }
    Ok(body)
}

/// Apply a submit result to its control: set or clear the failed-flag, and
/// re-enable in both cases.
fn finish_submit(page: &mut Page, target: ControlId, result: Result<String, ClientError>) -> Outcome {
    let failed = result.is_err();
    if let Some(control) = page.control_mut(target) {
        control.failed = failed;
        control.disabled = false;
    }
    match result {
        Ok(_) => Outcome::Succeeded,
        Err(e) => {
            warn!(error = %e, "submit failed");
            Outcome::Failed(e)
        }
    }
}
