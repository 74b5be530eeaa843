use userbook_common::{Record, RecordId};

use super::form::{ADD, Action, Control, Form, MORE, REMOVE, UPDATE};
use super::form::{apply_input_constraints, create_add_form, create_record_form};

/// Identity of a record form within the list. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormKey(u64);

/// Addresses a clickable control on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlId {
    Add,
    More,
    Update(FormKey),
    Remove(FormKey),
}

impl ControlId {
    /// The record form owning this control, if any.
    pub fn form(&self) -> Option<FormKey> {
        match self {
            Self::Update(key) | Self::Remove(key) => Some(*key),
            Self::Add | Self::More => None,
        }
    }
}

/// Ordered record forms in display order.
///
/// The next pagination offset is `len()`.
#[derive(Debug, Clone, Default)]
pub struct ListView {
    entries: Vec<(FormKey, Form)>,
    next_key: u64,
}

impl ListView {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a form at the end, returning its key.
    pub fn attach(&mut self, form: Form) -> FormKey {
        let key = FormKey(self.next_key);
        self.next_key += 1;
        self.entries.push((key, form));
        key
    }

    pub fn remove(&mut self, key: FormKey) -> Option<Form> {
        let index = self.entries.iter().position(|(k, _)| *k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, key: FormKey) -> Option<&Form> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, f)| f)
    }

    pub fn get_mut(&mut self, key: FormKey) -> Option<&mut Form> {
        self.entries
            .iter_mut()
            .find(|(k, _)| *k == key)
            .map(|(_, f)| f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormKey, &Form)> {
        self.entries.iter().map(|(k, f)| (*k, f))
    }

    pub fn keys(&self) -> Vec<FormKey> {
        self.entries.iter().map(|(k, _)| *k).collect()
    }

    /// Identifiers of the listed records, in display order.
    pub fn record_ids(&self) -> Vec<RecordId> {
        self.entries
            .iter()
            .map(|(_, f)| f.to_record().id)
            .collect()
    }
}

/// All view state: the creation form, the record list and the `more` control.
#[derive(Debug, Clone)]
pub struct Page {
    pub add_form: Form,
    pub list: ListView,
    pub more: Control,
}

impl Page {
    /// Build the page and wire every pre-existing control.
    ///
    /// Constraints go onto the creation form's visible inputs here; record
    /// forms already carry theirs from the factory.
    pub fn new(initial: &[Record]) -> Self {
        let mut add_form = create_add_form();
        apply_input_constraints(add_form.visible_inputs_mut());
        if let Some(add) = add_form.control_mut(ADD) {
            add.bind(Action::Add);
        }

        let mut more = Control::new(MORE, "More");
        more.bind(Action::LoadMore);

        let mut page = Self {
            add_form,
            list: ListView::default(),
            more,
        };
        for record in initial {
            page.append_record(record);
        }
        page
    }

    /// Build, wire and append the form for `record`.
    pub fn append_record(&mut self, record: &Record) -> FormKey {
        let mut form = create_record_form(record);
        bind_record_form(&mut form);
        self.list.attach(form)
    }

    pub fn control(&self, id: ControlId) -> Option<&Control> {
        match id {
            ControlId::Add => self.add_form.control(ADD),
            ControlId::More => Some(&self.more),
            ControlId::Update(key) => self.list.get(key)?.control(UPDATE),
            ControlId::Remove(key) => self.list.get(key)?.control(REMOVE),
        }
    }

    pub fn control_mut(&mut self, id: ControlId) -> Option<&mut Control> {
        match id {
            ControlId::Add => self.add_form.control_mut(ADD),
            ControlId::More => Some(&mut self.more),
            ControlId::Update(key) => self.list.get_mut(key)?.control_mut(UPDATE),
            ControlId::Remove(key) => self.list.get_mut(key)?.control_mut(REMOVE),
        }
    }
}

/// Wire a record form's update and remove controls.
pub fn bind_record_form(form: &mut Form) {
    if let Some(update) = form.control_mut(UPDATE) {
        update.bind(Action::Update);
    }
    if let Some(remove) = form.control_mut(REMOVE) {
        remove.bind(Action::Remove);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use userbook_common::Field;

    fn record(id: i64) -> Record {
        Record::new(id, "Ann", "Lee", "1990-01-02", "12345")
    }

    #[test]
    fn test_page_wires_initial_controls() {
        let page = Page::new(&[record(1), record(2)]);
        assert_eq!(page.list.len(), 2);
        assert_eq!(page.control(ControlId::Add).unwrap().handler, Some(Action::Add));
        assert_eq!(page.control(ControlId::More).unwrap().handler, Some(Action::LoadMore));
        for key in page.list.keys() {
            assert_eq!(
                page.control(ControlId::Update(key)).unwrap().handler,
                Some(Action::Update)
            );
            assert_eq!(
                page.control(ControlId::Remove(key)).unwrap().handler,
                Some(Action::Remove)
            );
        }
    }

    #[test]
    fn test_page_constrains_add_form() {
        let page = Page::new(&[]);
        let firstname = page.add_form.input(Field::FirstName).unwrap();
        assert!(firstname.required);
        assert_eq!(firstname.placeholder, Some("First Name"));
        assert!(!page.add_form.input(Field::Id).unwrap().required);
    }

    #[test]
    fn test_list_keeps_insertion_order_and_unique_keys() {
        let mut page = Page::new(&[record(1), record(2), record(3)]);
        let keys = page.list.keys();
        page.list.remove(keys[1]).unwrap();
        let added = page.append_record(&record(4));

        assert!(!keys.contains(&added));
        let ids: Vec<String> = page
            .list
            .record_ids()
            .iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(ids, ["1", "3", "4"]);
        assert!(page.control(ControlId::Update(keys[1])).is_none());
    }

    #[test]
    fn test_control_id_form() {
        let mut list = ListView::default();
        let key = list.attach(create_record_form(&record(9)));
        assert_eq!(ControlId::Remove(key).form(), Some(key));
        assert_eq!(ControlId::More.form(), None);
    }
}
