//! Form model: inputs, controls, the record form factory and the serializer.

use serde::ser::{Serialize, SerializeMap, Serializer};
use userbook_common::{Field, FieldViolation, Record, matches_input_pattern};

pub const ADD: &str = "add";
pub const UPDATE: &str = "update";
pub const REMOVE: &str = "remove";
pub const MORE: &str = "more";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Text,
    Hidden,
}

/// One named form input and its constraint attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub name: Field,
    pub input_type: InputType,
    pub value: String,
    pub required: bool,
    pub placeholder: Option<&'static str>,
    pub pattern: Option<&'static str>,
    pub disabled: bool,
}

impl Input {
    pub fn text(name: Field, value: &str) -> Self {
        Self {
            name,
            input_type: InputType::Text,
            value: value.to_string(),
            required: false,
            placeholder: None,
            pattern: None,
            disabled: false,
        }
    }

    pub fn hidden(name: Field, value: &str) -> Self {
        Self {
            input_type: InputType::Hidden,
            ..Self::text(name, value)
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.input_type == InputType::Hidden
    }

    /// Constraint check against this input's own attributes. Disabled inputs
    /// are exempt.
    pub fn validity(&self) -> Result<(), FieldViolation> {
        if self.disabled {
            return Ok(());
        }
        if self.value.is_empty() {
            return if self.required {
                Err(FieldViolation::Missing(self.name))
            } else {
                Ok(())
            };
        }
        if self
            .pattern
            .is_some_and(|pattern| !matches_input_pattern(pattern, &self.value))
        {
            return Err(FieldViolation::Pattern(self.name));
        }
        Ok(())
    }
}

/// The operation a control's click handler performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Update,
    Remove,
    LoadMore,
}

/// A plain (non-submit) button with busy and failed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub name: &'static str,
    pub label: &'static str,
    pub disabled: bool,
    /// Set when the most recent operation triggered here did not succeed
    pub failed: bool,
    pub handler: Option<Action>,
}

impl Control {
    pub fn new(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            disabled: false,
            failed: false,
            handler: None,
        }
    }

    pub fn bind(&mut self, action: Action) {
        self.handler = Some(action);
    }
}

/// A form: ordered inputs followed by its action controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub inputs: Vec<Input>,
    pub controls: Vec<Control>,
    /// Violations found by the last rejected submission, for display
    pub violations: Vec<FieldViolation>,
}

impl Form {
    pub fn input(&self, name: Field) -> Option<&Input> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn input_mut(&mut self, name: Field) -> Option<&mut Input> {
        self.inputs.iter_mut().find(|i| i.name == name)
    }

    /// Current value of `name`, empty if the form has no such input.
    pub fn value(&self, name: Field) -> &str {
        self.input(name).map(|i| i.value.as_str()).unwrap_or("")
    }

    /// Set an input's value; returns false if the form has no such input.
    pub fn set_value(&mut self, name: Field, value: &str) -> bool {
        match self.input_mut(name) {
            Some(input) => {
                input.value = value.to_string();
                true
            }
            None => false,
        }
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.name == name)
    }

    pub fn control_mut(&mut self, name: &str) -> Option<&mut Control> {
        self.controls.iter_mut().find(|c| c.name == name)
    }

    /// Inputs the user can see, i.e. everything but hidden fields.
    pub fn visible_inputs_mut(&mut self) -> &mut [Input] {
        // Hidden inputs lead every form this module builds.
        let first_visible = self
            .inputs
            .iter()
            .position(|i| !i.is_hidden())
            .unwrap_or(self.inputs.len());
        &mut self.inputs[first_visible..]
    }

    /// Run constraint validation over every input, in form order.
    pub fn check_validity(&self) -> Vec<FieldViolation> {
        self.inputs
            .iter()
            .filter_map(|input| input.validity().err())
            .collect()
    }

    /// The record the form currently describes.
    pub fn to_record(&self) -> Record {
        Record::new(
            self.value(Field::Id),
            self.value(Field::FirstName),
            self.value(Field::LastName),
            self.value(Field::Dob),
            self.value(Field::ZipCode),
        )
    }
}

/// Mark inputs required and attach placeholder and pattern per field name.
///
/// Returns the same inputs so calls can be chained.
pub fn apply_input_constraints(inputs: &mut [Input]) -> &mut [Input] {
    for input in inputs.iter_mut() {
        input.required = true;
        if let Some(placeholder) = input.name.placeholder() {
            input.placeholder = Some(placeholder);
        }
        if let Some(pattern) = input.name.pattern() {
            input.pattern = Some(pattern);
        }
    }
    inputs
}

fn record_inputs(record: &Record) -> Vec<Input> {
    let mut inputs = vec![Input::hidden(Field::Id, record.id.as_str())];
    inputs.extend(
        Field::ATTRIBUTES
            .iter()
            .map(|field| Input::text(*field, record.value(*field))),
    );
    inputs
}

/// Build the form for one existing record.
///
/// The form is returned unattached and with unbound controls; the caller wires
/// handlers and inserts it into the list.
pub fn create_record_form(record: &Record) -> Form {
    let mut form = Form {
        inputs: record_inputs(record),
        controls: vec![
            Control::new(UPDATE, "Update"),
            Control::new(REMOVE, "Remove"),
        ],
        violations: Vec::new(),
    };
    apply_input_constraints(form.visible_inputs_mut());
    form
}

/// Build the persistent creation form, with an empty hidden `id`.
///
/// Constraints are not applied here; page setup applies them to every
/// pre-existing input at once.
pub fn create_add_form() -> Form {
    Form {
        inputs: record_inputs(&Record::default()),
        controls: vec![Control::new(ADD, "Add")],
        violations: Vec::new(),
    }
}

/// Named, enabled inputs in form order. A repeated name keeps its first
/// position and its last value.
struct SerializedFields<'a>(Vec<(&'a str, &'a str)>);

impl<'a> SerializedFields<'a> {
    fn collect(form: &'a Form) -> Self {
        let mut fields: Vec<(&'a str, &'a str)> = Vec::with_capacity(form.inputs.len());
        for input in form.inputs.iter().filter(|i| !i.disabled) {
            let name = input.name.name();
            match fields.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = input.value.as_str(),
                None => fields.push((name, input.value.as_str())),
            }
        }
        Self(fields)
    }
}

impl Serialize for SerializedFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Serialize a form's named, enabled fields to a flat JSON object string.
///
/// No validation happens here.
pub fn serialize_form(form: &Form) -> Result<String, serde_json::Error> {
    serde_json::to_string(&SerializedFields::collect(form))
}
