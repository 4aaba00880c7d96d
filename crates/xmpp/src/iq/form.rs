//! XEP-0004 Data Forms, submit side only.

use crate::node::Node;
use crate::ns;

/// A `type='submit'` form. Field order is kept as added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataForm {
    form_type: Option<String>,
    fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    var: String,
    kind: Option<&'static str>,
    value: String,
}

impl DataForm {
    /// An empty submit form, as sent to accept a default configuration.
    pub fn submit() -> Self {
        Self::default()
    }

    /// A submit form tagged with a hidden `FORM_TYPE` field.
    pub fn with_form_type(form_type: &str) -> Self {
        Self {
            form_type: Some(form_type.to_string()),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, var: &str, value: &str) -> Self {
        self.fields.push(Field {
            var: var.to_string(),
            kind: None,
            value: value.to_string(),
        });
        self
    }

    pub fn hidden(mut self, var: &str, value: &str) -> Self {
        self.fields.push(Field {
            var: var.to_string(),
            kind: Some("hidden"),
            value: value.to_string(),
        });
        self
    }

    pub fn has_field(&self, var: &str) -> bool {
        (self.form_type.is_some() && var == "FORM_TYPE")
            || self.fields.iter().any(|field| field.var == var)
    }

    pub fn into_node(self) -> Node {
        let mut x = Node::namespaced("x", ns::DATA_FORMS).with_attribute("type", "submit");
        if let Some(form_type) = &self.form_type {
            x.add_child(field_node("FORM_TYPE", Some("hidden"), form_type));
        }
        for field in &self.fields {
            x.add_child(field_node(&field.var, field.kind, &field.value));
        }
        x
    }
}

fn field_node(var: &str, kind: Option<&str>, value: &str) -> Node {
    let mut field = Node::element("field").with_attribute("var", var);
    if let Some(kind) = kind {
        field.set_attribute("type", kind);
    }
    field.with_child(Node::text_element("value", value))
}
