//! Generic XML element tree used to build and inspect stanzas.
//!
//! A [`Node`] is mutable while it is being built and is handed to the
//! transport by value, so nothing can touch it after serialization. Wire
//! encoding goes through [`minidom::Element`].

use std::collections::BTreeMap;

use minidom::Element;

use crate::error::BuildError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    /// `None` inherits the parent's namespace.
    namespace: Option<String>,
    attributes: BTreeMap<String, String>,
    children: Vec<Node>,
    text: Option<String>,
}

impl Node {
    /// An empty `name` is accepted here and rejected on serialization.
    pub fn new(name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.map(String::from),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Element in its parent's namespace.
    pub fn element(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }

    /// Element that declares its own namespace.
    pub fn namespaced(name: impl Into<String>, namespace: &str) -> Self {
        Self::new(name, Some(namespace))
    }

    /// Leaf element holding only character data, e.g. `<max>50</max>`.
    pub fn text_element(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut node = Self::element(name);
        node.text = Some(text.into());
        node
    }

    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn is(&self, name: &str, namespace: &str) -> bool {
        self.name == name && self.namespace() == Some(namespace)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Set or replace an attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn remove_attribute(&mut self, key: &str) -> Option<String> {
        self.attributes.remove(key)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Append a child after any existing ones and return it for further building.
    pub fn add_child(&mut self, child: Node) -> &mut Node {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Set character data. Text and child elements are mutually exclusive.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), BuildError> {
        if !self.children.is_empty() {
            return Err(BuildError::invalid(
                "text",
                format!("<{}/> already has child elements", self.name),
            ));
        }
        self.text = Some(text.into());
        Ok(())
    }

    /// Builder form of [`Node::set_text`].
    pub fn with_text(mut self, text: impl Into<String>) -> Result<Self, BuildError> {
        self.set_text(text)?;
        Ok(self)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// First direct child named `name`.
    ///
    /// With `namespace`, a child that declares no namespace of its own is
    /// matched against this node's namespace.
    pub fn find_child(&self, name: &str, namespace: Option<&str>) -> Option<&Node> {
        self.children.iter().find(|child| {
            child.name == name
                && namespace.is_none_or(|ns| {
                    child.namespace().or(self.namespace()) == Some(ns)
                })
        })
    }

    /// Text of the first matching child, for `<max>50</max>`-style leaves.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.find_child(name, None).and_then(Node::text)
    }

    pub(crate) fn to_element(&self, parent_ns: &str) -> Result<Element, BuildError> {
        if self.name.is_empty() {
            return Err(BuildError::invalid(
                "name",
                format!("element in {parent_ns:?} has an empty name"),
            ));
        }
        let ns = self.namespace().unwrap_or(parent_ns);
        let mut builder = Element::builder(self.name.as_str(), ns);
        for (key, value) in &self.attributes {
            builder = builder.attr(key.as_str(), value.as_str());
        }
        if let Some(text) = &self.text {
            builder = builder.append(text.as_str());
        }
        for child in &self.children {
            builder = builder.append(child.to_element(ns)?);
        }
        Ok(builder.build())
    }

    pub(crate) fn from_element(element: &Element, parent_ns: Option<&str>) -> Self {
        let ns = element.ns();
        let namespace = match parent_ns {
            Some(parent) if parent == ns => None,
            _ => Some(ns.clone()),
        };

        let mut node = Node {
            name: element.name().to_string(),
            namespace,
            attributes: element
                .attrs()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            children: Vec::new(),
            text: None,
        };

        let mut has_children = false;
        for child in element.children() {
            has_children = true;
            node.children.push(Node::from_element(child, Some(&ns)));
        }
        if !has_children {
            let text = element.text();
            if !text.is_empty() {
                node.text = Some(text);
            }
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use assert_matches::assert_matches;

    use super::*;
    use crate::ns;

    #[test]
    fn children_keep_insertion_order() {
        let mut query = Node::namespaced("query", ns::ROSTER);
        query.add_child(Node::element("a"));
        query.add_child(Node::element("b"));
        query.add_child(Node::element("c"));

        let names: Vec<&str> = query.children().iter().map(Node::name).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn add_child_returns_the_appended_node() {
        let mut set = Node::namespaced("set", ns::RSM);
        set.add_child(Node::element("max")).set_text("10").unwrap();
        assert_eq!(set.child_text("max"), Some("10"));
    }

    #[test]
    fn set_attribute_replaces_existing_key() {
        let mut node = Node::element("item");
        node.set_attribute("jid", "a@example.com");
        node.set_attribute("jid", "b@example.com");
        assert_eq!(node.attribute("jid"), Some("b@example.com"));
        assert_eq!(node.attributes().count(), 1);
    }

    #[test]
    fn set_text_fails_when_children_present() {
        let mut node = Node::element("query").with_child(Node::element("item"));
        let err = node.set_text("oops").unwrap_err();
        assert!(matches!(err, BuildError::InvalidArgument { field: "text", .. }));
        assert!(node.text().is_none());
    }

    #[test]
    fn find_child_matches_inherited_namespace() {
        let query = Node::namespaced("query", ns::ROSTER)
            .with_child(Node::element("item").with_attribute("jid", "a@example.com"));

        assert!(query.find_child("item", None).is_some());
        assert!(query.find_child("item", Some(ns::ROSTER)).is_some());
        assert!(query.find_child("item", Some(ns::MAM)).is_none());
        assert!(query.find_child("group", None).is_none());
    }

    #[test]
    fn find_child_returns_first_match_only() {
        let node = Node::element("error")
            .with_child(Node::namespaced("text", ns::XMPP_STANZAS))
            .with_child(Node::namespaced("text", "urn:example:other"));
        let found = node.find_child("text", None).unwrap();
        assert_eq!(found.namespace(), Some(ns::XMPP_STANZAS));
    }

    #[test]
    fn element_conversion_preserves_namespace_inheritance() {
        let bind = Node::namespaced("bind", ns::BIND)
            .with_child(Node::text_element("resource", "laptop"));

        let element = bind.to_element(ns::JABBER_CLIENT).unwrap();
        assert_eq!(element.ns(), ns::BIND);
        let resource = element.children().next().unwrap();
        assert_eq!(resource.ns(), ns::BIND);
        assert_eq!(resource.text(), "laptop");

        let back = Node::from_element(&element, Some(ns::JABBER_CLIENT));
        assert_eq!(back, bind);
    }

    #[test]
    fn empty_name_is_rejected_on_conversion() {
        let query = Node::namespaced("query", ns::ROSTER).with_child(Node::element(""));
        assert_matches!(
            query.to_element(ns::JABBER_CLIENT),
            Err(BuildError::InvalidArgument { field: "name", .. })
        );
    }

    #[test]
    fn from_element_reads_attributes_and_text() {
        let element = Element::from_str(
            "<slot xmlns='urn:xmpp:http:upload:0'><put url='https://x/put'/><get url='https://x/get'/></slot>",
        )
        .unwrap();
        let node = Node::from_element(&element, None);
        assert_eq!(node.namespace(), Some(ns::HTTP_UPLOAD));
        assert_eq!(
            node.find_child("put", Some(ns::HTTP_UPLOAD))
                .and_then(|put| put.attribute("url")),
            Some("https://x/put")
        );
        assert!(node.text().is_none());
    }
}
