//! RFC 6121 roster management, with XEP-0237 roster versioning.
//!
//! ```xml
//! <iq type='get' id='bv1bs71f'>
//!   <query xmlns='jabber:iq:roster' ver='ver14'/>
//! </iq>
//!
//! <iq type='set' id='rs1'>
//!   <query xmlns='jabber:iq:roster'>
//!     <item jid='nurse@example.com' name='Nurse'>
//!       <group>Servants</group>
//!     </item>
//!   </query>
//! </iq>
//!
//! <iq type='set' id='remove1'>
//!   <query xmlns='jabber:iq:roster'>
//!     <item jid='nurse@example.com' subscription='remove'/>
//!   </query>
//! </iq>
//! ```

use super::{StanzaExtension, infallible, validate_jid};
use crate::error::BuildError;
use crate::node::Node;
use crate::ns;
use crate::stanza::{IqType, Stanza};

/// Fetch the roster.
///
/// `ver: None` asks for the full roster. `Some("")` announces support for
/// versioning without a cached copy.
#[derive(Debug, Clone, Default)]
pub struct RosterRequest {
    pub ver: Option<String>,
}

impl RosterRequest {
    fn node(self) -> Node {
        let query = Node::namespaced("query", ns::ROSTER);
        match self.ver {
            Some(ver) => query.with_attribute("ver", ver),
            None => query,
        }
    }
}

impl StanzaExtension for RosterRequest {
    const IQ_TYPE: IqType = IqType::Get;

    fn into_payload(self) -> Result<Node, BuildError> {
        Ok(self.node())
    }
}

pub fn roster_request(ver: Option<&str>) -> Stanza {
    infallible(
        RosterRequest {
            ver: ver.map(String::from),
        },
        RosterRequest::node,
    )
}

/// Add a contact or change its name and groups.
#[derive(Debug, Clone)]
pub struct RosterItemUpdate {
    jid: String,
    name: Option<String>,
    groups: Vec<String>,
}

impl RosterItemUpdate {
    pub fn new(jid: impl Into<String>) -> Self {
        Self {
            jid: jid.into(),
            name: None,
            groups: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }
}

impl StanzaExtension for RosterItemUpdate {
    const IQ_TYPE: IqType = IqType::Set;

    fn into_payload(self) -> Result<Node, BuildError> {
        validate_jid(&self.jid)?;
        if self.groups.iter().any(String::is_empty) {
            return Err(BuildError::empty("group"));
        }

        let mut item = Node::element("item").with_attribute("jid", self.jid);
        if let Some(name) = self.name.filter(|name| !name.is_empty()) {
            item.set_attribute("name", name);
        }
        for group in self.groups {
            item.add_child(Node::text_element("group", group));
        }
        Ok(Node::namespaced("query", ns::ROSTER).with_child(item))
    }
}

/// An empty `name` leaves the attribute out.
pub fn roster_update(jid: &str, name: &str) -> Result<Stanza, BuildError> {
    RosterItemUpdate::new(jid).name(name).into_iq()
}

#[derive(Debug, Clone)]
pub struct RosterItemRemoval {
    pub jid: String,
}

impl StanzaExtension for RosterItemRemoval {
    const IQ_TYPE: IqType = IqType::Set;

    fn into_payload(self) -> Result<Node, BuildError> {
        validate_jid(&self.jid)?;
        let item = Node::element("item")
            .with_attribute("jid", self.jid)
            .with_attribute("subscription", "remove");
        Ok(Node::namespaced("query", ns::ROSTER).with_child(item))
    }
}

pub fn roster_remove(jid: &str) -> Result<Stanza, BuildError> {
    RosterItemRemoval {
        jid: jid.to_string(),
    }
    .into_iq()
}
