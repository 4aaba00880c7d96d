//! XEP-0313 Message Archive Management queries and preferences, paged with
//! XEP-0059 Result Set Management.
//!
//! ```xml
//! <iq type='get' id='juliet1'>
//!   <query xmlns='urn:xmpp:mam:2' queryid='f27'>
//!     <x xmlns='jabber:x:data' type='submit'>
//!       <field var='FORM_TYPE' type='hidden'>
//!         <value>urn:xmpp:mam:2</value>
//!       </field>
//!       <field var='with'><value>juliet@capulet.lit</value></field>
//!     </x>
//!     <set xmlns='http://jabber.org/protocol/rsm'>
//!       <max>50</max>
//!       <before>09af3-cc343-b409f</before>
//!     </set>
//!   </query>
//! </iq>
//!
//! <iq type='set' id='juliet2'>
//!   <prefs xmlns='urn:xmpp:mam:2' default='roster'/>
//! </iq>
//! ```

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use super::form::DataForm;
use super::{StanzaExtension, infallible, validate_jid};
use crate::error::BuildError;
use crate::node::Node;
use crate::ns;
use crate::stanza::{IqType, Stanza};

/// Messages requested per archive page.
pub const MAM_PAGE_SIZE: u32 = 50;

/// Which slice of the archive a query asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MamPage {
    /// The newest page, or the page just before the given archive id.
    LatestBefore(Option<String>),
    /// The page following the given archive id.
    After(String),
    /// The oldest page; walk forward with `After` to fetch everything.
    Complete,
    /// Only the newest message, to learn the archive's current id.
    LatestId,
}

impl MamPage {
    fn rsm(&self) -> Result<Node, BuildError> {
        let mut set = Node::namespaced("set", ns::RSM);
        match self {
            MamPage::LatestBefore(before) => {
                set.add_child(max(MAM_PAGE_SIZE));
                if let Some(before) = before.as_deref().filter(|id| !id.is_empty()) {
                    set.add_child(Node::text_element("before", before));
                }
            }
            MamPage::After(after) => {
                if after.is_empty() {
                    return Err(BuildError::empty("after"));
                }
                set.add_child(max(MAM_PAGE_SIZE));
                set.add_child(Node::text_element("after", after.as_str()));
            }
            MamPage::Complete => {
                set.add_child(max(MAM_PAGE_SIZE));
            }
            MamPage::LatestId => {
                set.add_child(max(1));
                set.add_child(Node::element("before"));
            }
        }
        Ok(set)
    }
}

fn max(n: u32) -> Node {
    Node::text_element("max", n.to_string())
}

/// An archive query. Each query gets a fresh `queryid` so the result
/// messages can be told apart from concurrent queries.
#[derive(Debug, Clone)]
pub struct MamQuery {
    with: Option<String>,
    page: MamPage,
    query_id: String,
}

impl MamQuery {
    pub fn new(page: MamPage) -> Self {
        Self {
            with: None,
            page,
            query_id: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Restrict the query to one conversation partner.
    pub fn with(mut self, jid: impl Into<String>) -> Self {
        self.with = Some(jid.into());
        self
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    pub fn with_query_id(mut self, query_id: impl Into<String>) -> Self {
        self.query_id = query_id.into();
        self
    }
}

impl StanzaExtension for MamQuery {
    const IQ_TYPE: IqType = IqType::Get;

    fn into_payload(self) -> Result<Node, BuildError> {
        let mut form = DataForm::with_form_type(ns::MAM);
        if let Some(with) = &self.with {
            validate_jid(with)?;
            form = form.field("with", with);
        }
        let rsm = self.page.rsm()?;

        Ok(Node::namespaced("query", ns::MAM)
            .with_attribute("queryid", self.query_id)
            .with_child(form.into_node())
            .with_child(rsm))
    }
}

pub fn mam_latest_before(jid: Option<&str>, before: Option<&str>) -> Result<Stanza, BuildError> {
    let query = MamQuery::new(MamPage::LatestBefore(before.map(String::from)));
    match jid {
        Some(jid) => query.with(jid).into_iq(),
        None => query.into_iq(),
    }
}

pub fn mam_after(after: &str) -> Result<Stanza, BuildError> {
    MamQuery::new(MamPage::After(after.to_string())).into_iq()
}

pub fn mam_complete() -> Result<Stanza, BuildError> {
    MamQuery::new(MamPage::Complete).into_iq()
}

pub fn mam_latest_id() -> Result<Stanza, BuildError> {
    MamQuery::new(MamPage::LatestId).into_iq()
}

/// Archiving default for messages from JIDs with no explicit rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MamArchivePref {
    Always,
    Never,
    Roster,
}

impl MamArchivePref {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::Roster => "roster",
        }
    }
}

impl FromStr for MamArchivePref {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            "roster" => Ok(Self::Roster),
            other => Err(BuildError::InvalidEnumValue {
                field: "default",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for MamArchivePref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MamPrefsRequest;

impl MamPrefsRequest {
    fn node(self) -> Node {
        Node::namespaced("prefs", ns::MAM)
    }
}

impl StanzaExtension for MamPrefsRequest {
    const IQ_TYPE: IqType = IqType::Get;

    fn into_payload(self) -> Result<Node, BuildError> {
        Ok(self.node())
    }
}

pub fn mam_prefs() -> Stanza {
    infallible(MamPrefsRequest, MamPrefsRequest::node)
}

#[derive(Debug, Clone, Copy)]
pub struct MamPrefsUpdate {
    pub default: MamArchivePref,
}

impl StanzaExtension for MamPrefsUpdate {
    const IQ_TYPE: IqType = IqType::Set;

    fn into_payload(self) -> Result<Node, BuildError> {
        Ok(Node::namespaced("prefs", ns::MAM).with_attribute("default", self.default.as_str()))
    }
}

/// `pref` must be `always`, `never` or `roster`.
pub fn mam_update_prefs(pref: &str) -> Result<Stanza, BuildError> {
    MamPrefsUpdate {
        default: pref.parse()?,
    }
    .into_iq()
}
