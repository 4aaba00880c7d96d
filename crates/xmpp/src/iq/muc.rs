//! XEP-0045 Multi-User Chat owner and admin requests.
//!
//! ```xml
//! <iq type='set' id='create1' to='coven@chat.shakespeare.lit'>
//!   <query xmlns='http://jabber.org/protocol/muc#owner'>
//!     <x xmlns='jabber:x:data' type='submit'/>
//!   </query>
//! </iq>
//!
//! <iq type='get' id='member3' to='coven@chat.shakespeare.lit'>
//!   <query xmlns='http://jabber.org/protocol/muc#admin'>
//!     <item affiliation='member'/>
//!   </query>
//! </iq>
//! ```

use std::fmt;
use std::str::FromStr;

use super::form::DataForm;
use super::{StanzaExtension, infallible};
use crate::error::BuildError;
use crate::node::Node;
use crate::ns;
use crate::stanza::{IqType, Stanza};

/// Accept the default configuration of a room we just created.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantRoom;

impl InstantRoom {
    fn node(self) -> Node {
        Node::namespaced("query", ns::MUC_OWNER).with_child(DataForm::submit().into_node())
    }
}

impl StanzaExtension for InstantRoom {
    const IQ_TYPE: IqType = IqType::Set;

    fn into_payload(self) -> Result<Node, BuildError> {
        Ok(self.node())
    }
}

/// Address the result to the room's bare JID.
pub fn instant_room() -> Stanza {
    infallible(InstantRoom, InstantRoom::node)
}

/// Affiliations a room keeps a list for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MucAffiliation {
    Member,
    Admin,
    Owner,
    Outcast,
}

impl MucAffiliation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
            Self::Owner => "owner",
            Self::Outcast => "outcast",
        }
    }
}

impl FromStr for MucAffiliation {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            "outcast" => Ok(Self::Outcast),
            other => Err(BuildError::InvalidEnumValue {
                field: "affiliation",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for MucAffiliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AffiliationList {
    pub affiliation: MucAffiliation,
}

impl StanzaExtension for AffiliationList {
    const IQ_TYPE: IqType = IqType::Get;

    fn into_payload(self) -> Result<Node, BuildError> {
        Ok(Node::namespaced("query", ns::MUC_ADMIN).with_child(
            Node::element("item").with_attribute("affiliation", self.affiliation.as_str()),
        ))
    }
}

/// `list` is one of `member`, `admin`, `owner` or `outcast`.
pub fn affiliation_list(list: &str) -> Result<Stanza, BuildError> {
    AffiliationList {
        affiliation: list.parse()?,
    }
    .into_iq()
}
