//! Builders for the IQ requests and replies this client sends.
//!
//! Each extension is a small struct implementing [`StanzaExtension`], with a
//! free function alongside for the common call shape:
//!
//! ```
//! use tern_xmpp::iq::{self, StanzaExtension};
//! use tern_xmpp::stanza::IqType;
//!
//! let ping = iq::ping();
//! assert_eq!(ping.iq_type(), Some(IqType::Get));
//!
//! let update = iq::RosterItemUpdate::new("bob@example.com")
//!     .name("Bob")
//!     .into_iq()
//!     .unwrap();
//! assert_eq!(update.iq_type(), Some(IqType::Set));
//! ```
//!
//! Builders validate every argument before building, never assign ids and
//! never touch the network. Ids are minted when the stanza is submitted to
//! the [`CorrelationEngine`](crate::correlation::CorrelationEngine).

mod blocking;
mod disco;
mod form;
mod mam;
mod muc;
mod push;
mod register;
mod roster;
mod session;
mod upload;

use crate::error::BuildError;
use crate::node::Node;
use crate::stanza::{IqType, Stanza};

pub use blocking::{Block, BlocklistRequest, Unblock, block, blocklist, set_blocked, unblock};
pub use disco::{
    DiscoInfoQuery, DiscoItemsQuery, Identity, disco_info_query, disco_info_response,
    disco_items_query,
};
pub use form::DataForm;
pub use mam::{
    MAM_PAGE_SIZE, MamArchivePref, MamPage, MamPrefsRequest, MamPrefsUpdate, MamQuery,
    mam_after, mam_complete, mam_latest_before, mam_latest_id, mam_prefs, mam_update_prefs,
};
pub use muc::{AffiliationList, InstantRoom, MucAffiliation, affiliation_list, instant_room};
pub use push::{
    APPSERVER_REGISTER_NODE, AppServerRegistration, PushDisable, PushEnable, appserver_register,
    push_disable, push_enable,
};
pub use register::{
    PasswordChange, RegistrationFieldsRequest, UserRegistration, change_password,
    register_user, registration_fields,
};
pub use roster::{
    RosterItemRemoval, RosterItemUpdate, RosterRequest, roster_remove, roster_request,
    roster_update,
};
pub use session::{
    Bind, OfflinePurge, Ping, VersionQuery, bind, offline_purge, ping, version_query,
    version_response,
};
pub use upload::{DEFAULT_CONTENT_TYPE, UploadSlotRequest, upload_slot};

/// A payload that travels inside an `<iq/>` of a fixed type.
pub trait StanzaExtension: Sized {
    const IQ_TYPE: IqType;

    /// Validate the arguments and build the payload element.
    fn into_payload(self) -> Result<Node, BuildError>;

    fn into_iq(self) -> Result<Stanza, BuildError> {
        let payload = self.into_payload()?;
        Ok(Stanza::iq(Self::IQ_TYPE).with_payload(payload))
    }

    fn into_iq_to(self, to: &str) -> Result<Stanza, BuildError> {
        validate_jid(to)?;
        Ok(self.into_iq()?.with_to(to))
    }
}

/// Builds the stanza for an extension whose payload cannot fail.
fn infallible<E: StanzaExtension>(extension: E, payload: fn(E) -> Node) -> Stanza {
    Stanza::iq(E::IQ_TYPE).with_payload(payload(extension))
}

pub(crate) fn validate_jid(value: &str) -> Result<(), BuildError> {
    if value.is_empty() || value.parse::<jid::Jid>().is_err() {
        return Err(BuildError::InvalidJid(value.to_string()));
    }
    Ok(())
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), BuildError> {
    if value.is_empty() {
        return Err(BuildError::empty(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_jid() {
        assert!(validate_jid("alice@example.com").is_ok());
        assert!(validate_jid("example.com").is_ok());
        assert!(validate_jid("alice@example.com/laptop").is_ok());

        assert_eq!(validate_jid(""), Err(BuildError::InvalidJid(String::new())));
        assert!(matches!(
            validate_jid("@example.com"),
            Err(BuildError::InvalidJid(_))
        ));
    }

    #[test]
    fn test_into_iq_to_validates_recipient() {
        let err = Ping.into_iq_to("alice@").unwrap_err();
        assert_eq!(err, BuildError::InvalidJid("alice@".to_string()));

        let stanza = Ping.into_iq_to("example.com").unwrap();
        assert_eq!(stanza.to(), Some("example.com"));
        assert_eq!(stanza.payload().len(), 1);
    }
}
