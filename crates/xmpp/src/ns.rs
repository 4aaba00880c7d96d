//! XML namespaces used on the wire.
//!
//! These strings are part of the protocol contract and must match the
//! RFCs and XEPs exactly.

/// RFC 6120 client stream namespace; default namespace of every stanza.
pub const JABBER_CLIENT: &str = "jabber:client";

/// RFC 6120 stanza error conditions.
pub const XMPP_STANZAS: &str = "urn:ietf:params:xml:ns:xmpp-stanzas";

/// RFC 6120 resource binding.
pub const BIND: &str = "urn:ietf:params:xml:ns:xmpp-bind";

/// RFC 6121 roster management.
pub const ROSTER: &str = "jabber:iq:roster";

/// XEP-0004 Data Forms.
pub const DATA_FORMS: &str = "jabber:x:data";

/// XEP-0030 Service Discovery (info).
pub const DISCO_INFO: &str = "http://jabber.org/protocol/disco#info";

/// XEP-0030 Service Discovery (items).
pub const DISCO_ITEMS: &str = "http://jabber.org/protocol/disco#items";

/// XEP-0045 Multi-User Chat, owner use cases.
pub const MUC_OWNER: &str = "http://jabber.org/protocol/muc#owner";

/// XEP-0045 Multi-User Chat, admin use cases.
pub const MUC_ADMIN: &str = "http://jabber.org/protocol/muc#admin";

/// XEP-0050 Ad-Hoc Commands.
pub const COMMANDS: &str = "http://jabber.org/protocol/commands";

/// XEP-0059 Result Set Management.
pub const RSM: &str = "http://jabber.org/protocol/rsm";

/// XEP-0077 In-Band Registration.
pub const REGISTER: &str = "jabber:iq:register";

/// XEP-0092 Software Version.
pub const VERSION: &str = "jabber:iq:version";

/// XEP-0013 Flexible Offline Message Retrieval.
pub const OFFLINE: &str = "http://jabber.org/protocol/offline";

/// XEP-0191 Blocking Command.
pub const BLOCKING: &str = "urn:xmpp:blocking";

/// XEP-0199 XMPP Ping.
pub const PING: &str = "urn:xmpp:ping";

/// XEP-0313 Message Archive Management (v2).
pub const MAM: &str = "urn:xmpp:mam:2";

/// XEP-0357 Push Notifications.
pub const PUSH: &str = "urn:xmpp:push:0";

/// XEP-0363 HTTP File Upload.
pub const HTTP_UPLOAD: &str = "urn:xmpp:http:upload:0";

/// XEP-0223 publish-options form type used when enabling push.
pub const PUBSUB_PUBLISH_OPTIONS: &str = "http://jabber.org/protocol/pubsub#publish-options";
