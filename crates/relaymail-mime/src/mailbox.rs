//! Mailboxes and recipient lists.

use std::fmt;

/// Display name used for the sender when none is given.
pub const DEFAULT_SENDER_NAME: &str = "Sender";

/// Display name used for a single recipient when none is given.
pub const DEFAULT_RECIPIENT_NAME: &str = "Receiver";

/// Separator used by [`RecipientList`] unless another is set.
pub const DEFAULT_SEPARATOR: &str = ",";

/// An email address with an optional display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mailbox {
    /// Email address.
    pub address: String,
    /// Display name.
    pub name: Option<String>,
}

impl Mailbox {
    /// Creates a mailbox without a display name.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
        }
    }

    /// Creates a mailbox with a display name. An empty name counts as none.
    #[must_use]
    pub fn with_name(address: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            address: address.into(),
            name: (!name.is_empty()).then_some(name),
        }
    }

    /// Returns true if the address is empty or whitespace.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.address.trim().is_empty()
    }

    /// Formats as `name <address>`, falling back to `default_name`.
    #[must_use]
    pub fn to_header_value(&self, default_name: &str) -> String {
        let name = self.name.as_deref().unwrap_or(default_name);
        format!("{name} <{}>", self.address)
    }
}

impl fmt::Display for Mailbox {
    /// `name <address>` when named, the bare address otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => f.write_str(&self.address),
        }
    }
}

impl From<&str> for Mailbox {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for Mailbox {
    fn from(address: String) -> Self {
        Self::new(address)
    }
}

/// Ordered list of recipients joined into one `To` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecipientList {
    recipients: Vec<Mailbox>,
    separator: String,
}

impl Default for RecipientList {
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl RecipientList {
    /// Creates an empty list with the default separator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the separator.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Appends a recipient. An empty name means a bare address.
    #[must_use]
    pub fn add(mut self, address: impl Into<String>, name: impl Into<String>) -> Self {
        self.push(Mailbox::with_name(address, name));
        self
    }

    /// Appends a recipient in place.
    pub fn push(&mut self, mailbox: Mailbox) {
        self.recipients.push(mailbox);
    }

    /// Returns the recipients in order.
    #[must_use]
    pub fn recipients(&self) -> &[Mailbox] {
        &self.recipients
    }

    /// Returns the separator.
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Returns true if the list has no non-empty address.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipients.iter().all(Mailbox::is_empty)
    }

    /// Joins every entry as `name <address>` or bare address.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        self.recipients
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

impl fmt::Display for RecipientList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

impl FromIterator<Mailbox> for RecipientList {
    fn from_iter<I: IntoIterator<Item = Mailbox>>(iter: I) -> Self {
        Self {
            recipients: iter.into_iter().collect(),
            ..Self::default()
        }
    }
}

/// Who a message is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Recipient {
    /// One mailbox; the `To` header is `name <address>`.
    Single(Mailbox),
    /// Several mailboxes; the `To` header is the joined list verbatim.
    Bulk(RecipientList),
}

impl Default for Recipient {
    fn default() -> Self {
        Self::Single(Mailbox::default())
    }
}

impl Recipient {
    /// Returns true if there is no address to deliver to.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(mailbox) => mailbox.is_empty(),
            Self::Bulk(list) => list.is_empty(),
        }
    }

    /// Returns the `To` header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        match self {
            Self::Single(mailbox) => mailbox.to_header_value(DEFAULT_RECIPIENT_NAME),
            Self::Bulk(list) => list.to_header_value(),
        }
    }

    /// Returns every non-empty envelope address in order.
    #[must_use]
    pub fn addresses(&self) -> Vec<&str> {
        let mailboxes: &[Mailbox] = match self {
            Self::Single(mailbox) => std::slice::from_ref(mailbox),
            Self::Bulk(list) => list.recipients(),
        };
        mailboxes
            .iter()
            .filter(|m| !m.is_empty())
            .map(|m| m.address.as_str())
            .collect()
    }
}

impl From<&str> for Recipient {
    fn from(address: &str) -> Self {
        Self::Single(Mailbox::new(address))
    }
}

impl From<String> for Recipient {
    fn from(address: String) -> Self {
        Self::Single(Mailbox::new(address))
    }
}

impl From<Mailbox> for Recipient {
    fn from(mailbox: Mailbox) -> Self {
        Self::Single(mailbox)
    }
}

impl From<RecipientList> for Recipient {
    fn from(list: RecipientList) -> Self {
        Self::Bulk(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_display() {
        assert_eq!(Mailbox::new("a@x.com").to_string(), "a@x.com");
        assert_eq!(
            Mailbox::with_name("a@x.com", "Alice").to_string(),
            "Alice <a@x.com>"
        );
        assert_eq!(Mailbox::with_name("a@x.com", "").name, None);
    }

    #[test]
    fn test_mailbox_default_name() {
        assert_eq!(
            Mailbox::new("b@y.com").to_header_value(DEFAULT_RECIPIENT_NAME),
            "Receiver <b@y.com>"
        );
        assert_eq!(
            Mailbox::with_name("b@y.com", "Bob").to_header_value(DEFAULT_RECIPIENT_NAME),
            "Bob <b@y.com>"
        );
    }

    #[test]
    fn test_recipient_list_joins_with_separator() {
        let list = RecipientList::new()
            .add("a@x.com", "Alice")
            .add("b@y.com", "");
        assert_eq!(list.to_header_value(), "Alice <a@x.com>,b@y.com");

        let list = list.with_separator(", ");
        assert_eq!(list.to_string(), "Alice <a@x.com>, b@y.com");
    }

    #[test]
    fn test_empty_recipient_list() {
        assert!(RecipientList::new().is_empty());
        assert_eq!(RecipientList::new().to_header_value(), "");
        assert!(Recipient::from(RecipientList::new()).is_empty());
    }

    #[test]
    fn test_recipient_addresses() {
        let single = Recipient::from("b@y.com");
        assert_eq!(single.addresses(), vec!["b@y.com"]);
        assert_eq!(single.to_header_value(), "Receiver <b@y.com>");

        let bulk: Recipient = RecipientList::new()
            .add("a@x.com", "Alice")
            .add("", "Nobody")
            .add("c@z.com", "")
            .into();
        assert_eq!(bulk.addresses(), vec!["a@x.com", "c@z.com"]);
        assert_eq!(
            bulk.to_header_value(),
            "Alice <a@x.com>,Nobody <>,c@z.com"
        );
    }

    #[test]
    fn test_default_recipient_is_empty() {
        assert!(Recipient::default().is_empty());
        assert!(Recipient::from("  ").is_empty());
    }
}
