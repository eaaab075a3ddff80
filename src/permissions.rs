//! Capabilities gating workflow transitions.

use failure::Fail;
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
    de::{SeqAccess, Visitor},
    ser::SerializeSeq,
};
use std::{fmt, str::FromStr};

use crate::ApiError;

bitflags! {
    /// Capabilities held by an actor.
    ///
    /// Callers resolve these before asking for a transition; the engine never
    /// looks permissions up itself.
    #[derive(Default)]
    pub struct Capabilities: u32 {
        /// Holder can write content and move their own content through its
        /// author-controlled edges.
        const CREATE_CONTENT = 0x0000_0001;
        /// Holder can review content submitted by authors.
        const EDIT_CONTENT = 0x0000_0002;
        /// Holder can publish reviewed content.
        const PUBLISH_CONTENT = 0x0000_0004;
        /// Holder can withdraw and restore published content.
        const EDIT_IS_ACTIVE = 0x0000_0008;
        /// Capability of the system actor used by the expiry sweeper.
        ///
        /// It can never be parsed from user input and is stripped from
        /// capabilities of user actors.
        const SYSTEM = 0x8000_0000;
    }
}

/// Names of all capabilities which can be granted to a user.
const GRANTABLE: &[(&str, Capabilities)] = &[
    ("create_content", Capabilities::CREATE_CONTENT),
    ("edit_content", Capabilities::EDIT_CONTENT),
    ("publish_content", Capabilities::PUBLISH_CONTENT),
    ("edit_is_active", Capabilities::EDIT_IS_ACTIVE),
];

impl Capabilities {
    /// Capabilities a user may hold, that is everything except
    /// [`Capabilities::SYSTEM`].
    #[inline]
    pub fn grantable() -> Capabilities {
        Capabilities::all() - Capabilities::SYSTEM
    }

    /// Names of capabilities in this set.
    pub fn names(self) -> Vec<&'static str> {
        let mut names = GRANTABLE.iter()
            .filter(|(_, bit)| self.contains(*bit))
            .map(|(name, _)| *name)
            .collect::<Vec<_>>();

        if self.contains(Capabilities::SYSTEM) {
            names.push("system");
        }

        names
    }

    /// Parse a comma-separated list of capability names.
    ///
    /// Names of permissions unrelated to the workflow are ignored, since
    /// callers usually pass the complete list of an actor's permissions.
    pub fn parse_list(v: &str) -> Result<Capabilities, ParseCapabilityError> {
        v.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Capabilities::parse_name)
            .collect()
    }

    fn parse_name(name: &str) -> Result<Capabilities, ParseCapabilityError> {
        if name == "system" {
            return Err(ParseCapabilityError::Reserved);
        }

        Ok(GRANTABLE.iter()
            .find(|(n, _)| *n == name)
            .map(|(_, bit)| *bit)
            .unwrap_or_else(Capabilities::empty))
    }
}

impl FromStr for Capabilities {
    type Err = ParseCapabilityError;

    fn from_str(v: &str) -> Result<Self, Self::Err> {
        Capabilities::parse_list(v)
    }
}

impl Serialize for Capabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names = self.names();
        let mut seq = serializer.serialize_seq(Some(names.len()))?;
        for name in names {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Capabilities {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_seq(CapabilitiesVisitor)
    }
}

struct CapabilitiesVisitor;

impl<'de> Visitor<'de> for CapabilitiesVisitor {
    type Value = Capabilities;

    fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "a list of capability names")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Capabilities, A::Error> {
        use serde::de::Error;

        let mut caps = Capabilities::empty();
        while let Some(name) = seq.next_element::<String>()? {
            caps |= Capabilities::parse_name(&name).map_err(A::Error::custom)?;
        }
        Ok(caps)
    }
}

#[derive(ApiError, Debug, Fail)]
pub enum ParseCapabilityError {
    /// Attempt to claim the system actor's capability.
    #[api(code = "capability:reserved", status = "BAD_REQUEST")]
    #[fail(display = "capability 'system' cannot be granted")]
    Reserved,
}

/// Source of truth for permissions granted to users.
///
/// The workflow engine never consults an oracle itself. It is the caller's
/// job to resolve an actor's capabilities (see [`resolve()`]) and pass them
/// along with the transition request.
pub trait PermissionOracle {
    /// Check whether `actor` holds the permission named `capability`.
    fn has_permission(&self, actor: i32, capability: &str) -> bool;
}

impl<F> PermissionOracle for F
where
    F: Fn(i32, &str) -> bool,
{
    fn has_permission(&self, actor: i32, capability: &str) -> bool {
        self(actor, capability)
    }
}

/// Take a snapshot of all workflow capabilities an oracle grants to an actor.
pub fn resolve<O>(oracle: &O, actor: i32) -> Capabilities
where
    O: PermissionOracle + ?Sized,
{
    GRANTABLE.iter()
        .filter(|(name, _)| oracle.has_permission(actor, name))
        .map(|(_, bit)| *bit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_ignores_unrelated_permissions() {
        let caps = Capabilities::parse_list("create_content, comment_post,edit_is_active")
            .unwrap();
        assert_eq!(caps, Capabilities::CREATE_CONTENT | Capabilities::EDIT_IS_ACTIVE);
    }

    #[test]
    fn system_cannot_be_parsed() {
        assert!(Capabilities::parse_list("publish_content,system").is_err());
        assert!(serde_json::from_str::<Capabilities>(r#"["system"]"#).is_err());
    }

    #[test]
    fn serialize_as_names() {
        let caps = Capabilities::EDIT_CONTENT | Capabilities::PUBLISH_CONTENT;
        assert_eq!(
            serde_json::to_string(&caps).unwrap(),
            r#"["edit_content","publish_content"]"#,
        );
    }

    #[test]
    fn resolve_through_oracle() {
        let oracle = |actor: i32, name: &str| actor == 7 && name == "publish_content";
        assert_eq!(resolve(&oracle, 7), Capabilities::PUBLISH_CONTENT);
        assert_eq!(resolve(&oracle, 8), Capabilities::empty());
    }
}
