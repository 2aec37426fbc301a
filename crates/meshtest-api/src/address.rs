use core::fmt;
use std::str::FromStr;

use http::uri::Authority;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// The xDS-advertised address of a test server: the host/port pair a URL map
/// routes, and the authority a test client dials through its `xds:///`
/// target URI.
///
/// The host here is a virtual name that only exists inside the control
/// plane's routing configuration - it never has to resolve in DNS. An
/// address always carries a port, and must not carry a username or
/// password.
#[derive(Clone)]
pub struct XdsAddress {
    authority: Authority,
}

impl XdsAddress {
    pub fn new(host: &str, port: u16) -> Result<Self, Error> {
        Self::from_str(&format!("{host}:{port}"))
    }

    pub fn host(&self) -> &str {
        self.authority.host()
    }

    pub fn port(&self) -> u16 {
        // presence is checked at construction
        self.authority.port_u16().unwrap_or_default()
    }

    /// The raw `host[:port]` authority.
    pub fn authority(&self) -> &str {
        self.authority.as_str()
    }

    /// The `xds:///` target URI clients should be pointed at.
    pub fn uri(&self) -> String {
        format!("xds:///{}", self.authority)
    }
}

impl FromStr for XdsAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // accept both the bare authority and the full target URI.
        let s = s.strip_prefix("xds:///").unwrap_or(s);

        let authority = Authority::from_str(s)
            .map_err(|_| Error::new_static("invalid xDS authority").with_input(s))?;

        if !authority.as_str().starts_with(authority.host()) {
            return Err(Error::new_static(
                "an xDS address must not contain a username or password",
            )
            .with_input(s));
        }

        if authority.port_u16().is_none() {
            return Err(Error::new_static("an xDS address must include a port").with_input(s));
        }

        Ok(Self { authority })
    }
}

impl PartialEq for XdsAddress {
    fn eq(&self, other: &Self) -> bool {
        self.authority == other.authority
    }
}

impl Eq for XdsAddress {}

impl std::fmt::Display for XdsAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "xds:///{}", self.authority)
    }
}

impl std::fmt::Debug for XdsAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "xds:///{}", self.authority)
    }
}

impl Serialize for XdsAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.authority.as_str())
    }
}

struct XdsAddressVisitor;

impl<'de> Visitor<'de> for XdsAddressVisitor {
    type Value = XdsAddress;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a `host:port` authority or `xds:///` target URI")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        XdsAddress::from_str(value).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for XdsAddress {
    fn deserialize<D>(deserializer: D) -> Result<XdsAddress, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(XdsAddressVisitor)
    }
}
