//! Forwarded ports

use serde::{Deserialize, Serialize};

/// Transport protocol of a forwarded port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

/// A guest -> host port forward
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardedPort {
    pub name: String,
    pub guest_port: u16,
    pub host_port: u16,
    pub protocol: Protocol,
    /// Network adapter the forward is attached to (1-based)
    pub adapter: u32,
    /// Allow the host port to be reassigned on collision
    pub auto: bool,
}

/// Caller overrides for [`ForwardedPort`] defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForwardPortOptions {
    pub name: Option<String>,
    pub protocol: Option<Protocol>,
    pub adapter: Option<u32>,
    pub auto: Option<bool>,
}

impl ForwardPortOptions {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn adapter(mut self, adapter: u32) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn auto(mut self, auto: bool) -> Self {
        self.auto = Some(auto);
        self
    }
}

impl ForwardedPort {
    /// Build a forward from defaults overlaid with `options`.
    pub fn new(guest_port: u16, host_port: u16, options: ForwardPortOptions) -> Self {
        Self {
            name: options
                .name
                .unwrap_or_else(|| Self::default_name(guest_port, host_port)),
            guest_port,
            host_port,
            protocol: options.protocol.unwrap_or_default(),
            adapter: options.adapter.unwrap_or(1),
            auto: options.auto.unwrap_or(false),
        }
    }

    /// `"<guest>-<host>"` with both ports in base 32
    pub fn default_name(guest_port: u16, host_port: u16) -> String {
        format!("{}-{}", to_base32(guest_port.into()), to_base32(host_port.into()))
    }
}

/// Radix-32 digits `0-9a-v`, most significant first.
pub fn to_base32(mut n: u64) -> String {
    const DIGITS: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

    if n == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 32) as usize]);
        n /= 32;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
