//! Rule blocks: one filter stage of the command plan

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::mode::Desync;

/// Transport protocol of a port filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP
    Tcp,
    /// UDP
    Udp,
}

impl Protocol {
    /// Lowercase protocol name as used in flag names
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

/// Inclusive port range; a single port has `start == end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PortRange {
    /// First port
    pub start: u16,
    /// Last port
    pub end: u16,
}

impl PortRange {
    /// A single port
    pub const fn single(port: u16) -> Self {
        Self { start: port, end: port }
    }

    /// An inclusive range
    pub const fn range(start: u16, end: u16) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Join port ranges with commas
pub fn join_ports(ports: &[PortRange]) -> String {
    ports
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Protocol plus the ports a block applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortFilter {
    /// Protocol
    pub protocol: Protocol,
    /// Ports and ranges, in declaration order
    pub ports: Vec<PortRange>,
}

impl PortFilter {
    /// TCP filter
    pub fn tcp(ports: &[PortRange]) -> Self {
        Self {
            protocol: Protocol::Tcp,
            ports: ports.to_vec(),
        }
    }

    /// UDP filter
    pub fn udp(ports: &[PortRange]) -> Self {
        Self {
            protocol: Protocol::Udp,
            ports: ports.to_vec(),
        }
    }

    /// `--filter-tcp=...` / `--filter-udp=...`
    pub fn to_arg(&self) -> String {
        format!("--filter-{}={}", self.protocol.as_str(), join_ports(&self.ports))
    }
}

/// What a block matches beyond its port filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum HostSource {
    /// Domain list file
    Hostlist(PathBuf),
    /// IP/CIDR list file
    Ipset(PathBuf),
    /// Inline domain names
    Domains(Vec<String>),
}

impl HostSource {
    fn to_arg(&self) -> String {
        match self {
            HostSource::Hostlist(path) => format!("--hostlist={}", path.display()),
            HostSource::Ipset(path) => format!("--ipset={}", path.display()),
            HostSource::Domains(domains) => format!("--hostlist-domains={}", domains.join(",")),
        }
    }
}

/// Traffic category a block serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// QUIC for the general hostlist
    Quic,
    /// Discord voice / STUN
    Voice,
    /// discord.media on alternate HTTPS ports
    DiscordMedia,
    /// Google / YouTube
    Google,
    /// Games
    Games,
    /// Meta services
    Meta,
    /// Telegram
    Telegram,
    /// TikTok
    TikTok,
    /// X / Twitter
    X,
    /// User-supplied hostlist
    UserHosts,
    /// User-supplied IP list
    UserIps,
    /// General hostlist catch-all
    GeneralHosts,
    /// General ipset catch-all
    GeneralIps,
    /// UDP/443 ipset catch-all
    GeneralQuic,
}

/// One filter stage of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleBlock {
    /// Category for diagnostics
    pub category: Category,
    /// Port filter
    pub filter: PortFilter,
    /// Layer-7 protocol filter (`--filter-l7`)
    pub l7: Vec<String>,
    /// Hostlist, ipset or inline domains
    pub source: Option<HostSource>,
    /// Hostlist of excluded domains
    pub exclude_hostlist: Option<PathBuf>,
    /// Ipset of excluded addresses
    pub exclude_ipset: Option<PathBuf>,
    /// Add `--ip-id=zero`
    pub ip_id_zero: bool,
    /// Methods and repeats
    pub desync: Desync,
    /// Trailing flags; an empty string marks a disabled optional flag
    pub extra_flags: Vec<String>,
}

impl RuleBlock {
    /// Start a block with a filter and desync settings
    pub fn new(category: Category, filter: PortFilter, desync: Desync) -> Self {
        Self {
            category,
            filter,
            l7: Vec::new(),
            source: None,
            exclude_hostlist: None,
            exclude_ipset: None,
            ip_id_zero: false,
            desync,
            extra_flags: Vec::new(),
        }
    }

    /// Set the host source
    pub fn source(mut self, source: HostSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Set both exclusion lists
    pub fn excluding(mut self, hostlist: PathBuf, ipset: PathBuf) -> Self {
        self.exclude_hostlist = Some(hostlist);
        self.exclude_ipset = Some(ipset);
        self
    }

    /// Set the layer-7 filter
    pub fn l7(mut self, protocols: &[&str]) -> Self {
        self.l7 = protocols.iter().map(|p| (*p).to_string()).collect();
        self
    }

    /// Enable `--ip-id=zero`
    pub fn ip_id_zero(mut self, enabled: bool) -> Self {
        self.ip_id_zero = enabled;
        self
    }

    /// Append a trailing flag
    pub fn flag(mut self, token: impl Into<String>) -> Self {
        self.extra_flags.push(token.into());
        self
    }

    /// Append `token` when `enabled`, otherwise an empty placeholder
    pub fn flag_if(self, enabled: bool, token: impl Into<String>) -> Self {
        if enabled {
            self.flag(token)
        } else {
            self.flag(String::new())
        }
    }

    /// Flag tokens in encoding order, placeholders included
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = vec![self.filter.to_arg()];

        if !self.l7.is_empty() {
            tokens.push(format!("--filter-l7={}", self.l7.join(",")));
        }
        if let Some(ref source) = self.source {
            tokens.push(source.to_arg());
        }
        if let Some(ref path) = self.exclude_hostlist {
            tokens.push(format!("--hostlist-exclude={}", path.display()));
        }
        if let Some(ref path) = self.exclude_ipset {
            tokens.push(format!("--ipset-exclude={}", path.display()));
        }
        if self.ip_id_zero {
            tokens.push("--ip-id=zero".to_string());
        }
        tokens.push(format!("--dpi-desync={}", self.desync.methods.join(",")));
        tokens.push(format!("--dpi-desync-repeats={}", self.desync.repeats));
        tokens.extend(self.extra_flags.iter().cloned());

        tokens
    }
}
