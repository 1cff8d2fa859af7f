use serde::Serialize;

pub const AUTOMATIC_SERVER_ID: &str = "auto";
pub const DEFAULT_SERVER_ID: &str = "cloudflare";

/// One entry of the resolver catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsServer {
    pub id: String,
    pub name: String,
    /// `host:port`; empty for the automatic pseudo-entry
    pub address: String,
    pub description: String,
}

impl DnsServer {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            description: description.into(),
        }
    }

    /// The fixed set of public resolvers, in tie-break order.
    pub fn catalog() -> Vec<DnsServer> {
        vec![
            Self::new(
                DEFAULT_SERVER_ID,
                "Cloudflare",
                "1.1.1.1:53",
                "Fast, privacy-focused resolver",
            ),
            Self::new("google", "Google", "8.8.8.8:53", "Google Public DNS"),
            Self::new("quad9", "Quad9", "9.9.9.9:53", "Blocks known malicious domains"),
            Self::new("adguard", "AdGuard", "94.140.14.14:53", "Blocks ads and trackers"),
            Self::new("cisco", "OpenDNS", "208.67.222.222:53", "Cisco OpenDNS"),
        ]
    }

    /// "Let the prober decide."
    pub fn automatic() -> Self {
        Self::new(
            AUTOMATIC_SERVER_ID,
            "Automatic",
            "",
            "Use the fastest server from the last probe",
        )
    }

    /// Cloudflare, used when automatic selection has nothing to go on.
    pub fn default_server() -> Self {
        Self::catalog()
            .into_iter()
            .find(|server| server.id == DEFAULT_SERVER_ID)
            .unwrap_or_else(|| Self::new(DEFAULT_SERVER_ID, "Cloudflare", "1.1.1.1:53", ""))
    }

    /// Look up a catalog entry (or the automatic entry) by id.
    pub fn find(id: &str) -> Option<Self> {
        if id == AUTOMATIC_SERVER_ID {
            return Some(Self::automatic());
        }
        Self::catalog().into_iter().find(|server| server.id == id)
    }

    pub fn is_automatic(&self) -> bool {
        self.id == AUTOMATIC_SERVER_ID
    }

    /// Host part of the address.
    pub fn host(&self) -> &str {
        self.address
            .rsplit_once(':')
            .map_or(self.address.as_str(), |(host, _)| host)
    }
}
