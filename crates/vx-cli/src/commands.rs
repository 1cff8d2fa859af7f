use clap::Subcommand;

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Probe every DNS server once and report the fastest
    Probe,

    /// Start the proxy and stream its log until Ctrl-C
    Run {
        /// Catalog id, `auto`, or a custom host:port resolver
        #[arg(long, default_value = "auto")]
        dns: String,
    },

    /// Measure latency to the reference endpoint
    Latency {
        /// Keep measuring on the configured interval
        #[arg(long)]
        watch: bool,
    },

    /// Disable web proxies on every network service
    ResetProxy,

    /// List the DNS server catalog
    Servers,
}
