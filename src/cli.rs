use clap::Parser;

/// hddtempd - drive-temperature daemon backed by UDisks2 and the drivetemp
/// kernel module. Reports whether disks are spun down when run as root.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Display UDisks2 objects and their property values during discovery.
    #[arg(short = 'D', long = "debug")]
    pub debug: bool,

    /// Execute in TCP/IP daemon mode (port 7634 by default). Always runs in
    /// the foreground.
    #[arg(short = 'd', long = "daemon")]
    pub daemon: bool,

    /// Port number to listen to (in TCP/IP daemon mode).
    #[arg(short = 'p', long = "port", default_value_t = 7634)]
    pub port: u16,

    /// Listen on a specific address. Argument is a host name, a
    /// dotted-decimal IPv4 address or an IPv6 hex address.
    #[arg(short = 'l', long = "listen", default_value = "localhost")]
    pub listen: String,

    /// Separator to use between fields (in TCP/IP daemon mode).
    #[arg(short = 's', long = "separator", default_value = "|")]
    pub separator: String,
}
