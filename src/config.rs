//! Validated runtime settings for the hddtempd daemon.
//!
//! The surface is flag-driven; validation happens once here so malformed
//! configuration is rejected at startup instead of corrupting reports.

use crate::{
    cli::Cli,
    error::{Error, Result},
};

/// Runtime settings derived from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Dump UDisks2 objects during discovery and log at debug level.
    pub debug: bool,

    /// Serve reports over TCP instead of printing once to stdout.
    pub daemon: bool,

    /// TCP port for daemon mode.
    pub port: u16,

    /// Listen address for daemon mode.
    pub listen: String,

    /// Field separator for the wire format.
    pub separator: char,
}

impl Settings {
    /// Validates the raw CLI surface.
    ///
    /// A separator that is not exactly one character would break the fixed
    /// field count legacy clients parse, so it is rejected here.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut chars = cli.separator.chars();
        let separator = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(Error::Protocol(format!(
                    "separator must be exactly one character, got {:?}",
                    cli.separator
                )));
            }
        };

        Ok(Self {
            debug: cli.debug,
            daemon: cli.daemon,
            port: cli.port,
            listen: cli.listen.clone(),
            separator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hddtempd").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_the_classic_daemon() {
        let settings = Settings::from_cli(&parse(&[])).unwrap();
        assert!(!settings.debug);
        assert!(!settings.daemon);
        assert_eq!(settings.port, 7634);
        assert_eq!(settings.listen, "localhost");
        assert_eq!(settings.separator, '|');
    }

    #[test]
    fn daemon_flags_are_parsed() {
        let settings =
            Settings::from_cli(&parse(&["-d", "-D", "-p", "7777", "-l", "0.0.0.0", "-s", ";"]))
                .unwrap();
        assert!(settings.daemon);
        assert!(settings.debug);
        assert_eq!(settings.port, 7777);
        assert_eq!(settings.listen, "0.0.0.0");
        assert_eq!(settings.separator, ';');
    }

    #[test]
    fn empty_separator_is_rejected_at_configuration_time() {
        let err = Settings::from_cli(&parse(&["-s", ""])).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn multi_character_separator_is_rejected() {
        let err = Settings::from_cli(&parse(&["-s", "||"])).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }
}
