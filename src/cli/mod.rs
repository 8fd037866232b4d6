//! Command-line interface for the watch-list server.

use clap::Parser;
use std::path::PathBuf;

/// Personal anime watch-list tracker
///
/// Serves the records of one collection over HTTP.
#[derive(Debug, Parser)]
#[command(name = "watchlist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database holding the collection
    #[arg(short, long, env = "DATABASE")]
    pub database: Option<String>,

    /// Collection holding the records
    #[arg(short, long, env = "COLLECTION")]
    pub collection: Option<String>,

    /// Config file to load instead of the default search paths
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Port to listen on, overriding the config file
    #[arg(long)]
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_parsed() {
        let cli = Cli::try_parse_from(["watchlist", "-d", "MAL", "--collection", "Animes"])
            .unwrap();
        assert_eq!(cli.database.as_deref(), Some("MAL"));
        assert_eq!(cli.collection.as_deref(), Some("Animes"));
        assert!(cli.port.is_none());
    }

    #[test]
    fn port_must_be_numeric() {
        assert!(Cli::try_parse_from(["watchlist", "--port", "abc"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
