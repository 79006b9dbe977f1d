//! Command-line arguments.

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "starsearch", version, about = "Gemini and Gopher browser for the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub browse: BrowseArgs,

    /// Emit logs as JSON.
    #[arg(long, global = true, env = "STARSEARCH_LOG_JSON")]
    pub log_json: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct BrowseArgs {
    /// gemini:// or gopher:// URL; defaults to the configured home page.
    pub url: Option<String>,

    /// Answer to an input prompt (status 1x), sent as the URL query.
    #[arg(long)]
    pub input: Option<String>,

    /// Print the parsed document as JSON.
    #[arg(long)]
    pub json: bool,

    /// Bypass the page cache.
    #[arg(long)]
    pub reload: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage trusted server certificates.
    Certs {
        #[command(subcommand)]
        action: CertsAction,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum CertsAction {
    /// List trusted hosts.
    List,
    /// Show the certificate record for a host.
    Show { host: String },
    /// Forget a host so its next certificate is treated as new.
    Forget { host: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_browse() {
        let cli = Cli::try_parse_from(["starsearch", "gemini://example.org/", "--input", "hi", "--json"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.browse.url.as_deref(), Some("gemini://example.org/"));
        assert_eq!(cli.browse.input.as_deref(), Some("hi"));
        assert!(cli.browse.json);
    }

    #[test]
    fn test_parse_certs() {
        let cli = Cli::try_parse_from(["starsearch", "certs", "forget", "example.org"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Certs { action: CertsAction::Forget { host } }) if host == "example.org"
        ));
    }
}
