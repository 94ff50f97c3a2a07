//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "uplink")]
#[command(author, version, about = "Relay remote files into a Telegram chat")]
pub struct Cli {
    /// Configuration file
    #[arg(
        short,
        long,
        env = "UPLINK_CONFIG",
        default_value = "config.toml",
        global = true
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Long-poll the Bot API and handle chat messages (default)
    Serve,
    /// Upload a single URL to a chat and exit
    Send(SendArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SendArgs {
    /// Direct HTTP(S) URL or Google Drive share link
    pub url: String,

    /// Destination chat id
    #[arg(long, allow_negative_numbers = true)]
    pub chat: i64,

    /// Requesting user, checked against the allow-list
    #[arg(long)]
    pub user: i64,

    /// Deliver the file under this name
    #[arg(long)]
    pub rename: Option<String>,

    /// Thumbnail for document uploads
    #[arg(long)]
    pub thumbnail: Option<PathBuf>,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        self.command.clone().unwrap_or(Mode::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_default_mode_is_serve() {
        let cli = Cli::try_parse_from(["uplink", "--config", "/etc/uplink.toml"]).unwrap();
        assert_eq!(cli.mode(), Mode::Serve);
        assert_eq!(cli.config, PathBuf::from("/etc/uplink.toml"));
    }

    #[test]
    fn test_parse_send_minimal() {
        let cli = Cli::try_parse_from([
            "uplink",
            "send",
            "https://example.com/a.zip",
            "--chat",
            "-100",
            "--user",
            "7",
        ])
        .unwrap();

        assert_eq!(
            cli.mode(),
            Mode::Send(SendArgs {
                url: "https://example.com/a.zip".to_string(),
                chat: -100,
                user: 7,
                rename: None,
                thumbnail: None,
            })
        );
    }

    #[test]
    fn test_parse_send_options() {
        let cli = Cli::try_parse_from([
            "uplink",
            "send",
            "--chat",
            "1",
            "--user",
            "2",
            "--rename",
            "new name.mkv",
            "--thumbnail",
            "/t.jpg",
            "https://example.com/x",
            "--config",
            "alt.toml",
        ])
        .unwrap();

        let Mode::Send(args) = cli.mode() else {
            panic!("expected send mode");
        };
        assert_eq!(args.rename.as_deref(), Some("new name.mkv"));
        assert_eq!(args.thumbnail, Some(PathBuf::from("/t.jpg")));
        assert_eq!(args.url, "https://example.com/x");
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
    }

    #[test]
    fn test_parse_errors() {
        let parse = |args: &[&str]| Cli::try_parse_from(args.iter().copied());

        assert!(parse(&["uplink", "send", "--chat", "1", "--user", "2"]).is_err());
        assert!(parse(&["uplink", "send", "u", "--chat", "abc", "--user", "2"]).is_err());
        assert!(parse(&["uplink", "send", "u", "--chat", "1", "--user"]).is_err());
        assert!(parse(&["uplink", "send", "u", "--chat", "1", "--user", "2", "--verbose"]).is_err());
        assert!(parse(&["uplink", "send", "u", "v", "--chat", "1", "--user", "2"]).is_err());
    }

    #[test]
    fn test_help() {
        let err = Cli::try_parse_from(["uplink", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}
