use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use explorer_core::{HttpMethod, RequestSpec};

#[derive(Parser, Debug)]
#[command(name = "explorer", version, about = "Compose, send and replay HTTP requests", long_about = None)]
pub struct Cli {
    #[clap(
        long,
        env = "EXPLORER_HISTORY_URL",
        global = true,
        help = "Base URL of the history service (history is kept in memory when unset)"
    )]
    pub history_url: Option<String>,
    #[clap(short = 't', long, global = true, help = "Request timeout in seconds")]
    pub timeout: Option<u64>,
    #[clap(
        short = 'v',
        long,
        global = true,
        default_value = "false",
        help = "Print verbose message"
    )]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The history service URL; `command` names the subcommand needing it.
    pub fn require_history_url(&self, command: &str) -> Result<&str> {
        self.history_url
            .as_deref()
            .ok_or_else(|| anyhow!("{command} requires --history-url or EXPLORER_HISTORY_URL"))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one request and save it to history
    Send(SendArgs),
    /// List stored requests, newest first
    History,
    /// Load a stored request by id and send it again
    Replay {
        #[clap(help = "id of the history entry")]
        id: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    #[clap(help = "HTTP method (GET/POST/PUT/DELETE/PATCH/OPTIONS/HEAD)")]
    pub method: HttpMethod,
    #[clap(help = "URL to send the request to (https:// is assumed without a scheme)")]
    pub url: String,
    #[clap(help = "body text to send with POST, PUT or PATCH")]
    pub body: Option<String>,
    #[clap(
        short = 'H',
        long = "header",
        value_name = "KEY: VALUE",
        value_parser = parse_header,
        help = "HTTP header to send with the request"
    )]
    pub headers: Vec<(String, String)>,
}

impl SendArgs {
    pub fn into_spec(self) -> RequestSpec {
        let mut spec = RequestSpec::new(self.method, self.url);
        for (key, value) in self.headers {
            spec.add_header(key, value);
        }
        spec.body = self.body;
        spec
    }
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once(':')
        .ok_or_else(|| format!("Invalid header format: {s}"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    const TEST_URL: &str = "https://example.com/items";
    const TEST_BODY: &str = "{ \"query\": { \"match_all\": {} } }";
    const TEST_HEADER_CONTENT_TYPE: &str = "Content-Type: application/json";
    const TEST_HEADER_USER_AGENT: &str = "User-Agent: explorer/0.1.0";

    #[test]
    fn test_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }

    #[test]
    fn test_parse_send() {
        let params = vec![
            "explorer",
            "send",
            "post",
            TEST_URL,
            TEST_BODY,
            "-H",
            TEST_HEADER_CONTENT_TYPE,
            "-H",
            TEST_HEADER_USER_AGENT,
            "--history-url",
            "http://127.0.0.1:3000",
            "-t",
            "5",
        ];
        let cli = Cli::parse_from(params.iter());

        assert_eq!(cli.history_url.as_deref(), Some("http://127.0.0.1:3000"));
        assert_eq!(cli.timeout, Some(5));
        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        let spec = args.into_spec();
        assert_eq!(spec.method, HttpMethod::Post);
        assert_eq!(spec.url, TEST_URL);
        assert_eq!(spec.body.as_deref(), Some(TEST_BODY));
        let headers: Vec<(&str, &str)> = spec
            .headers
            .iter()
            .map(|h| (h.key.as_str(), h.value.as_str()))
            .collect();
        assert_eq!(
            headers,
            vec![
                ("Content-Type", "application/json"),
                ("User-Agent", "explorer/0.1.0"),
            ]
        );
    }

    #[test]
    fn test_parse_replay() {
        let cli = Cli::parse_from(["explorer", "-v", "replay", "abc-123"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Replay { id } if id == "abc-123"));
    }

    #[test]
    fn test_history_requires_history_url() {
        let mut cli = Cli::parse_from(["explorer", "history"]);
        // The variable may be set in the environment running the tests.
        cli.history_url = None;
        let err = cli.require_history_url("history").unwrap_err();
        assert_eq!(
            err.to_string(),
            "history requires --history-url or EXPLORER_HISTORY_URL"
        );

        let cli = Cli::parse_from(["explorer", "replay", "abc", "--history-url", "http://h:3000"]);
        assert_eq!(cli.require_history_url("replay").unwrap(), "http://h:3000");
    }

    #[test]
    fn test_invalid_method_is_rejected() {
        assert!(Cli::try_parse_from(["explorer", "send", "FETCH", TEST_URL]).is_err());
    }

    #[test]
    fn test_malformed_header_is_rejected() {
        let result = Cli::try_parse_from(["explorer", "send", "GET", TEST_URL, "-H", "NoColon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_header_value_may_contain_colons() {
        assert_eq!(
            parse_header("X-Time: 12:30:00").unwrap(),
            ("X-Time".to_string(), "12:30:00".to_string())
        );
    }
}
