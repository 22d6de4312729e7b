//! Command-line and environment configuration.

use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand, ValueEnum};
use github::{GithubConfig, DEFAULT_API_URL};
use releases::RepositoryId;

/// Relay a GitHub repository's releases over HTTP, or verify a running relay.
#[derive(Debug, Parser)]
#[command(name = "release-relay", version, about)]
pub struct Cli {
    /// Log output format.
    #[arg(
        long,
        global = true,
        env = "RELEASE_RELAY_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve `/github/releases-lowlevel` and `/github/releases`.
    Serve(ServeArgs),
    /// Fetch releases from a running relay and check every name.
    Verify(VerifyArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "RELEASE_RELAY_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Repository whose releases are relayed, as `owner/repo`.
    #[arg(
        long,
        env = "RELEASE_RELAY_REPOSITORY",
        default_value = "micronaut-projects/micronaut-core"
    )]
    pub repository: RepositoryId,

    /// Base URL of the GitHub REST API.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub github_api_url: String,

    /// Token sent as `Authorization: Bearer`; raises GitHub's rate limit.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Releases requested per upstream page (1-100).
    #[arg(long, default_value_t = 30)]
    pub per_page: u32,

    /// Maximum upstream pages walked by the streaming endpoint.
    #[arg(long, default_value_t = 10)]
    pub max_pages: u32,
}

impl ServeArgs {
    /// Builds the upstream client configuration.
    pub fn github_config(&self) -> GithubConfig {
        GithubConfig {
            api_url: self.github_api_url.clone(),
            token: self.github_token.clone(),
            per_page: self.per_page,
            max_pages: self.max_pages,
            ..GithubConfig::default()
        }
    }
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Base URL of the relay to check.
    #[arg(long, env = "RELEASE_RELAY_URL", default_value = "http://127.0.0.1:8080")]
    pub server: String,

    /// Which endpoint(s) to check.
    #[arg(long, value_enum, default_value_t = VerifyMode::Both)]
    pub mode: VerifyMode,

    /// Pattern every release name must match in full. Defaults to the
    /// Micronaut release pattern.
    #[arg(long)]
    pub pattern: Option<String>,

    /// Accept an empty release list from the blocking endpoint.
    #[arg(long)]
    pub allow_empty: bool,

    /// Report format written to stdout.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub output: ReportFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VerifyMode {
    Blocking,
    Streaming,
    Both,
}

impl VerifyMode {
    pub fn includes_blocking(self) -> bool {
        matches!(self, Self::Blocking | Self::Both)
    }

    pub fn includes_streaming(self) -> bool {
        matches!(self, Self::Streaming | Self::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_serve_flags() {
        let cli = Cli::try_parse_from([
            "release-relay",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--repository",
            "octo/cat",
            "--github-api-url",
            "http://localhost:1234",
            "--per-page",
            "50",
            "--max-pages",
            "2",
        ])
        .unwrap();

        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.bind, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(args.repository.as_str(), "octo/cat");

        let config = args.github_config();
        assert_eq!(config.api_url, "http://localhost:1234");
        assert_eq!(config.per_page, 50);
        assert_eq!(config.max_pages, 2);
    }

    #[test]
    fn rejects_malformed_repository() {
        let err = Cli::try_parse_from(["release-relay", "serve", "--repository", "octocat"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_verify_flags_and_global_log_format() {
        let cli = Cli::try_parse_from([
            "release-relay",
            "verify",
            "--server",
            "http://relay:8080",
            "--mode",
            "streaming",
            "--output",
            "json",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        let Command::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(args.server, "http://relay:8080");
        assert!(!args.mode.includes_blocking());
        assert!(args.mode.includes_streaming());
        assert_eq!(args.output, ReportFormat::Json);
        assert!(!args.allow_empty);
    }

    #[test]
    fn both_mode_covers_both_endpoints() {
        assert!(VerifyMode::Both.includes_blocking());
        assert!(VerifyMode::Both.includes_streaming());
        assert!(!VerifyMode::Blocking.includes_streaming());
    }
}
