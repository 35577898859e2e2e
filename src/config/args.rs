//! Command-line arguments shared by the `provision` and `provision_plan` binaries.

use clap::Args;

use super::Mode;

// <mode> <name> <start> <stop> <chunk> <threads> [<domain|password>]
#[derive(Args, Debug, Clone)]
pub struct ProvisionArgs {
    /// Operation to run for every record.
    #[arg(value_enum)]
    pub mode: Mode,

    /// Base name; records are named `<name><index>`.
    pub name: String,

    /// First record index.
    pub start: u32,

    /// Index one past the last record.
    pub stop: u32,

    /// Records per chunk.
    pub chunk: u32,

    /// Concurrent workers per chunk (values outside 1..=9 fall back to 5).
    pub threads: usize,

    /// DNS domain for `hostmk`, new password for `useract` and `userauth`.
    pub extra: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use clap::error::ErrorKind;

    use super::*;
    use crate::config::{ConfigError, RunConfig};
    use crate::records::JobRange;

    #[derive(Parser, Debug)]
    struct Cli {
        #[command(flatten)]
        run: ProvisionArgs,
    }

    fn parse(argv: &[&str]) -> Result<ProvisionArgs, clap::Error> {
        Cli::try_parse_from(std::iter::once("provision").chain(argv.iter().copied()))
            .map(|cli| cli.run)
    }

    #[test]
    fn test_end_to_end_arguments() {
        let args = parse(&["usermk", "testuser", "0", "5", "2", "3"]).unwrap();
        assert_eq!(args.mode, Mode::UserCreate);
        assert_eq!(args.name, "testuser");
        assert!(args.extra.is_none());

        let config = RunConfig::from_args(&args).unwrap();
        assert_eq!(config.range, JobRange { start: 0, stop: 5 });
        assert_eq!(config.chunk_size, 2);
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = parse(&["bogus", "testuser", "0", "5", "2", "3"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_negative_index_rejected() {
        let err = parse(&["usermk", "testuser", "-1", "5", "2", "3"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_non_integer_rejected() {
        let err = parse(&["usermk", "testuser", "0", "five", "2", "3"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_missing_threads_rejected() {
        let err = parse(&["usermk", "testuser", "0", "5", "2"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_host_without_domain_fails_validation() {
        let args = parse(&["hostmk", "node", "0", "5", "2", "3"]).unwrap();
        assert_eq!(
            RunConfig::from_args(&args).unwrap_err(),
            ConfigError::MissingDomain {
                mode: Mode::HostCreate
            }
        );

        let args = parse(&["hostmk", "node", "0", "5", "2", "3", "example.test"]).unwrap();
        assert_eq!(args.extra.as_deref(), Some("example.test"));
        assert!(RunConfig::from_args(&args).is_ok());
    }

    #[test]
    fn test_zero_threads_falls_back_to_default() {
        let args = parse(&["groupmk", "team", "0", "5", "2", "0"]).unwrap();
        assert_eq!(args.threads, 0);
        assert_eq!(RunConfig::from_args(&args).unwrap().workers, 5);
    }
}
