//! Command-line argument parsing

use clap::{Parser, Subcommand};

const EXAMPLES: &str = "\
Examples:
  # Remove the signature of a tagged image
  sigref clean gcr.io/my-project/app:v1.0

  # Signatures kept in a separate repository
  COSIGN_REPOSITORY=gcr.io/my-project/signatures sigref clean gcr.io/my-project/app:v1.0

  # Show where the signature lives without deleting it
  sigref clean --dry-run localhost:5000/app@sha256:...";

#[derive(Parser, Debug)]
#[command(name = "sigref")]
#[command(about = "Locate and remove the signature objects stored next to container images")]
#[command(version, author)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// Verbose output
    #[arg(
        long = "verbose",
        short = 'v',
        global = true,
        conflicts_with = "quiet",
        help = "Enable verbose output"
    )]
    pub verbose: bool,

    /// Quiet mode
    #[arg(
        long = "quiet",
        short = 'q',
        global = true,
        help = "Only print the signature reference and errors"
    )]
    pub quiet: bool,

    /// Skip TLS verification
    #[arg(
        long = "skip-tls",
        short = 'k',
        global = true,
        help = "Skip TLS certificate verification"
    )]
    pub skip_tls: bool,

    /// Plain HTTP
    #[arg(
        long = "insecure",
        global = true,
        help = "Use plain HTTP for every registry"
    )]
    pub insecure: bool,

    /// Timeout in seconds for network operations
    #[arg(
        long = "timeout",
        short = 't',
        global = true,
        help = "Timeout for network operations in seconds [default: 60]"
    )]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Remove the signature stored for an image
    Clean {
        /// Resolve and print the signature location without deleting it
        #[arg(long = "dry-run", short = 'n')]
        dry_run: bool,

        /// Image reference, e.g. gcr.io/project/app:v1 or app@sha256:...
        image: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_parse_clean() {
        let cli = Cli::try_parse_from(["sigref", "clean", "gcr.io/test/image:v1"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Clean {
                dry_run: false,
                image: "gcr.io/test/image:v1".to_string(),
            }
        );
        assert!(!cli.verbose);
        assert_eq!(cli.timeout, None);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sigref", "clean", "--dry-run", "-v", "-k", "--timeout", "5", "app",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.skip_tls);
        assert_eq!(cli.timeout, Some(5));
        assert!(matches!(cli.command, Command::Clean { dry_run: true, .. }));
    }

    #[test]
    fn test_wrong_argument_count() {
        let err = Cli::try_parse_from(["sigref", "clean"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = Cli::try_parse_from(["sigref", "clean", "a", "b"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_help_lists_examples() {
        let err = Cli::try_parse_from(["sigref", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(err.to_string().contains("COSIGN_REPOSITORY=gcr.io/my-project/signatures"));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let err = Cli::try_parse_from(["sigref", "-v", "-q", "clean", "app"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }
}
