//! Command-line argument parsing for Clinassist
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Clinassist - quota governance and clinical relevance ranking
#[derive(Parser, Debug)]
#[command(name = "clinassist")]
#[command(version)]
#[command(about = "Quota governance and clinical relevance ranking for AI-assisted clinical dashboards", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect or manage the daily API quota
    Quota {
        #[command(subcommand)]
        action: QuotaCommand,
    },

    /// Rank a patient's reports by relevance
    RankReports {
        /// Patient JSON file
        #[arg(short, long)]
        patient: PathBuf,

        /// Number of reports to keep (config default if omitted)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Reference date, YYYY-MM-DD (today if omitted)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Show the score breakdown
        #[arg(long)]
        scores: bool,

        /// Print the selected reports as a prompt block
        #[arg(long)]
        prompt: bool,
    },

    /// Recommend next questions for a patient
    Recommend {
        /// Patient JSON file
        #[arg(short, long)]
        patient: PathBuf,

        /// Question already asked (repeatable)
        #[arg(short, long)]
        asked: Vec<String>,
    },

    /// List the built-in question library
    Questions,

    /// Display current configuration
    Config,
}

/// Quota subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum QuotaCommand {
    /// Show today's usage
    Status,
    /// Run the pre-flight admission check
    Check,
    /// Clear all recorded usage
    Reset,
    /// Change the daily call limit
    SetLimit {
        limit: u32,
    },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Default tracing filter when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "clinassist=warn",
            Verbosity::Normal => "clinassist=info",
            Verbosity::Verbose => "clinassist=debug",
            Verbosity::VeryVerbose => "clinassist=trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["clinassist", "-q", "questions"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["clinassist", "questions"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["clinassist", "-v", "questions"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["clinassist", "questions", "-vv"]).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_quota_set_limit() {
        let args = parse(&["clinassist", "quota", "set-limit", "250"]);
        match args.command {
            Commands::Quota { action } => assert_eq!(action, QuotaCommand::SetLimit { limit: 250 }),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rank_reports_args() {
        let args = parse(&[
            "clinassist",
            "rank-reports",
            "--patient",
            "p.json",
            "--limit",
            "3",
            "--as-of",
            "2026-03-01",
            "--scores",
        ]);
        match args.command {
            Commands::RankReports { patient, limit, as_of, scores, prompt } => {
                assert_eq!(patient, PathBuf::from("p.json"));
                assert_eq!(limit, Some(3));
                assert_eq!(as_of, NaiveDate::from_ymd_opt(2026, 3, 1));
                assert!(scores);
                assert!(!prompt);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_recommend_repeated_asked() {
        let args = parse(&["clinassist", "recommend", "-p", "p.json", "-a", "one", "-a", "two"]);
        match args.command {
            Commands::Recommend { asked, .. } => assert_eq!(asked, vec!["one", "two"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(Args::try_parse_from(["clinassist", "rank-reports", "-p", "x", "--as-of", "03/01/2026"]).is_err());
    }

    #[test]
    fn test_verbosity_filters() {
        assert_eq!(Verbosity::Quiet.log_filter(), "clinassist=warn");
        assert_eq!(Verbosity::Verbose.as_str(), "verbose");
    }
}
