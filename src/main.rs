//! Clinassist - CLI entry point

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::Colorize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use clinassist::{
    cli::{Args, Commands, Config, QuotaCommand},
    quota::{FileQuotaStore, QuotaGovernor, QuotaSummary, UsageTier},
    ranking::{
        format_reports_for_prompt, Patient, PatientProfile, QuestionRecommender, ReportRanker,
        QUESTION_LIBRARY,
    },
};

/// Content budget per report in prompt output
const PROMPT_CHARS_PER_REPORT: usize = 600;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let config = Config::load(args.config.clone()).context("Failed to load configuration")?;

    match args.command {
        Commands::Quota { action } => run_quota(&config, action),
        Commands::RankReports {
            patient,
            limit,
            as_of,
            scores,
            prompt,
        } => run_rank_reports(&config, &patient, limit, as_of, scores, prompt),
        Commands::Recommend { patient, asked } => run_recommend(&config, &patient, &asked),
        Commands::Questions => {
            run_questions();
            Ok(())
        }
        Commands::Config => {
            let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
            println!("{}", rendered);
            Ok(())
        }
    }
}

fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.verbosity().log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_governor(config: &Config) -> QuotaGovernor {
    let store = FileQuotaStore::new(config.state_dir(), &config.quota.storage_key);
    QuotaGovernor::new(config.quota.clone(), Box::new(store))
}

fn run_quota(config: &Config, action: QuotaCommand) -> Result<()> {
    let governor = open_governor(config);

    match action {
        QuotaCommand::Status => print_summary(&governor.get_summary()),
        QuotaCommand::Check => {
            let admission = governor.check_before_call();
            if admission.allowed {
                println!("{}", "✓ Call allowed".green().bold());
            } else {
                println!("{}", "✗ Call refused".red().bold());
            }
            if let Some(reason) = admission.reason {
                println!("  {}", reason);
            }
            if let Some(warning) = admission.warning {
                println!("  {} {}", "⚠".yellow(), warning);
            }
        }
        QuotaCommand::Reset => {
            governor.try_reset()?;
            println!("{}", "Quota usage cleared.".green());
        }
        QuotaCommand::SetLimit { limit } => {
            governor.set_daily_limit(limit)?;
            println!("Daily limit set to {}.", limit.to_string().bold());
        }
    }

    Ok(())
}

fn print_summary(summary: &QuotaSummary) {
    let tier = match summary.tier {
        UsageTier::Normal => summary.tier.label().green(),
        UsageTier::Elevated => summary.tier.label().yellow(),
        UsageTier::Critical | UsageTier::Exhausted => summary.tier.label().red(),
    };

    println!("\n📊 API Quota");
    println!("─────────────────────────────────────");
    println!("Calls used:        {}/{} ({}%)", summary.calls_used, summary.calls_limit, summary.percentage);
    println!("Calls remaining:   {}", summary.calls_remaining);
    println!("Tokens used:       {}", summary.tokens_used);
    println!("Usage level:       {}", tier);
    println!("Resets at:         {}", summary.reset_time_label());
    if summary.on_pace_to_exceed {
        println!("{}", "On pace to exceed today's quota".yellow());
    }
    println!();
}

fn load_patient(path: &Path) -> Result<Patient> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read patient file {}", path.display()))?;
    let patient = Patient::from_json(&json)
        .with_context(|| format!("Failed to parse patient file {}", path.display()))?;
    Ok(patient)
}

fn run_rank_reports(
    config: &Config,
    patient_path: &Path,
    limit: Option<usize>,
    as_of: Option<NaiveDate>,
    show_scores: bool,
    as_prompt: bool,
) -> Result<()> {
    let patient = load_patient(patient_path)?;
    let now = as_of.unwrap_or_else(|| Local::now().date_naive());
    let limit = limit.unwrap_or(config.ranking.max_reports);

    let ranked = ReportRanker::with_limit(limit).rank(&patient, now);
    let selected: Vec<_> = ranked.iter().take(limit).collect();

    if as_prompt {
        let documents: Vec<_> = selected.iter().map(|r| r.document).collect();
        println!("{}", format_reports_for_prompt(&documents, PROMPT_CHARS_PER_REPORT));
        return Ok(());
    }

    println!(
        "{} of {} reports for {} (as of {})",
        selected.len(),
        patient.reports.len(),
        patient.name.bold(),
        now
    );
    for (i, report) in selected.iter().enumerate() {
        let doc = report.document;
        print!("{:>2}. [{}] {} {}", i + 1, doc.report_type, doc.date, doc.title.bold());
        if show_scores {
            print!(
                "  {}",
                format!(
                    "score {:.2} = recency {:.2} + acuity {:.0} + context {:.0}",
                    report.score.total(),
                    report.score.recency,
                    report.score.acuity,
                    report.score.context
                )
                .dimmed()
            );
        }
        println!();
    }

    Ok(())
}

fn run_recommend(config: &Config, patient_path: &Path, asked: &[String]) -> Result<()> {
    let patient = load_patient(patient_path)?;
    let profile = PatientProfile::from_patient(&patient);

    let conditions: Vec<_> = profile.conditions.iter().map(|c| c.label()).collect();
    if conditions.is_empty() {
        println!("Conditions: {}", "none detected".dimmed());
    } else {
        println!("Conditions: {}", conditions.join(", "));
    }

    let recommender = QuestionRecommender::with_limit(config.ranking.max_questions);
    for (i, question) in recommender
        .recommend(QUESTION_LIBRARY, &profile, asked)
        .into_iter()
        .enumerate()
    {
        println!("{:>2}. {}", i + 1, question);
    }

    Ok(())
}

fn run_questions() {
    for question in QUESTION_LIBRARY {
        println!("{:<24} {}", question.category.label().cyan(), question.text);
    }
}
