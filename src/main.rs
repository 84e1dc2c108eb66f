//! `weekly-report`: calendar meetings, meeting notes and email for tracked
//! companies in, one summarized weekly report out.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::Parser;

use weekly_report_lib::entity::EntityStore;
use weekly_report_lib::error::ReportError;
use weekly_report_lib::google_api::calendar::CalendarMeetings;
use weekly_report_lib::google_api::gmail::GmailCorrespondence;
use weekly_report_lib::google_api::GoogleSession;
use weekly_report_lib::intelligence::{is_error_summary, OllamaClient, Summarizer};
use weekly_report_lib::interview::Interview;
use weekly_report_lib::notes::{build_note_source, NoteSource};
use weekly_report_lib::state::{load_settings, ConfigPaths};
use weekly_report_lib::types::{EntityClass, Settings};
use weekly_report_lib::workflow::commit::{commit_changes, commit_message};
use weekly_report_lib::workflow::{
    deliver, GoogleDocsPublisher, MarkdownPublisher, MeetingSource, PrefetchedMeetings, WeeklyRun,
};

#[derive(Parser, Debug)]
#[command(name = "weekly-report", version, about = "Generate weekly deal and partner report")]
struct Cli {
    /// Skip the deal review interview
    #[arg(long)]
    skip_interview: bool,

    /// Write a Markdown report instead of a Google Doc
    #[arg(long)]
    markdown_only: bool,

    /// Skip the git commit after completion
    #[arg(long)]
    no_commit: bool,

    /// Check config and connections without generating a report
    #[arg(long)]
    dry_run: bool,

    /// Config directory (default: $WEEKLY_REPORT_HOME or ~/.weekly-report)
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("\nERROR: {}\n{}", e, e.recovery_suggestion());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<(), ReportError> {
    let paths = ConfigPaths::resolve(cli.config_dir.as_deref())?;
    let settings = load_settings(&paths)?;
    let today = Local::now().date_naive();
    log::info!("Weekly deal & partner report, {} (config: {})", today, paths.root().display());

    let (google, summarizer) = check_prerequisites(&paths, &settings)?;

    if cli.dry_run {
        return dry_run(&paths, &settings, google, &summarizer, today);
    }

    let mut entities = EntityStore::load(&paths.active_deals(), &paths.partners())?;
    let calendar = CalendarMeetings::new(google.clone(), settings.internal_domain.clone());
    let meetings = calendar.fetch_meetings(settings.lookback_days)?;

    if cli.skip_interview {
        log::info!("Skipping interview (--skip-interview)");
    } else {
        let stdin = io::stdin();
        Interview::new(stdin.lock(), io::stdout()).run(
            &mut entities,
            &meetings,
            &settings.internal_domain,
            &paths.active_deals(),
            today,
        )?;
    }

    if entities.is_empty() {
        log::info!("No deals or partners configured. Add some to the config files and try again.");
        return Ok(());
    }
    log::info!(
        "Tracking: {} deals, {} agencies, {} tech partners",
        entities.count(EntityClass::Deal),
        entities.count(EntityClass::AgencyPartner),
        entities.count(EntityClass::TechPartner)
    );

    let meetings = PrefetchedMeetings(meetings);
    let notes = build_note_source(&settings, &paths, Some(google.clone()), today);
    let mail = GmailCorrespondence::new(google.clone()).with_today(today);
    let outcome = WeeklyRun {
        settings: &settings,
        entities: &entities,
        meetings: &meetings,
        notes: &*notes,
        correspondence: &mail,
        summarizer: &summarizer,
    }
    .run(today)?;
    log::debug!("Run stats: {:?}", outcome.stats);

    let markdown = MarkdownPublisher::new(paths.reports_dir(&settings));
    let delivered = if cli.markdown_only {
        deliver(&outcome.report, &markdown, None)?
    } else {
        let docs = GoogleDocsPublisher::new(google, &settings.output.folder_id);
        deliver(&outcome.report, &docs, Some(&markdown))?
    };
    let Some(delivered) = delivered else {
        return Ok(());
    };
    println!("Report ({}): {}", delivered.publisher, delivered.location);

    if cli.no_commit {
        log::info!("Skipping git commit (--no-commit)");
    } else if let Err(e) = commit_changes(paths.root(), &commit_message(today)) {
        log::warn!("{}", e);
    }

    log::info!("Complete.");
    Ok(())
}

/// Token present and loadable, Ollama running with the configured model.
fn check_prerequisites(
    paths: &ConfigPaths,
    settings: &Settings,
) -> Result<(Arc<GoogleSession>, OllamaClient), ReportError> {
    log::info!("Checking prerequisites...");

    let token_path = paths.google_token();
    if !token_path.exists() {
        return Err(ReportError::MissingCredentials(token_path));
    }
    let session = GoogleSession::open(&token_path)?;
    log::info!("  Google Auth: OK");

    let ollama = OllamaClient::from_config(&settings.ollama);
    let model = ollama
        .verify_setup()
        .map_err(|e| ReportError::SummarizerUnavailable(e.to_string()))?;
    log::info!("  Ollama: OK ({})", model);

    if settings.internal_domain.is_empty() {
        log::warn!("internalDomain is not set; internal-only meetings will not be filtered");
    }

    Ok((Arc::new(session), ollama.with_model(model)))
}

fn dry_run(
    paths: &ConfigPaths,
    settings: &Settings,
    google: Arc<GoogleSession>,
    summarizer: &OllamaClient,
    today: NaiveDate,
) -> Result<(), ReportError> {
    println!("\nDRY RUN MODE\n");

    let notes = build_note_source(settings, paths, Some(google), today);
    match notes.scan(settings.lookback_days) {
        Ok(found) => println!("  {} notes found: {}", notes.name(), found.len()),
        Err(e) => println!("  {} notes: ERROR - {}", notes.name(), e),
    }

    let entities = EntityStore::load(&paths.active_deals(), &paths.partners())?;
    println!("  Active deals: {}", entities.count(EntityClass::Deal));
    for deal in entities.of_class(EntityClass::Deal) {
        println!("    - {} ({})", deal.name, deal.domain);
    }
    println!("  Agency partners: {}", entities.count(EntityClass::AgencyPartner));
    println!("  Tech partners: {}", entities.count(EntityClass::TechPartner));

    println!("\n  Testing Ollama synthesis ({})...", summarizer.model());
    let result = summarizer.synthesize(
        "Test context: Meeting scheduled for next week.",
        "Test Company",
        EntityClass::Deal,
    );
    if is_error_summary(&result) {
        println!("    FAILED: {}", result);
    } else {
        println!("    OK (received {} chars)", result.len());
    }

    println!("\nDRY RUN COMPLETE - No changes made");
    Ok(())
}
