use crate::infra::{parse_date, persistence_config};
use chrono::{Duration, Local, NaiveDate};
use clap::{Args, ValueEnum};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use talent_pipeline::config::AppConfig;
use talent_pipeline::error::AppError;
use talent_pipeline::workflows::pipeline::{
    CandidateId, JsonFileSnapshotStore, LegacyTalentState, LetterFormat, MemorySnapshotStore,
    NewCandidate, OfferDraft, PersistenceError, PipelineEngine, PipelineSnapshot, SnapshotStore,
    Stage,
};
use talent_pipeline::workflows::roster::{export_roster, RosterImporter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum LetterFormatArg {
    #[default]
    Html,
    #[value(alias = "txt")]
    Text,
}

impl From<LetterFormatArg> for LetterFormat {
    fn from(value: LetterFormatArg) -> Self {
        match value {
            LetterFormatArg::Html => LetterFormat::Html,
            LetterFormatArg::Text => LetterFormat::Text,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Offer start date (YYYY-MM-DD). Defaults to 30 days from today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
    /// Letter format printed at the end of the demo
    #[arg(long, value_enum, default_value_t = LetterFormatArg::Text)]
    pub(crate) format: LetterFormatArg,
    /// Skip printing the offer letter
    #[arg(long)]
    pub(crate) skip_letter: bool,
}

#[derive(Args, Debug)]
pub(crate) struct LetterArgs {
    /// Candidate id, e.g. cand-000001
    pub(crate) candidate_id: String,
    #[arg(long, value_enum, default_value_t = LetterFormatArg::Html)]
    pub(crate) format: LetterFormatArg,
    /// Directory the letter is written into (defaults to the working directory)
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
    /// Override PIPELINE_STATE_PATH
    #[arg(long)]
    pub(crate) state_path: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// CSV destination; stdout when omitted
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Override PIPELINE_STATE_PATH
    #[arg(long)]
    pub(crate) state_path: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Roster CSV with Name, Job Title, Stage, Notes, Skills, Location columns
    pub(crate) roster: PathBuf,
    /// Override PIPELINE_STATE_PATH
    #[arg(long)]
    pub(crate) state_path: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ImportLegacyArgs {
    /// JSON object of browser storage keys to JSON strings
    pub(crate) dump: PathBuf,
    /// Replace a state file that already holds candidates
    #[arg(long)]
    pub(crate) force: bool,
    /// Override PIPELINE_STATE_PATH
    #[arg(long)]
    pub(crate) state_path: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        start_date,
        format,
        skip_letter,
    } = args;
    let start_date =
        start_date.unwrap_or_else(|| Local::now().date_naive() + Duration::days(30));

    println!("Talent pipeline demo");
    let snapshots = Arc::new(MemorySnapshotStore::default());
    let mut engine = PipelineEngine::new(snapshots.clone());

    let jane = engine
        .add_candidate(
            NewCandidate::new("Jane Doe", "Frontend Developer")
                .with_skills(["React", "TypeScript"])
                .with_location("Lagos"),
        )?
        .into_value();
    let sam = engine
        .add_candidate(
            NewCandidate::new("Sam Okafor", "Data Analyst")
                .with_skills(["SQL", "Python"])
                .with_location("Nairobi"),
        )?
        .into_value();
    engine.add_candidate(
        NewCandidate::new("Ava Chen", "Backend Developer")
            .with_stage(Stage::Screening)
            .with_notes("Referred by engineering"),
    )?;
    print_stage_counts(&engine);

    println!("\nAdvancing {} ({})", jane.name, jane.id);
    for stage in [Stage::Screening, Stage::Interview, Stage::Offer] {
        engine.move_stage(&jane.id, stage)?;
        println!("- moved to {stage}");
    }

    let draft = OfferDraft::new(
        "Frontend Developer",
        "$80,000",
        start_date.format("%Y-%m-%d").to_string(),
    );
    let offer = engine.send_offer(&jane.id, &draft)?.into_value();
    println!(
        "- offer {} for {} at {}, starting {}",
        offer.status, offer.details.position, offer.details.salary, offer.details.start_date
    );
    engine.mark_accepted(&jane.id)?;
    engine.move_stage(&jane.id, Stage::Hired)?;
    println!("- offer accepted, candidate hired");

    let rejected = engine.reject_candidate(&sam.id)?.into_value();
    println!("\n{} moved to {}", rejected.name, rejected.stage);
    print_stage_counts(&engine);
    println!("Snapshots written: {}", snapshots.save_count());

    if skip_letter {
        return Ok(());
    }

    let export = engine.export_offer_letter(&jane.id, format.into())?;
    println!("\n--- {} ({}) ---", export.filename, export.content_type);
    println!("{}", String::from_utf8_lossy(&export.body));
    Ok(())
}

pub(crate) fn run_letter(args: LetterArgs) -> Result<(), AppError> {
    let engine = open_pipeline(args.state_path)?;
    let export =
        engine.export_offer_letter(&CandidateId(args.candidate_id), args.format.into())?;

    let destination = args
        .output_dir
        .unwrap_or_else(|| PathBuf::from("."))
        .join(&export.filename);
    std::fs::write(&destination, &export.body)?;
    println!("Wrote {}", destination.display());
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let engine = open_pipeline(args.state_path)?;

    match args.output {
        Some(path) => {
            export_roster(engine.store(), File::create(&path)?)?;
            println!(
                "Exported {} candidates to {}",
                engine.store().len(),
                path.display()
            );
        }
        None => {
            let stdout = std::io::stdout();
            export_roster(engine.store(), stdout.lock())?;
        }
    }
    Ok(())
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let mut engine = open_pipeline(args.state_path)?;
    let rows = RosterImporter::from_path(&args.roster)?;

    let committed = engine.import_candidates(rows)?;
    if let Some(err) = committed.warning {
        return Err(err.into());
    }

    println!(
        "Imported {} candidates from {}",
        committed.value.len(),
        args.roster.display()
    );
    print_stage_counts(&engine);
    Ok(())
}

pub(crate) fn run_import_legacy(args: ImportLegacyArgs) -> Result<(), AppError> {
    let files = open_state(args.state_path)?;
    let existing = PipelineEngine::restore(files.clone())?;
    if !existing.store().is_empty() && !args.force {
        println!(
            "State already holds {} candidates; pass --force to replace it",
            existing.store().len()
        );
        return Ok(());
    }

    let raw = std::fs::read_to_string(&args.dump)?;
    let state: LegacyTalentState =
        serde_json::from_str(&raw).map_err(PersistenceError::from)?;
    let snapshot = PipelineSnapshot::capture(&state.into_store()?);
    files.save(&snapshot)?;

    println!(
        "Converted {} candidates from {} into {}",
        snapshot.candidates.len(),
        args.dump.display(),
        files.path().display()
    );
    Ok(())
}

fn open_state(state_path: Option<PathBuf>) -> Result<Arc<JsonFileSnapshotStore>, AppError> {
    let config = AppConfig::load()?;
    let persistence = persistence_config(config.persistence, state_path);
    let path = persistence.require_state_path()?;
    Ok(Arc::new(JsonFileSnapshotStore::new(path)))
}

fn open_pipeline(
    state_path: Option<PathBuf>,
) -> Result<PipelineEngine<JsonFileSnapshotStore>, AppError> {
    Ok(PipelineEngine::restore(open_state(state_path)?)?)
}

fn print_stage_counts<S: SnapshotStore + 'static>(engine: &PipelineEngine<S>) {
    println!("Stage counts:");
    for entry in engine.stage_counts() {
        println!("  - {}: {}", entry.stage_label, entry.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_format_argument_maps_to_export_format() {
        assert_eq!(LetterFormat::from(LetterFormatArg::Html), LetterFormat::Html);
        assert_eq!(LetterFormat::from(LetterFormatArg::Text), LetterFormat::Text);
        assert_eq!(
            LetterFormatArg::from_str("txt", true).expect("alias accepted"),
            LetterFormatArg::Text
        );
    }

    #[test]
    fn demo_runs_without_state_file() {
        let args = DemoArgs {
            start_date: Some(NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date")),
            format: LetterFormatArg::Text,
            skip_letter: false,
        };

        run_demo(args).expect("demo completes");
    }
}
