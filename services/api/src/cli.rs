use crate::demo::{
    run_demo, run_export, run_import, run_import_legacy, run_letter, DemoArgs, ExportArgs,
    ImportArgs, ImportLegacyArgs, LetterArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use talent_pipeline::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Talent Pipeline",
    about = "Run the candidate pipeline service or work with saved pipeline state",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Offline pipeline tooling
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PipelineCommand {
    /// Walk a sample candidate from application to hire
    Demo(DemoArgs),
    /// Write a candidate's offer letter to disk
    Letter(LetterArgs),
    /// Export the pipeline as a CSV roster
    Export(ExportArgs),
    /// Add candidates from a CSV roster
    Import(ImportArgs),
    /// Convert a browser storage dump into a pipeline snapshot
    ImportLegacy(ImportLegacyArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override PIPELINE_STATE_PATH
    #[arg(long)]
    pub(crate) state_path: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Pipeline { command } => match command {
            PipelineCommand::Demo(args) => run_demo(args),
            PipelineCommand::Letter(args) => run_letter(args),
            PipelineCommand::Export(args) => run_export(args),
            PipelineCommand::Import(args) => run_import(args),
            PipelineCommand::ImportLegacy(args) => run_import_legacy(args),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["talent-pipeline-api"]).expect("parses");
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from([
            "talent-pipeline-api",
            "serve",
            "--port",
            "8080",
            "--state-path",
            "var/pipeline.json",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.state_path, Some(PathBuf::from("var/pipeline.json")));
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }

    #[test]
    fn letter_command_reads_candidate_and_format() {
        let cli = Cli::try_parse_from([
            "talent-pipeline-api",
            "pipeline",
            "letter",
            "cand-000001",
            "--format",
            "text",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Pipeline {
                command: PipelineCommand::Letter(args),
            }) => assert_eq!(args.candidate_id, "cand-000001"),
            other => panic!("expected letter command, got {other:?}"),
        }
    }
}
