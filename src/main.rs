use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use git_changelog::cli::orchestration::{run_changelog_workflow, ChangelogWorkflowArgs};
use git_changelog::{config, ui};

#[derive(clap::Parser)]
#[command(
    name = "git-changelog",
    version,
    about = "Generate release notes from pull requests and commits, grouped by the release that first shipped them"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, help = "Write the changelog to this file instead of the configured one")]
    output: Option<String>,

    #[arg(long, help = "Print the changelog to stdout instead of writing a file")]
    stdout: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity (-v, -vv)")]
    verbose: u8,
}

/// RUST_LOG wins; otherwise warnings only, raised by each -v.
fn init_tracing(verbose: u8) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,git_changelog=info".to_string(),
            _ => "info,git_changelog=debug".to_string(),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    let workflow_args = ChangelogWorkflowArgs {
        output: args.output,
        stdout: args.stdout,
    };

    let result = match run_changelog_workflow(&workflow_args, &config) {
        Ok(result) => result,
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    for warning in &result.warnings {
        ui::display_boundary_warning(warning);
    }

    if args.stdout {
        print!("{}", result.markdown);
    }

    ui::display_run_report(&result.report);
    match &result.output_path {
        Some(path) => ui::display_success(&format!(
            "Wrote {} releases to {}",
            result.releases.len(),
            path.display()
        )),
        None => ui::display_status(&format!("{} releases found", result.releases.len())),
    }

    Ok(())
}
