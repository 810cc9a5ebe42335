use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;

use greasygit::cli::{Args, Prompter};
use greasygit::{
    logging, AppError, ErrorResponse, GreasyForkClient, MetadataSource, MigrationConfig,
    MigrationPlan, MigrationSummary, Migrator,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(&args).await {
        Ok(summary) => {
            print_summary(&args, &summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(code = err.kind().code(), seq = err.seq(), "{err}");
            if args.json {
                match serde_json::to_string_pretty(&ErrorResponse::from(&err)) {
                    Ok(json) => println!("{json}"),
                    Err(e) => eprintln!("{e}"),
                }
            } else {
                eprintln!("error: {err}");
            }
            ExitCode::from(err.kind().exit_code())
        }
    }
}

async fn run(args: &Args) -> Result<MigrationSummary, AppError> {
    let mut config = MigrationConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let interactive = !args.yes && std::io::stdin().is_terminal();
    let mut prompter = Prompter::stdio(interactive);

    // parsed before any request is made
    let script = prompter.script(args.script.as_deref())?;

    let client = GreasyForkClient::new(&config)?;
    let metadata = client.fetch_metadata(script).await?;
    tracing::info!(%script, name = %metadata.name, "found script");

    let plan = MigrationPlan {
        script,
        target_dir: prompter.target_dir(args.dir.as_ref(), &metadata)?,
        script_file: prompter.script_file(args.file.as_deref(), &metadata)?,
    };

    Migrator::new(&client, &client, &config).run(&plan, &metadata).await
}

fn print_summary(args: &Args, summary: &MigrationSummary) {
    if args.json {
        match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("{e}"),
        }
        return;
    }

    println!(
        "{} versions listed, {} committed, {} already present",
        summary.listed,
        summary.committed.len(),
        summary.skipped.len()
    );
    for version in &summary.committed {
        let short = version.commit_hash.get(..7).unwrap_or(&version.commit_hash);
        println!("  {short} {} ({})", version.tag, version.seq);
    }
    if !summary.tags.is_empty() {
        println!("tags: {}", summary.tags.join(", "));
    }
    if let Some(head) = &summary.head {
        println!("HEAD {head}");
    }
}
