mod cmd;
mod output;

use clap::{Parser, Subcommand};
use herald_core::HeraldError;

#[derive(Parser)]
#[command(
    name = "herald",
    about = "Announce deployments: update tickets, post the chat message, record the release",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Update the tickets in a commit range and send the deployment message
    Send {
        /// The deployment environment that was deployed to, e.g. 'staging'
        environment: String,

        /// The commit range that was deployed, e.g. 'v1.2.0..v1.3.0'
        commit_range: String,

        /// Chat handles to mention in addition to the configured ones
        mentions: Vec<String>,

        /// Skip confirmation and send the message via the configured chat system
        #[arg(short = 'm', long)]
        send_message: bool,

        /// Skip confirmation and copy the message to the clipboard
        #[arg(short = 'c', long)]
        copy_message: bool,

        /// Never prompt; without --send-message this takes the clipboard path
        #[arg(short = 'n', long)]
        no_interaction: bool,
    },

    /// Show project information and the tickets in a commit range
    Tickets {
        /// The commit range to inspect, e.g. 'v1.2.0..v1.3.0'
        commit_range: String,

        /// Output as JSON
        #[arg(long, short = 'j')]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Send {
            environment,
            commit_range,
            mentions,
            send_message,
            copy_message,
            no_interaction,
        } => cmd::send::run(
            &environment,
            &commit_range,
            mentions,
            send_message,
            copy_message,
            no_interaction,
        ),
        Commands::Tickets { commit_range, json } => cmd::tickets::run(&commit_range, json),
    };

    if let Err(e) = result {
        // A declined confirmation is a deliberate stop: non-zero exit,
        // no diagnostic.
        let aborted = e
            .downcast_ref::<HeraldError>()
            .is_some_and(HeraldError::is_user_abort);
        if !aborted {
            eprintln!("error: {e:#}");
        }
        std::process::exit(1);
    }
}
