use anyhow::Context;
use herald_core::config::Config;
use herald_core::context::RunContext;
use herald_core::prompt::StdinPrompter;
use herald_core::runner;

pub fn run(
    environment: &str,
    commit_range: &str,
    mentions: Vec<String>,
    send_message: bool,
    copy_message: bool,
    no_interaction: bool,
) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("cannot read the current working directory")?;
    let config = Config::load(&cwd).context("failed to load configuration")?;

    // Resolve early so a typo'd environment fails before any network traffic.
    let environments = config.environment_table();
    environments.resolve_or_err(environment)?;

    let ctx = RunContext::from_process(send_message, copy_message, no_interaction, mentions);

    let vcs = config.version_control();
    let tickets = config
        .ticket_system(&ctx)
        .context("failed to connect the ticket system")?;
    let chat = config
        .chat_system(&ctx)
        .context("failed to connect the chat system")?;
    let mut prompter = StdinPrompter;

    println!("Sending deployment message for `{}`", config.name);
    println!();

    runner::run(
        &config,
        &ctx,
        &vcs,
        &tickets,
        &chat,
        &mut prompter,
        environment,
        commit_range,
    )?;

    println!();
    println!("Done.");
    Ok(())
}
