use crate::output::print_json;
use anyhow::Context;
use herald_core::config::Config;
use herald_core::context::RunContext;
use herald_core::extract;

/// `herald tickets` — show project information and the tickets referenced in
/// a commit range, without touching anything.
pub fn run(commit_range: &str, json: bool) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("cannot read the current working directory")?;
    let config = Config::load(&cwd).context("failed to load configuration")?;

    let ctx = RunContext::from_process(false, false, true, Vec::new());
    let vcs = config.version_control();
    let tickets = config
        .ticket_system(&ctx)
        .context("failed to connect the ticket system")?;

    if !json {
        render_project_info(&config);
        println!("Extracting tickets from commit range {commit_range}");
    }

    let infos = extract::extract_tickets(&vcs, &tickets, commit_range)?;

    if json {
        print_json(&serde_json::json!({
            "project": config.name,
            "commit_range": commit_range,
            "tickets": infos,
        }))?;
    } else {
        println!();
        println!("Found {} tickets:", infos.len());
        for info in &infos {
            println!("  · {}: {} ({})", info.id, info.title, info.url);
        }
    }

    Ok(())
}

fn render_project_info(config: &Config) {
    let environments = config.environment_table();

    println!("Project: {}", config.name);
    println!("Environments: {}", environments.all().join(", "));

    for environment in environments.all() {
        let urls = config.urls_for(environment);
        if urls.is_empty() {
            continue;
        }
        println!();
        println!("{environment} URL(s):");
        for url in urls {
            println!("  · {url}");
        }
    }
    println!();
}
