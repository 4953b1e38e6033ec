use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;

use agora_core::{CoreConfig, SocialCore, TomlConfig};

use crate::cli::*;
use crate::simulate::{self, SimulationPlan, SimulationReport};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Init(args) => cmd_init(args),
        Command::ConfigCheck(args) => cmd_config_check(args, cli.format),
        Command::Simulate(args) => cmd_simulate(args, cli.format),
    }
}

fn cmd_init(args: InitArgs) -> anyhow::Result<()> {
    if args.path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", args.path.display());
    }
    TomlConfig::create_default(&args.path)
        .with_context(|| format!("writing {}", args.path.display()))?;
    println!(
        "{} Wrote default config to {}",
        "✓".green().bold(),
        args.path.display().to_string().bold()
    );
    Ok(())
}

fn cmd_config_check(args: ConfigCheckArgs, format: OutputFormat) -> anyhow::Result<()> {
    let provider = TomlConfig::load(&args.path)
        .with_context(|| format!("loading {}", args.path.display()))?;
    let config = CoreConfig::from_provider(&provider)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => {
            println!("{} {} is valid", "✓".green().bold(), args.path.display());
            println!("  Next post id:       {}", config.next_post_id.to_string().yellow());
            println!("  Max title length:   {}", config.limits.max_title_len);
            println!("  Max content length: {}", config.limits.max_content_len);
        }
    }
    Ok(())
}

fn cmd_simulate(args: SimulateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut provider = match &args.config {
        Some(path) => Some(
            TomlConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        ),
        None => None,
    };
    let core = match &provider {
        Some(p) => SocialCore::open(p)?,
        None => SocialCore::new(CoreConfig::default()),
    };
    let core = Arc::new(core);

    let plan = SimulationPlan {
        users: args.users,
        threads: args.threads,
        ops_per_thread: args.ops,
        follow_ratio: args.follow_ratio,
        seed: args.seed,
    };
    let report = simulate::run(Arc::clone(&core), plan)?;

    if let Some(p) = provider.as_mut() {
        core.close(p)?;
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report, &core),
    }
    Ok(())
}

fn print_report(report: &SimulationReport, core: &SocialCore) {
    let plan = &report.plan;
    println!(
        "{} Simulated {} users on {} threads ({} ops each) in {} ms",
        "✓".green().bold(),
        plan.users,
        plan.threads,
        plan.ops_per_thread,
        report.elapsed_ms
    );
    println!("  Follow edges: {}", report.follows);

    println!("\n{}", "Accepted".green().bold());
    for (kind, count) in &report.accepted {
        println!("  {kind:<16} {count}");
    }
    println!("\n{}", "Rejected".red().bold());
    if report.rejected.is_empty() {
        println!("  none");
    }
    for (code, count) in &report.rejected {
        println!("  {code:<20} {count}");
    }

    println!(
        "\nPosts live: {}  Next post id: {}  Wallets: {}",
        report.counts.posts.to_string().bold(),
        report.next_post_id.to_string().yellow(),
        report.counts.wallets
    );
    if let Some(top) = core
        .wallet_summaries()
        .into_iter()
        .max_by(|a, b| a.balance.total_cmp(&b.balance))
    {
        println!("Top earner: {} ({:.1})", top.owner.as_str().cyan(), top.balance);
    }
}
