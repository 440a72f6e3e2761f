mod cli;

use dvpackager::packager::Packager;
use dvp_av::{SystemRunner, ToolRegistry};
use dvp_core::config::Config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, PackageArgs, ToolPathArgs};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            // Verbose mode also echoes every external command line
            "dvpackager=trace,dvp_av=debug,dvp_core=debug".to_string()
        } else {
            "dvpackager=info,dvp_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Package(args) => package(&args, cli.config.as_deref()),
        Commands::CheckTools { json, tools } => check_tools(&tools, cli.config.as_deref(), json),
        Commands::Version => {
            println!("dvpackager {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn package(args: &PackageArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = Config::load_or_default(config_path)?;
    args.apply(&mut config);

    let tools = ToolRegistry::discover(&config.tools);
    let runner = SystemRunner;
    // Configuration problems surface here, before any input is opened.
    let packager = Packager::new(&config, &tools, &runner)?;

    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(packager.run(&args.inputs));

    println!();
    println!("{summary}");
    Ok(())
}

fn check_tools(overrides: &ToolPathArgs, config_path: Option<&Path>, json: bool) -> Result<()> {
    let mut config = Config::load_or_default(config_path)?;
    overrides.apply(&mut config);

    let tools = ToolRegistry::discover(&config.tools).check_all();

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    println!("Checking external tools...\n");
    let mut all_ok = true;
    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({version})");
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All tools are available!");
    } else {
        println!("Some tools are missing. dvrescue and ffmpeg are required; mediainfo enables sync checks.");
    }

    Ok(())
}
