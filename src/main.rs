use clap::Parser;
use lens::cli::{
    handle_analyze, handle_config_check, handle_config_init, handle_health, load_config, Cli,
    Commands, ConfigCommands,
};
use lens::logging::init_tracing;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Analyze(args) => {
            let config = load_config(args.config.as_deref())?;
            init_logging(&config);
            let output = handle_analyze(&args, config).await?;
            println!("{}", output);
        }
        Commands::Health(args) => {
            let config = load_config(args.config.as_deref())?;
            init_logging(&config);
            let output = handle_health(&args, config).await?;
            println!("{}", output);
        }
        Commands::Config(ConfigCommands::Init(args)) => handle_config_init(&args)?,
        Commands::Config(ConfigCommands::Check(args)) => {
            let config = load_config(args.config.as_deref())?;
            let output = handle_config_check(&args, &config)?;
            println!("{}", output);
        }
    }
    Ok(())
}

fn init_logging(config: &lens::config::LensConfig) {
    if let Err(e) = init_tracing(&config.logging) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
}
