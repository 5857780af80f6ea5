use clap::Parser;
use yolo_remote::cli::{handle_config_init, handle_config_show, Cli, Commands, ConfigCommands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Detect(args) => yolo_remote::cli::run_detect(args).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args).map(|_| true),
            ConfigCommands::Show(args) => handle_config_show(&args).map(|_| true),
        },
    };

    match result {
        Ok(true) => {}
        // Report already printed; some images failed.
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
