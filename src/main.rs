use clap::Parser;

use credithub::cli::Cli;
use credithub::config::{get_config, init_config_from};
use credithub::runtime::modes::{self, Mode};
use credithub::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config_from(&cli.config);

    match modes::detect_mode(cli.command.as_ref()) {
        Mode::Server => {
            // guard 需存活到进程结束，否则缓冲的日志会丢失
            let _log_guard = init_logging(&get_config())?;
            modes::run_server().await
        }
        Mode::Cli => {
            let Some(command) = cli.command else {
                return Ok(());
            };
            if let Err(e) = modes::run_cli(command).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
