use clap::Parser;
use lego_ev3::config::cli;
use lego_ev3::utils::error::{Ev3Error, ErrorSeverity};
use lego_ev3::utils::{logger, validation::Validate};
use lego_ev3::{Brick, CliConfig, Ev3Config};

#[tokio::main]
async fn main() {
    let cli_config = CliConfig::parse();

    let config = match cli_config.resolve() {
        Ok(config) => config,
        Err(e) => {
            logger::init_cli_logger(cli_config.verbose);
            exit_with(&e);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(if cli_config.verbose {
            "debug"
        } else {
            config.log_level()
        });
    } else {
        logger::init_cli_logger(cli_config.verbose || config.log_level() == "debug");
    }

    tracing::info!("Starting ev3ctl");
    if cli_config.verbose {
        tracing::debug!("Connection config: {:?}", config.connection);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    if let Err(e) = run(&config, &cli_config.command).await {
        exit_with(&e);
    }
}

async fn run(config: &Ev3Config, command: &cli::Command) -> lego_ev3::Result<()> {
    let mut brick = Brick::connect(config).await?;

    let outcome = cli::execute(command, &mut brick).await;
    // 不論指令成功與否都要關閉連線，否則 brick 可能拒絕下一次連線
    let closed = brick.close().await;

    if let Some(output) = outcome? {
        println!("{}", output);
    }
    closed
}

fn exit_with(e: &Ev3Error) -> ! {
    tracing::error!(
        "❌ ev3ctl failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
