use clap::Parser;
use timetable_generator::config::Config;
use timetable_generator::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
    env_logger::Builder::from_env(env).init();

    server::run_server(&config).await
}
