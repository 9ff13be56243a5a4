use clap::Parser;
use car_bidding::config::Config;
use car_bidding::web::app::run_app;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::parse();
    run_app(config).await
}
