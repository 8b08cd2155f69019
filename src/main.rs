// src/main.rs
#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match sonargate::config::Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration failed to load: {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    match sonargate::cli::run(config).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    }
}
