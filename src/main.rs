use clap::Parser;

use buffer_service::geocode::nominatim;
use buffer_service::server::server::start_server;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,

    #[arg(long, default_value = nominatim::DEFAULT_ENDPOINT)]
    geocoder_endpoint: String,

    #[arg(long, default_value = nominatim::DEFAULT_USER_AGENT)]
    geocoder_user_agent: String,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let geocoder = nominatim::Client::new(&args.geocoder_endpoint, &args.geocoder_user_agent);
    start_server(&args.host, args.port, geocoder).await
}
