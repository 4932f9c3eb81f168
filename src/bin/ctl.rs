use clap::Parser;

use buffer_service::layers::coverage::Coverage;
use buffer_service::render::{geojson, html};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    feed_path: String,

    #[arg(long)]
    geojson_path: Option<String>,

    #[arg(long)]
    map_path: Option<String>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    println!("Reading GTFS from path: {}", args.feed_path);
    let coverage = Coverage::from_path(&args.feed_path).unwrap();
    coverage.print_stats();

    if let Some(path) = args.geojson_path {
        println!("Writing GeoJSON to path: {}", path);
        let features = geojson::get_all_features(&coverage);
        let collection = geojson::convert_to_geojson(&features);
        std::fs::write(&path, serde_json::to_string_pretty(&collection).unwrap()).unwrap();
    }

    if let Some(path) = args.map_path {
        println!("Writing map to path: {}", path);
        let page = html::render_map(&coverage, &[]);
        std::fs::write(&path, page).unwrap();
    }
}
