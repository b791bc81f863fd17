use std::env;
use std::io;
use std::path::PathBuf;

use structured_logger::json::new_writer;
use structured_logger::Builder;

use osm_wrangle::etl::load_documents::LoadDocumentsEtl;
use osm_wrangle::etl::sample_osm::SampleOsmEtl;
use osm_wrangle::{Etl, JsonLinesStore, Result, UserConfig};

const DEFAULT_CONFIG_PATH: &str = "config/osm.json";

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let user_config = UserConfig::load(&config_path)?;
    setup_logging(&user_config.log_level);

    let mut sample_etl = SampleOsmEtl::from_config(&user_config)?;
    sample_etl.process()?;

    let mut store = JsonLinesStore::create(&user_config.documents_path())?;
    LoadDocumentsEtl::from_config(&user_config, &mut store)
        .with_progress(true)
        .process()
}
