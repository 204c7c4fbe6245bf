use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "gector-server")]
#[command(about = "GECToR grammatical error correction server", long_about = None)]
pub struct Cli {
    /// Server configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// GECToR params file (JSON)
    #[arg(long = "params_path", alias = "params-path", env = "GECTOR_PARAMS_PATH")]
    pub params_path: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Listen address
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}
