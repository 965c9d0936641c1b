use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Library database file.
    #[clap(long, default_value = "library.db")]
    pub db: PathBuf,
    /// Create a new library database instead of opening an existing one.
    #[clap(long, default_value = "false")]
    pub new: bool,
}
