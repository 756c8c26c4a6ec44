use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Folder, under the home directory, collecting all the saved figures.
pub const FIGURES_DIR: &str = "Exp_V_Figures";

/// Settings resolved once at start and passed down to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub output_root: PathBuf,
    /// density of the interactive figure
    pub display_dpi: f64,
    /// density of the saved jpeg
    pub save_dpi: f64,
    pub width_in: f64,
    pub height_in: f64,
}

impl Config {
    pub fn new(home: &Path) -> Config {
        Config {
            output_root: home.join(FIGURES_DIR),
            display_dpi: 170.,
            save_dpi: 200.,
            width_in: 8.,
            height_in: 4.5,
        }
    }

    /// Config rooted at the user's home directory.
    pub fn from_home() -> Result<Config> {
        let home = dirs::home_dir().ok_or(Error::NoHome)?;
        Ok(Config::new(&home))
    }

    /// canvas size in pixels for the given density
    pub fn canvas_size(&self, dpi: f64) -> (u32, u32) {
        (
            (self.width_in * dpi).round() as u32,
            (self.height_in * dpi).round() as u32,
        )
    }
}
