use std::num::ParseFloatError;
use std::path::PathBuf;

/// Everything that can stop a run; all of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Wrong number of arguments or an invalid optional flag
    #[error("{0}")]
    Usage(clap::Error),

    /// Input path missing, a directory, or without the .csv suffix
    #[error("you have not provided a valid path to a .csv file: {}", .0.display())]
    FileNotFound(PathBuf),

    /// First line (1-based) not matching the time,voltage pattern
    #[error("line number {line} does not match the expected format")]
    FileFormat { line: usize },

    /// A validated value that still failed to parse as a float
    #[error("line number {line}: could not parse {value:?} as a number: {source}")]
    Parse {
        line: usize,
        value: String,
        source: ParseFloatError,
    },

    /// A value too large to be represented as a finite float
    #[error("line number {line}: {value} is out of range")]
    OutOfRange { line: usize, value: String },

    #[error("{} contains no data", .0.display())]
    EmptyFile(PathBuf),

    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not determine the home directory")]
    NoHome,

    #[error("could not create the output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not render the figure: {0}")]
    Render(String),

    #[error("interactive display failed: {0}")]
    Viewer(String),

    /// The figure is already saved when this one is raised
    #[error("could not remove {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
