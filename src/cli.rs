use super::VERSION;
use crate::error::{Error, Result};
use clap::{App, AppSettings, Arg};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const CSV_SUFFIX: &str = ".csv";

/// The file to plot and what to do with it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    /// absolute path to the csv file
    pub path: PathBuf,
    /// file name without the .csv suffix, used for title and output name
    pub name: String,
    pub remove_after: bool,
}

impl InputSpec {
    /// Checks that `raw` is an existing, non-directory file ending with .csv
    /// and makes it absolute.
    pub fn resolve(raw: &Path, remove_after: bool) -> Result<InputSpec> {
        let has_suffix = raw.to_string_lossy().ends_with(CSV_SUFFIX);
        if !raw.exists() || raw.is_dir() || !has_suffix {
            return Err(Error::FileNotFound(raw.to_path_buf()));
        }
        let path = std::path::absolute(raw).map_err(|source| Error::Read {
            path: raw.to_path_buf(),
            source,
        })?;
        let name = display_name(&path);
        Ok(InputSpec {
            path,
            name,
            remove_after,
        })
    }
}

/// Final path component with one trailing ".csv" removed.
pub fn display_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.strip_suffix(CSV_SUFFIX) {
        Some(stem) => stem.to_string(),
        None => file_name,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub input: InputSpec,
    /// open the interactive window before saving
    pub show: bool,
}

/// Takes the CLI arguments that select the csv file to plot.
pub fn parse_cli<I, T>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let arg_csvin = Arg::with_name("csvfile")
        .help("path to the two-column (time, voltage) csv file")
        .required(true)
        .index(1);
    let arg_remove = Arg::with_name("remove")
        .help("remove the csv file once the figure has been saved")
        .index(2)
        .possible_values(&["remove"]);
    let arg_no_show = Arg::with_name("no_show")
        .help("save the figure without opening the interactive window")
        .long("no-show")
        .takes_value(false);
    let cli_args = App::new("expv_plot")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to check, plot, and save a time-voltage csv file")
        .setting(AppSettings::ColorNever)
        .setting(AppSettings::AllowLeadingHyphen)
        .arg(arg_csvin)
        .arg(arg_remove)
        .arg(arg_no_show)
        .get_matches_from_safe(args)
        .map_err(Error::Usage)?;

    let csvin = PathBuf::from(cli_args.value_of_os("csvfile").unwrap_or_default());
    let remove_after = cli_args.is_present("remove");
    let input = InputSpec::resolve(&csvin, remove_after)?;
    Ok(CliArgs {
        input,
        show: !cli_args.is_present("no_show"),
    })
}
