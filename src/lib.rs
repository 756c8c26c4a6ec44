use log::{debug, info};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod viewer;

pub use config::Config;
pub use error::{Error, Result};

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// A line is two non-negative decimals separated by a comma,
/// spaces allowed after the comma and at the end of the line.
pub const LINE_PATTERN: &str = r"^([0-9]+(?:\.[0-9]+)?),\s*([0-9]+(?:\.[0-9]+)?)\s*$";

pub const TIME_LABEL: &str = "Time (s)";
pub const VOLTAGE_LABEL: &str = "Voltage (V)";
pub const WINDOW_TITLE: &str = "Data";

const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);

fn line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(LINE_PATTERN).expect("line pattern is a valid regex"))
}

/// The main struct for the voltage time series,
/// time[i] and voltage[i] come from line i + 1 of the csv.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeVoltage {
    pub time: Vec<f64>,
    pub voltage: Vec<f64>,
}

impl TimeVoltage {
    pub fn new(capacity: usize) -> TimeVoltage {
        TimeVoltage {
            time: Vec::with_capacity(capacity),
            voltage: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Init a TimeVoltage from csv, no header.
    pub fn from_csv(fin: &Path) -> Result<TimeVoltage> {
        let file = File::open(fin).map_err(|source| Error::Read {
            path: fin.to_path_buf(),
            source,
        })?;
        TimeVoltage::from_reader(BufReader::new(file), fin)
    }

    /// Validates and parses every line in one pass,
    /// lines end with \n, \r\n, or \r.
    /// Stops at the first line not matching `LINE_PATTERN`,
    /// `origin` is only used in the errors.
    pub fn from_reader<R: BufRead>(mut reader: R, origin: &Path) -> Result<TimeVoltage> {
        let mut timevoltage = TimeVoltage::new(1024);
        let mut buf: Vec<u8> = Vec::new();
        let mut line = 0;
        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| Error::Read {
                    path: origin.to_path_buf(),
                    source,
                })?;
            if n == 0 {
                break;
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
            // a lone \r also ends a line
            for segment in buf.split(|b| *b == b'\r') {
                line += 1;
                let text = std::str::from_utf8(segment).map_err(|_| Error::FileFormat { line })?;
                let (t, v) = parse_line(text, line)?;
                timevoltage.time.push(t);
                timevoltage.voltage.push(v);
            }
        }
        if timevoltage.is_empty() {
            return Err(Error::EmptyFile(origin.to_path_buf()));
        }
        debug!("read {} points from {}", line, origin.display());
        Ok(timevoltage)
    }

    /// draws the line chart on any plotters backend,
    /// sizes are in points and scaled by the density
    pub fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        name: &str,
        dpi: f64,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let pt = |points: f64| points * dpi / 72.;
        let px = |points: f64| pt(points).round() as u32;
        let (xmin, xmax) = padded_range(&self.time[..]);
        let (ymin, ymax) = padded_range(&self.voltage[..]);
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(root)
            .caption(format!("Data for {}", name), ("sans-serif", pt(12.)))
            .margin(px(10.))
            .x_label_area_size(px(30.))
            .y_label_area_size(px(45.))
            .build_cartesian_2d(xmin..xmax, ymin..ymax)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .set_all_tick_mark_size(px(3.5))
            .label_style(("sans-serif", pt(10.)))
            .axis_desc_style(("sans-serif", pt(10.)))
            .x_desc(TIME_LABEL)
            .y_desc(VOLTAGE_LABEL)
            .draw()?;
        let line = LineSeries::new(
            self.time.iter().zip(self.voltage.iter()).map(|(t, v)| (*t, *v)),
            LINE_COLOR.stroke_width(px(1.5).max(1)),
        );
        chart.draw_series(line)?;
        root.present()?;
        Ok(())
    }

    /// renders the chart in memory for the interactive window
    pub fn render_rgb(&self, name: &str, config: &Config) -> Result<viewer::RgbFrame> {
        let (width, height) = config.canvas_size(config.display_dpi);
        let mut pixels = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            self.draw(&root, name, config.display_dpi)
                .map_err(render_error)?;
        }
        Ok(viewer::RgbFrame {
            width,
            height,
            pixels,
        })
    }

    /// plots the voltage time series to jpeg, overwriting `fout`
    pub fn save_jpeg(&self, fout: &Path, name: &str, config: &Config) -> Result<()> {
        let size = config.canvas_size(config.save_dpi);
        let root = BitMapBackend::new(fout, size).into_drawing_area();
        self.draw(&root, name, config.save_dpi)
            .map_err(render_error)
    }
}

fn render_error<E: std::fmt::Display>(e: E) -> Error {
    Error::Render(e.to_string())
}

/// Splits one csv line into (time, voltage), `line` is 1-based.
pub fn parse_line(text: &str, line: usize) -> Result<(f64, f64)> {
    let caps = line_regex()
        .captures(text)
        .ok_or(Error::FileFormat { line })?;
    let number = |i: usize| -> Result<f64> {
        let value = &caps[i];
        let parsed = value.parse::<f64>().map_err(|source| Error::Parse {
            line,
            value: value.to_string(),
            source,
        })?;
        if !parsed.is_finite() {
            return Err(Error::OutOfRange {
                line,
                value: value.to_string(),
            });
        }
        Ok(parsed)
    };
    Ok((number(1)?, number(2)?))
}

pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut self_iter = s.iter();
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

/// axis range with a 1/20 margin on each side, kept finite
pub fn padded_range(s: &[f64]) -> (f64, f64) {
    let (min, max) = min_and_max(s).unwrap_or((0., 0.));
    let span = max - min;
    let margin = if span > 0. {
        span / 20.
    } else {
        (min.abs() / 20.).max(0.5)
    };
    ((min - margin).max(f64::MIN), (max + margin).min(f64::MAX))
}

/// Reads, shows, and saves the figure of `input`; returns the saved path.
pub fn run(
    input: &cli::InputSpec,
    config: &Config,
    viewer: &dyn viewer::Viewer,
) -> Result<PathBuf> {
    let tv = TimeVoltage::from_csv(&input.path)?;
    info!("{} points validated in {}", tv.len(), input.path.display());

    let frame = tv.render_rgb(&input.name, config)?;
    viewer.show(WINDOW_TITLE, &frame)?;

    let target = output::OutputTarget::new(&config.output_root, &input.name);
    target.ensure_directory()?;
    let fout = target.path();
    tv.save_jpeg(&fout, &input.name, config)?;
    info!("saved {}", fout.display());

    if input.remove_after {
        output::remove_source(&input.path)?;
    }
    Ok(fout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(content: &[u8]) -> Result<TimeVoltage> {
        TimeVoltage::from_reader(Cursor::new(content.to_vec()), Path::new("test.csv"))
    }

    fn failing_line(content: &[u8]) -> usize {
        match read(content) {
            Err(Error::FileFormat { line }) => line,
            other => panic!("expected a format error, got {:?}", other),
        }
    }

    #[test]
    fn keeps_file_order() {
        let tv = read(b"0,0\n1,2.5\n2,5.0\n").unwrap();
        assert_eq!(tv.time, vec![0., 1., 2.]);
        assert_eq!(tv.voltage, vec![0., 2.5, 5.0]);
        let unsorted = read(b"3,1\n1,2\n2,3").unwrap();
        assert_eq!(unsorted.time, vec![3., 1., 2.]);
    }

    #[test]
    fn one_point_per_line() {
        let tv = read(b"0.5, 1\r\n1.25,\t2 \r\n10,30\n").unwrap();
        assert_eq!(tv.len(), 3);
        assert_eq!(tv.time, vec![0.5, 1.25, 10.]);
        assert_eq!(tv.voltage, vec![1., 2., 30.]);
    }

    #[test]
    fn first_bad_line_is_reported() {
        assert_eq!(failing_line(b"1,2\nabc\n3,4\n"), 2);
        assert_eq!(failing_line(b"-1,2\n"), 1);
        assert_eq!(failing_line(b"1,2\n3,-4\n"), 2);
        assert_eq!(failing_line(b"1,2\n3;4\n"), 2);
        assert_eq!(failing_line(b"1,2\n3,4\n5,6,7\n"), 3);
        assert_eq!(failing_line(b"1,2\n\n3,4\n"), 2);
        assert_eq!(failing_line(b"1e3,2\n"), 1);
        assert_eq!(failing_line(b"1,2\n1,5\n2,\n"), 3);
        assert_eq!(failing_line(b"1,2\n 3,4\n"), 2);
        assert_eq!(failing_line(b"1.,2\n"), 1);
        assert_eq!(failing_line(b"1,2\n3 ,4\n"), 2);
    }

    #[test]
    fn rejects_locale_decimals_and_bad_bytes() {
        assert_eq!(failing_line(b"1,5;2,5\n"), 1);
        assert_eq!(failing_line(b"1,2\n3,\xff\n"), 2);
    }

    #[test]
    fn lone_carriage_returns_end_lines() {
        let tv = read(b"1,2\r3,4\r").unwrap();
        assert_eq!(tv.time, vec![1., 3.]);
        assert_eq!(tv.voltage, vec![2., 4.]);
        let mixed = read(b"1,2\r\n3,4\r5,6\n").unwrap();
        assert_eq!(mixed.len(), 3);
        assert_eq!(failing_line(b"1,2\r\r3,4\n"), 2);
        assert_eq!(failing_line(b"1,2\r3,4\rx\n5,6\n"), 3);
    }

    #[test]
    fn huge_values_are_rejected() {
        let huge = format!("0,1\n1{},0\n", "0".repeat(400));
        match read(huge.as_bytes()) {
            Err(Error::OutOfRange { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected an out of range error, got {:?}", other),
        }
        let large = format!("1{},0\n", "0".repeat(300));
        assert!(read(large.as_bytes()).unwrap().time[0].is_finite());
    }

    #[test]
    fn empty_input() {
        assert!(matches!(read(b""), Err(Error::EmptyFile(_))));
    }

    #[test]
    fn parse_line_values() {
        assert_eq!(parse_line("12.5,  0.75  ", 1).unwrap(), (12.5, 0.75));
        assert!(matches!(
            parse_line("12.5 0.75", 4),
            Err(Error::FileFormat { line: 4 })
        ));
    }

    #[test]
    fn ranges() {
        assert_eq!(min_and_max(&[3., -1., 2.][..]), Some((-1., 3.)));
        assert_eq!(min_and_max::<f64>(&[]), None);
        assert_eq!(padded_range(&[0., 20.]), (-1., 21.));
        assert_eq!(padded_range(&[4.]), (3.5, 4.5));
        assert_eq!(padded_range(&[100.]), (95., 105.));
        let (lo, hi) = padded_range(&[0., f64::MAX]);
        assert!(lo.is_finite() && hi.is_finite() && lo < hi);
        let (lo, hi) = padded_range(&[f64::MAX]);
        assert!(lo.is_finite() && hi.is_finite() && lo < hi);
    }

    struct CheckBeforeSave {
        source: PathBuf,
        figure: PathBuf,
    }

    impl viewer::Viewer for CheckBeforeSave {
        fn show(&self, title: &str, frame: &viewer::RgbFrame) -> Result<()> {
            assert_eq!(title, WINDOW_TITLE);
            assert_eq!((frame.width, frame.height), (1360, 765));
            assert!(self.source.exists());
            assert!(!self.figure.exists());
            Ok(())
        }
    }

    #[test]
    fn run_shows_then_saves_then_removes() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("run1.csv");
        std::fs::write(&csv, "0,0\n1,1\n2,4\n").unwrap();
        let config = Config::new(&dir.path().join("home"));
        let input = cli::InputSpec::resolve(&csv, true).unwrap();
        let expected = config.output_root.join("run1.jpeg");
        let viewer = CheckBeforeSave {
            source: csv.clone(),
            figure: expected.clone(),
        };
        let saved = run(&input, &config, &viewer).unwrap();
        assert_eq!(saved, expected);
        assert!(saved.is_file());
        assert!(!csv.exists());
    }

    struct DeleteSource {
        source: PathBuf,
    }

    impl viewer::Viewer for DeleteSource {
        fn show(&self, _title: &str, _frame: &viewer::RgbFrame) -> Result<()> {
            std::fs::remove_file(&self.source).unwrap();
            Ok(())
        }
    }

    #[test]
    fn failed_removal_keeps_saved_figure() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("vanishing.csv");
        std::fs::write(&csv, "0,0\n1,1\n").unwrap();
        let config = Config::new(&dir.path().join("home"));
        let input = cli::InputSpec::resolve(&csv, true).unwrap();
        let viewer = DeleteSource {
            source: csv.clone(),
        };
        let err = run(&input, &config, &viewer).unwrap_err();
        assert!(matches!(err, Error::Remove { .. }));
        assert!(config.output_root.join("vanishing.jpeg").is_file());
    }

    #[test]
    fn run_leaves_nothing_on_bad_format() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("bad.csv");
        std::fs::write(&csv, "1,2\nabc\n3,4\n").unwrap();
        let config = Config::new(dir.path());
        let input = cli::InputSpec::resolve(&csv, true).unwrap();
        let err = run(&input, &config, &viewer::Headless).unwrap_err();
        assert!(matches!(err, Error::FileFormat { line: 2 }));
        assert!(csv.exists());
        assert!(!config.output_root.exists());
    }
}
