use expv_plot::cli::parse_cli;
use expv_plot::viewer::{Headless, Viewer, WindowViewer};
use expv_plot::{run, Config, Error};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match parse_cli(std::env::args_os()) {
        Ok(a) => a,
        Err(Error::Usage(e)) => e.exit(),
        Err(e) => fail(e),
    };
    let config = match Config::from_home() {
        Ok(c) => c,
        Err(e) => fail(e),
    };
    let viewer: &dyn Viewer = if args.show { &WindowViewer } else { &Headless };

    match run(&args.input, &config, viewer) {
        Ok(saved) => println!("\nFigure saved to: {}\n", saved.display()),
        Err(e) => fail(e),
    }
}

fn fail(e: Error) -> ! {
    log::debug!("{:?}", e);
    eprintln!("error: {}", e);
    std::process::exit(1)
}
