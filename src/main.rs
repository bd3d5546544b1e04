use std::process;
use std::sync::Arc;

use log::{error, info};

use trend::config::{self, Command};
use trend::decoder::Decoder;
use trend::pipeline::PipelineState;
use trend::producer::Producer;
use trend::ui::TrendApp;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let config = match config::parse_args(std::env::args().skip(1)) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            print!("{}", config::USAGE);
            return Ok(());
        }
        Err(err) => {
            eprintln!("trend: {err}");
            eprint!("{}", config::USAGE);
            process::exit(2);
        }
    };

    let state = Arc::new(PipelineState::new(config.channels.len(), config.history));
    let decoder = Decoder::new(config.format).with_escapes(config.escapes);
    let producer = Producer::new(
        config.source.clone(),
        decoder,
        config.input,
        Arc::clone(&state),
    );
    if let Err(err) = producer.spawn() {
        error!("failed to start producer: {err}");
        process::exit(1);
    }
    info!(
        "plotting {} channel(s) of {} {} input, history {}, {} divisions",
        config.channels.len(),
        config.format.label(),
        config.input.label(),
        config.history,
        config.divisions
    );

    let title = config.title().to_string();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title.clone())
            .with_inner_size([800.0, 400.0]),
        ..Default::default()
    };
    let app_state = Arc::clone(&state);
    let result = eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Box::new(TrendApp::new(cc, &config, app_state))),
    );
    state.shutdown();
    result
}
