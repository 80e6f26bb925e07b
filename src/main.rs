mod actions;
mod cli;
mod config;
mod gestures;
mod input;
mod landmarks;
mod logging;
mod mapper;
mod pipeline;
mod recorder;
mod scene;
mod smoother;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
