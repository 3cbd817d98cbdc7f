//! Spinning cube demo

mod app;
mod cube;

use app::App;

fn main() {
    daisy_engine::foundation::logging::init();

    if let Err(err) = App::new().and_then(App::run) {
        log::error!("Fatal error: {err}");
        std::process::exit(1);
    }
}
