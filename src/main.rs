mod action;
mod archive;
mod compose;
mod config;
mod deps;
mod download;
mod env;
mod fonts;
mod fs_ops;
mod inputs;
mod installer;
mod logging;
mod paths;
mod preflight;
mod runner;

use env::ActionEnv;

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("warning: {err:#}");
    }

    let mut env = ActionEnv::from_process();
    if let Err(err) = action::run(&mut env) {
        logging::set_failed(&err);
        std::process::exit(1);
    }
}
