use tally::config::Config;
use tally::repl::{Repl, TerminalConsole};

fn main() {
    env_logger::init();
    let config = Config::default();
    let repl = Repl::new(&config, TerminalConsole::new());
    let _ = repl.run();
}
