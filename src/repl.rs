use rustyline::error::ReadlineError;
use rustyline::Editor;
use error_chain::ChainedError;
use log::{debug, info, warn};

use crate::config::Config;
use crate::eval::{self, Evaluator};
use crate::export::Exporter;
use crate::history::{CalculationEntry, HistoryStore};

pub mod errors {
    use error_chain::error_chain;
    error_chain! {
        errors {
            InvalidIndex(s: String) {
                description("Invalid entry number"),
                display("invalid entry number: {:?}", s),
            }
        }
    }
}

use errors::*;

const MENU: &str = "
===== Calculator Menu =====
1. Enter an expression to calculate
2. View calculation history
3. Save the whole history to a file
4. Select history entries and save them to a file
5. Exit";

/// Line-oriented user interface the loop talks to.
pub trait Console {
    /// `None` once input is exhausted or interrupted.
    fn read_line(&mut self, prompt: &str) -> Option<String>;
    fn show(&mut self, message: &str);
}

pub struct TerminalConsole {
    editor: Editor<()>,
}

impl TerminalConsole {
    pub fn new() -> TerminalConsole {
        TerminalConsole { editor: Editor::<()>::new() }
    }
}

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str());
                }
                Some(line)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => None,
            Err(e) => {
                warn!("readline failed: {}", e);
                None
            }
        }
    }

    fn show(&mut self, message: &str) {
        println!("{}", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Calculate,
    ViewHistory,
    ExportAll,
    ExportSelected,
    Quit,
}

impl Choice {
    pub fn parse(input: &str) -> Option<Choice> {
        match input.trim() {
            "1" => Some(Choice::Calculate),
            "2" => Some(Choice::ViewHistory),
            "3" => Some(Choice::ExportAll),
            "4" => Some(Choice::ExportSelected),
            "5" => Some(Choice::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Stopped,
}

/// Parses a comma separated list of 1-based entry numbers. A single bad
/// part rejects the whole list.
pub fn parse_indices(input: &str) -> Result<Vec<i32>> {
    input
        .split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<i32>()
                .chain_err(|| ErrorKind::InvalidIndex(part.to_string()))
        })
        .collect()
}

pub struct Repl<C: Console> {
    console: C,
    evaluator: Evaluator,
    history: HistoryStore,
    exporter: Exporter,
    state: State,
}

impl<C: Console> Repl<C> {

    pub fn new(config: &Config, console: C) -> Repl<C> {
        Repl {
            console,
            evaluator: Evaluator::strict(config.strict),
            history: HistoryStore::open(config.history_file.clone()),
            exporter: Exporter::new(config.export_file_name.clone()),
            state: State::Running,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Runs until the user quits or input ends, then hands the console back.
    pub fn run(mut self) -> C {
        while self.state == State::Running {
            self.console.show(MENU);
            let input = match self.console.read_line("Choose an option: ") {
                Some(input) => input,
                None => {
                    self.state = State::Stopped;
                    break;
                }
            };
            self.step(&input);
        }
        info!("session finished");
        self.console
    }

    /// Handles one menu selection.
    pub fn step(&mut self, input: &str) {
        match Choice::parse(input) {
            Some(Choice::Calculate) => self.calculate(),
            Some(Choice::ViewHistory) => self.view_history(),
            Some(Choice::ExportAll) => self.export_all(),
            Some(Choice::ExportSelected) => self.export_selected(),
            Some(Choice::Quit) => {
                self.state = State::Stopped;
                self.console.show("Goodbye.");
            }
            None => self.console.show("Invalid choice. Please try again."),
        }
    }

    fn prompt(&mut self, prompt: &str) -> Option<String> {
        let line = self.console.read_line(prompt);
        if line.is_none() {
            self.state = State::Stopped;
        }
        line
    }

    fn calculate(&mut self) {
        let expression = match self.prompt("Enter an expression: ") {
            Some(e) => e,
            None => return,
        };
        match self.evaluator.evaluate(&expression) {
            Ok(x) => {
                let result = eval::format_result(x);
                self.console.show(&format!("Result: {}", result));
                if let Err(e) = self.history.record(CalculationEntry::new(expression, result)) {
                    self.console.show(&format!("Failed to save history: {}", e));
                }
            }
            Err(e) => {
                debug!("{}", e.display_chain());
                self.console.show(&format!("error in expression: {}", e));
            }
        }
    }

    fn view_history(&mut self) {
        let entries = self.history.list();
        if entries.is_empty() {
            self.console.show("History is empty.");
            return;
        }
        self.console.show("\n--- Calculation history ---");
        for (i, entry) in entries.iter().enumerate() {
            self.console.show(&format!("{}. {}", i + 1, entry));
        }
        self.console.show("---------------------------");
    }

    fn export_all(&mut self) {
        let destination = match self.prompt(
            "Enter a path or file name (leave empty to see where the history file is): ",
        ) {
            Some(d) => d,
            None => return,
        };
        let message = match self.exporter.export_all(&self.history, &destination) {
            Ok(outcome) => outcome.to_string(),
            Err(e) => format!("Error saving file: {}", e),
        };
        self.console.show(&message);
    }

    fn export_selected(&mut self) {
        self.view_history();
        if self.history.is_empty() {
            return;
        }

        let input = match self.prompt("Enter entry numbers separated by commas (e.g. 1,3,4): ") {
            Some(i) => i,
            None => return,
        };
        let indices = match parse_indices(&input) {
            Ok(indices) => indices,
            Err(e) => {
                debug!("{}", e.display_chain());
                self.console.show("Error: invalid entry numbers.");
                return;
            }
        };

        let destination = match self.prompt("Enter a path or file name to save to (must not be empty): ") {
            Some(d) => d,
            None => return,
        };
        let message = match self.exporter.export_selected(&self.history, &destination, &indices) {
            Ok(outcome) => outcome.to_string(),
            Err(e) => format!("Error saving file: {}", e),
        };
        self.console.show(&message);
    }
}
