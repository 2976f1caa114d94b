//! Interactive numbered menu.
//!
//! ```text
//! 1. Convert JPG to PNG
//! 2. Convert PNG to JPG
//! 3. Crop images
//! 4. Resize images
//! 5. Thumbnail images
//! 6. Exit
//! Enter your choice 1-6:
//! ```
//!
//! The loop only collects text. Turning answers into a request is
//! [`build_request`]; running it is [`run_with_progress`]. A failed batch
//! (e.g. a missing source directory) is reported and the menu is shown again.
//!
//! Answers come from a [`Prompter`]: `dialoguer` prompts on a terminal, plain
//! lines from stdin when input is piped. The loop ends at Exit or when input
//! runs out.

use crate::engine::EngineOptions;
use crate::output::{print_summary, run_with_progress};
use crate::request::{MenuChoice, build_request};
use dialoguer::Input;
use dialoguer::console::Term;
use std::io::{self, BufRead, IsTerminal, Write};

/// Accepts an answer, or explains why it is rejected.
pub type Check<'a> = &'a dyn Fn(&str) -> Result<(), String>;

/// Source of answers for the menu.
pub trait Prompter {
    /// Ask until `check` accepts the answer. `Ok(None)` means input ran out.
    fn ask(&mut self, prompt: &str, check: Check<'_>) -> io::Result<Option<String>>;
}

/// Prompts on the terminal with line editing and inline validation errors.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, prompt: &str, check: Check<'_>) -> io::Result<Option<String>> {
        Input::<String>::new()
            .with_prompt(prompt)
            .validate_with(|input: &String| check(input))
            .interact_text()
            .map(Some)
            .map_err(io::Error::other)
    }
}

/// Reads one answer per line, echoing prompts and rejections to `out`.
pub struct LinePrompter<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, prompt: &str, check: Check<'_>) -> io::Result<Option<String>> {
        loop {
            write!(self.out, "{prompt}: ")?;
            self.out.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let answer = line.trim_end_matches(['\n', '\r']).to_string();
            match check(&answer) {
                Ok(()) => return Ok(Some(answer)),
                Err(reason) => writeln!(self.out, "{reason}")?,
            }
        }
    }
}

fn menu_lines() -> Vec<String> {
    MenuChoice::ALL
        .iter()
        .map(|choice| format!("{}. {}", *choice as u8, choice.label()))
        .collect()
}

fn any_text(_: &str) -> Result<(), String> {
    Ok(())
}

fn whole_number(input: &str) -> Result<(), String> {
    input
        .trim()
        .parse::<u32>()
        .map(|_| ())
        .map_err(|_| format!("{input:?} is not a non-negative whole number"))
}

fn menu_choice(input: &str) -> Result<(), String> {
    MenuChoice::parse(input)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Show the menu on the terminal, or read piped answers from stdin.
pub fn run_interactive(options: EngineOptions) -> io::Result<()> {
    if Term::stderr().is_term() && io::stdin().is_terminal() {
        run_menu(options, &mut TerminalPrompter)
    } else {
        run_menu(options, &mut LinePrompter::new(io::stdin().lock(), io::stdout()))
    }
}

/// Show the menu until the user picks Exit or input runs out.
pub fn run_menu(options: EngineOptions, prompter: &mut impl Prompter) -> io::Result<()> {
    loop {
        println!();
        for line in menu_lines() {
            println!("{}", line);
        }

        let Some(answer) = prompter.ask("Enter your choice 1-6", &menu_choice)? else {
            return Ok(());
        };
        let Ok(choice) = MenuChoice::parse(&answer) else {
            continue;
        };
        if choice == MenuChoice::Exit {
            return Ok(());
        }

        let Some(source) = prompter.ask("Enter image path", &any_text)? else {
            return Ok(());
        };
        let Some(dest) = prompter.ask("Enter output path", &any_text)? else {
            return Ok(());
        };
        let mut values = Vec::new();
        for prompt in choice.parameter_prompts() {
            match prompter.ask(&format!("Enter {prompt}"), &whole_number)? {
                Some(value) => values.push(value),
                None => return Ok(()),
            }
        }

        let request = match build_request(choice, &source, &dest, &values) {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(()),
            Err(e) => {
                println!("InvalidParameters: {e}");
                continue;
            }
        };

        match run_with_progress(options, &request) {
            Ok(summary) => print_summary(&summary),
            Err(e) => println!("{}: {e}", e.kind_name()),
        }
    }
}
