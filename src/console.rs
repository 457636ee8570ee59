//! Interactive line-based dialogue.
//!
//! Generic over the reader and writer so the whole dialogue can be driven
//! from a byte buffer in tests.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::auth::{Credentials, User};
use crate::error::{Result, SmartLineError};

/// Where query results go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Printed one row per line.
    Console,
    /// Written as header-less CSV.
    Csv(PathBuf),
}

/// Prompts on `output`, answers come from `input`.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Asks for the four identity fields, in order.
    pub fn read_credentials(&mut self) -> Result<Credentials> {
        let first_name = self.ask("First name: ")?;
        let last_name = self.ask("Last name: ")?;
        let email = self.ask("Email: ")?;
        let username = self.ask("Username: ")?;
        Ok(Credentials::new(first_name, last_name, email, username))
    }

    /// Greets the user and asks what they are looking for.
    pub fn read_request(&mut self, user: &User) -> Result<String> {
        self.ask(&format!(
            "What information would you like to get, {} {}? ",
            user.first_name(),
            user.last_name()
        ))
    }

    /// Asks for `csv` or `console` until one of them is typed, then for the
    /// file path if `csv` was chosen.
    pub fn read_destination(&mut self) -> Result<Destination> {
        let mut answer = self.ask(
            "Where should the results go: a csv file or the console?\nType 'csv' or 'console': ",
        )?;
        loop {
            match answer.as_str() {
                "csv" => {
                    let path = self.ask("File path to save to: ")?;
                    return Ok(Destination::Csv(PathBuf::from(path)));
                }
                "console" => return Ok(Destination::Console),
                _ => answer = self.ask("Type 'csv' or 'console': ")?,
            }
        }
    }

    /// Writes one line of text.
    pub fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}")?;
        self.output.flush()?;
        Ok(())
    }

    /// Gives direct access to the writer, for row rendering.
    pub fn writer(&mut self) -> &mut W {
        &mut self.output
    }

    /// Consumes the console, returning the writer.
    pub fn into_writer(self) -> W {
        self.output
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(SmartLineError::output("input closed before an answer was given"));
        }
        Ok(line.trim().to_string())
    }
}
