//! Interactive approval

use std::io::{BufRead, BufReader, Stdin, Stdout, Write};

use apptrack_core::Approver;
use apptrack_core::schema::{ProductId, ProductState};

/// Asks the operator to approve each fetched version.
///
/// Only `y`/`yes` approve; an empty answer or end of input means no. Any
/// other answer repeats the question.
#[derive(Debug)]
pub struct ConsoleApprover<R, W> {
    input: R,
    output: W,
}

impl ConsoleApprover<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleApprover<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead + Send, W: Write + Send> Approver for ConsoleApprover<R, W> {
    fn approve(&mut self, _id: &ProductId, candidate: &ProductState) -> anyhow::Result<bool> {
        loop {
            write!(
                self.output,
                "Approve {} ({}) (y/n) [n]: ",
                candidate.name, candidate.version
            )?;
            self.output.flush()?;

            let mut answer = String::new();
            if self.input.read_line(&mut answer)? == 0 {
                writeln!(self.output)?;
                return Ok(false);
            }
            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "" | "n" | "no" => return Ok(false),
                _ => {}
            }
        }
    }
}
