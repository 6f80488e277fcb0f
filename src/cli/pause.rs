//! Interactive batch pacing.
//!
//! The replay stops before every batch of `batch_size` steps and waits for the
//! operator. Typing a number `n > 0` at the prompt lets the next `n - 1`
//! batches through without stopping; anything else (including an empty line
//! or a closed stdin) just continues with the current batch.

use std::io::{self, BufRead, Write};

use chrono::{DateTime, Utc};
use tracing::warn;

/// Where the pause prompt is written and its answer read from.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Block until a line is entered. Returns the number of following pauses
    /// to skip.
    pub fn ask(&mut self, date: DateTime<Utc>) -> u32 {
        if let Err(err) = write!(self.output, "({date} | {}) > ", date.timestamp())
            .and_then(|_| self.output.flush())
        {
            warn!(error = %err, "failed to write pause prompt");
        }

        let mut line = String::new();
        if let Err(err) = self.input.read_line(&mut line) {
            warn!(error = %err, "failed to read pause answer");
            return 0;
        }
        parse_skip(&line)
    }
}

impl Prompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

fn parse_skip(line: &str) -> u32 {
    match line.trim().parse::<u32>() {
        Ok(n) if n > 0 => n - 1,
        _ => 0,
    }
}

/// Counts steps and decides when to pause.
#[derive(Debug, Clone)]
pub struct BatchGate {
    batch_size: u32,
    count: u32,
    skip: u32,
}

impl BatchGate {
    /// `batch_size == 0` never pauses.
    pub fn new(batch_size: u32) -> Self {
        Self {
            batch_size,
            count: 0,
            skip: 0,
        }
    }

    /// Register one step. Returns `true` if the prompt was shown.
    ///
    /// The first step opens a batch, then every `batch_size`-th step after it.
    pub fn step<R: BufRead, W: Write>(
        &mut self,
        date: DateTime<Utc>,
        prompt: &mut Prompt<R, W>,
    ) -> bool {
        if self.batch_size == 0 {
            return false;
        }

        if self.count % self.batch_size != 0 {
            self.count += 1;
            return false;
        }

        self.count = 1;
        if self.skip > 0 {
            self.skip -= 1;
            return false;
        }
        self.skip = prompt.ask(date);
        true
    }
}
