use std::borrow::Cow;
use std::io::{BufRead, Write};

use tracing::{debug, error, warn};

use crate::command::CommandParser;
use crate::config::IndexSettings;
use crate::error::{Result, TweetdexError};
use crate::index::TweetIndex;
use crate::metrics::IndexMetrics;
use crate::models::{Command, SearchRequest, TweetId};

/// Counters for one protocol session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Lines that produced a response
    pub commands: usize,
    /// Commands answered with an error code
    pub rejected: usize,
}

/// Drives a [`TweetIndex`] from the line protocol.
///
/// Each line is parsed and applied, and exactly one response is written
/// for it: `OK ...` on success or an error code on rejection. A fatal error
/// writes `ERROR_OUT_OF_MEMORY` and ends the session with that error.
pub struct Session {
    index: TweetIndex,
    parser: CommandParser,
    metrics: Option<IndexMetrics>,
}

impl Session {
    pub fn new(settings: IndexSettings) -> Result<Self> {
        let parser = CommandParser::new(&settings.command);
        let index = TweetIndex::new(settings)?;
        Ok(Self {
            index,
            parser,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: IndexMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn index(&self) -> &TweetIndex {
        &self.index
    }

    pub fn metrics(&self) -> Option<&IndexMetrics> {
        self.metrics.as_ref()
    }

    /// Process lines from `input` until a blank line or end of input.
    ///
    /// Input is read as bytes; a line that is not valid UTF-8 is decoded
    /// lossily rather than ending the session.
    pub fn run(&mut self, mut input: impl BufRead, mut output: impl Write) -> Result<SessionStats> {
        let mut stats = SessionStats::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = decode_line(&buf);
            let outcome = match self.parser.parse_line(&line) {
                Ok(None) => break,
                Ok(Some(command)) => self.execute(&command, &mut output),
                Err(e) => Err(e),
            };
            stats.commands += 1;

            match outcome {
                Ok(()) => {}
                Err(e) if e.is_rejection() => {
                    warn!(line = %line, error = %e, "command rejected");
                    stats.rejected += 1;
                    writeln!(output, "{}", error_code(&e))?;
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "fatal error, closing session");
                    writeln!(output, "{}", error_code(&e))?;
                    output.flush()?;
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        }

        output.flush()?;
        debug!(commands = stats.commands, rejected = stats.rejected, "session ended");
        Ok(stats)
    }

    /// Apply one command and write its success response
    pub fn execute(&mut self, command: &Command, output: &mut impl Write) -> Result<()> {
        match command {
            Command::Post { author, message } => {
                let id = self.index.post(author, message)?;
                if let Some(metrics) = &self.metrics {
                    metrics.record_post(self.index.token_count());
                }
                writeln!(output, "OK {}", id)?;
            }
            Command::Favorite { id } => {
                self.favorite(*id)?;
                writeln!(output, "OK {}", id)?;
            }
            Command::Search(request) => self.search(request, output)?,
        }
        Ok(())
    }

    fn favorite(&mut self, id: TweetId) -> Result<()> {
        let result = self.index.favorite(id);
        if let Some(metrics) = &self.metrics {
            metrics.record_favorite(result.is_ok());
        }
        result
    }

    fn search(&self, request: &SearchRequest, output: &mut impl Write) -> Result<()> {
        let tweets = self.index.search(request)?;
        if let Some(metrics) = &self.metrics {
            metrics.record_search(request.order, tweets.len());
        }

        writeln!(output, "OK {}", tweets.len())?;
        for tweet in tweets {
            writeln!(output, "{}", tweet)?;
        }
        Ok(())
    }
}

fn decode_line(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes)
}

/// Protocol response for a failed command
pub fn error_code(err: &TweetdexError) -> &'static str {
    match err {
        TweetdexError::InvalidCommand(_) => "ERROR_INVALID_COMMAND",
        TweetdexError::InvalidTweetId(_) | TweetdexError::TweetNotFound(_) => {
            "ERROR_INVALID_TWEET_ID"
        }
        TweetdexError::TweetTooLong { .. } => "ERROR_TWEET_TOO_LONG",
        TweetdexError::AllocationFailure(_) => "ERROR_OUT_OF_MEMORY",
        TweetdexError::Config(_) | TweetdexError::Io(_) | TweetdexError::Serialization(_) => {
            "ERROR_INTERNAL"
        }
    }
}
