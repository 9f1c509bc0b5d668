use std::num::{IntErrorKind, ParseIntError};

use tracing::trace;

use crate::config::CommandConfig;
use crate::error::{Result, TweetdexError};
use crate::models::{Command, SearchOrder, SearchRequest, TweetId};

/// Parses protocol lines into validated [`Command`]s.
///
/// Every validation the protocol defines happens here, so the index only
/// ever sees well-formed requests. The one check left to the index is
/// whether a favorited id exists.
#[derive(Clone, Debug)]
pub struct CommandParser {
    max_message_length: usize,
}

impl CommandParser {
    pub fn new(config: &CommandConfig) -> Self {
        Self {
            max_message_length: config.max_message_length,
        }
    }

    /// Parse one input line.
    ///
    /// Returns `Ok(None)` for a blank line, which ends the session.
    pub fn parse_line(&self, line: &str) -> Result<Option<Command>> {
        let Some((name, rest)) = split_word(line) else {
            return Ok(None);
        };
        trace!(command = name, "parsing command");

        let command = match name {
            "post" | "twittear" => self.parse_post(rest)?,
            "favorite" | "favorito" => parse_favorite(rest)?,
            "search" | "buscar" => parse_search(rest)?,
            other => {
                return Err(TweetdexError::InvalidCommand(format!(
                    "unknown command {:?}",
                    other
                )))
            }
        };
        Ok(Some(command))
    }

    /// `post <author> <message...>`; the message is the rest of the line
    /// with leading whitespace removed and everything after kept verbatim.
    fn parse_post(&self, args: &str) -> Result<Command> {
        let Some((author, rest)) = split_word(args) else {
            return Err(invalid("post expects an author and a message"));
        };
        let message = rest.trim_start();
        if message.is_empty() {
            return Err(invalid("post expects an author and a message"));
        }
        if !author.starts_with('@') {
            return Err(TweetdexError::InvalidCommand(format!(
                "author {:?} must start with '@'",
                author
            )));
        }
        if message.len() > self.max_message_length {
            return Err(TweetdexError::TweetTooLong {
                length: message.len(),
                max: self.max_message_length,
            });
        }

        Ok(Command::Post {
            author: author.to_string(),
            message: message.to_string(),
        })
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(&CommandConfig::default())
    }
}

/// `favorite <id>`
fn parse_favorite(args: &str) -> Result<Command> {
    let [raw] = arguments::<1>(args, "favorite expects exactly one id")?;
    let id: i64 = raw.parse().map_err(|e: ParseIntError| match e.kind() {
        // out of range for any tweet, but still a number
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            TweetdexError::InvalidTweetId(raw.to_string())
        }
        _ => TweetdexError::InvalidCommand(format!("tweet id {:?} is not a number", raw)),
    })?;
    let id = TweetId::try_from(id).map_err(|_| TweetdexError::InvalidTweetId(raw.to_string()))?;
    Ok(Command::Favorite { id })
}

/// `search <token> <order> <limit>`
fn parse_search(args: &str) -> Result<Command> {
    let [token, order, limit] =
        arguments::<3>(args, "search expects a token, an order and a limit")?;
    if !(token.starts_with('@') || token.starts_with('#')) {
        return Err(TweetdexError::InvalidCommand(format!(
            "search token {:?} must start with '@' or '#'",
            token
        )));
    }
    let order: SearchOrder = order.parse()?;
    let limit: usize = limit
        .parse()
        .map_err(|_| TweetdexError::InvalidCommand(format!("limit {:?} is not a count", limit)))?;

    Ok(Command::Search(SearchRequest::new(token, order, limit)))
}

/// Split off the first whitespace-delimited word, `None` if there is none
fn split_word(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some(s.split_at(end))
}

/// Exactly `N` whitespace-delimited arguments
fn arguments<'a, const N: usize>(args: &'a str, usage: &str) -> Result<[&'a str; N]> {
    let mut words = args.split_whitespace();
    let mut out = [""; N];
    for slot in out.iter_mut() {
        *slot = words.next().ok_or_else(|| invalid(usage))?;
    }
    if words.next().is_some() {
        return Err(invalid(usage));
    }
    Ok(out)
}

fn invalid(reason: &str) -> TweetdexError {
    TweetdexError::InvalidCommand(reason.to_string())
}
