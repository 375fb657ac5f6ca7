//! SMTP command parser.
//!
//! Verbs are case-insensitive. `MAIL FROM:` and `RCPT TO:` accept an
//! optional space after the colon, which many clients send.

use crate::command::Command;
use crate::error::ParseError;
use crate::types::{AuthMechanism, parse_path};

/// Parses one command line, without its CRLF.
///
/// # Errors
///
/// Returns [`ParseError::Unrecognized`] for an unknown verb and
/// [`ParseError::Syntax`] for malformed arguments.
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (verb, rest) = match line.split_once(' ') {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_ascii_uppercase().as_str() {
        "HELO" => Ok(Command::Helo {
            hostname: required(rest, "HELO requires a domain")?,
        }),
        "EHLO" => Ok(Command::Ehlo {
            hostname: required(rest, "EHLO requires a domain")?,
        }),
        "STARTTLS" => no_args(rest, Command::StartTls),
        "AUTH" => parse_auth(rest),
        "MAIL" => parse_mail(rest),
        "RCPT" => parse_rcpt(rest),
        "DATA" => no_args(rest, Command::Data),
        "RSET" => no_args(rest, Command::Rset),
        // NOOP may carry an ignored string argument.
        "NOOP" => Ok(Command::Noop),
        "QUIT" => no_args(rest, Command::Quit),
        "VRFY" => Ok(Command::Vrfy {
            address: required(rest, "VRFY requires an argument")?,
        }),
        _ => Err(ParseError::Unrecognized(verb.to_string())),
    }
}

fn required(rest: &str, reason: &str) -> Result<String, ParseError> {
    if rest.is_empty() {
        Err(ParseError::Syntax(reason.into()))
    } else {
        Ok(rest.to_string())
    }
}

fn no_args(rest: &str, command: Command) -> Result<Command, ParseError> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(ParseError::Syntax(format!("{} takes no arguments", command.name())))
    }
}

fn parse_auth(rest: &str) -> Result<Command, ParseError> {
    let mut parts = rest.split_whitespace();
    let name = parts
        .next()
        .ok_or_else(|| ParseError::Syntax("AUTH requires a mechanism".into()))?;
    let mechanism = AuthMechanism::parse(name)
        .ok_or_else(|| ParseError::Syntax(format!("unsupported mechanism {name}")))?;
    let initial_response = parts.next().map(str::to_string);
    if parts.next().is_some() {
        return Err(ParseError::Syntax("too many AUTH arguments".into()));
    }
    Ok(Command::Auth {
        mechanism,
        initial_response,
    })
}

/// Splits `KEYWORD:<path> params` after checking the keyword.
fn split_path<'a>(rest: &'a str, keyword: &str) -> Result<(&'a str, &'a str), ParseError> {
    let syntax = || ParseError::Syntax(format!("expected {keyword}:<address>"));
    let (head, tail) = rest.split_once(':').ok_or_else(syntax)?;
    if !head.trim().eq_ignore_ascii_case(keyword) {
        return Err(syntax());
    }
    let tail = tail.trim_start();
    let end = tail.find('>').ok_or_else(syntax)? + 1;
    Ok((&tail[..end], tail[end..].trim()))
}

fn parse_mail(rest: &str) -> Result<Command, ParseError> {
    let (path, params) = split_path(rest, "FROM")?;
    let from = parse_path(path).map_err(|e| ParseError::Syntax(e.to_string()))?;

    let mut body = None;
    let mut size = None;
    for param in params.split_whitespace() {
        let (key, value) = param.split_once('=').unwrap_or((param, ""));
        match key.to_ascii_uppercase().as_str() {
            "SIZE" => {
                size = Some(
                    value
                        .parse()
                        .map_err(|_| ParseError::Syntax(format!("invalid SIZE {value}")))?,
                );
            }
            "BODY" => body = Some(value.to_ascii_uppercase()),
            // SMTPUTF8, AUTH= and friends are accepted and ignored.
            _ => {}
        }
    }
    Ok(Command::MailFrom { from, body, size })
}

fn parse_rcpt(rest: &str) -> Result<Command, ParseError> {
    let (path, _params) = split_path(rest, "TO")?;
    match parse_path(path) {
        Ok(Some(to)) => Ok(Command::RcptTo { to }),
        Ok(None) => Err(ParseError::Syntax("null recipient".into())),
        Err(e) => Err(ParseError::Syntax(e.to_string())),
    }
}
