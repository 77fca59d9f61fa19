//! SMTP reply parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses an SMTP reply from its response lines.
///
/// Replies are single-line (`250 OK`) or multi-line (`250-...` repeated,
/// ending with `250 ...`).
///
/// # Errors
///
/// Returns an error if any line is malformed or the codes disagree.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    if lines.is_empty() {
        return Err(Error::Protocol("empty reply".into()));
    }

    let code = parse_code(&lines[0])?;
    let mut message = Vec::with_capacity(lines.len());

    for line in lines {
        let line_code = parse_code(line)?;
        if line_code != code {
            return Err(Error::Protocol(format!(
                "inconsistent codes in multi-line reply: {} vs {}",
                code.as_u16(),
                line_code.as_u16()
            )));
        }
        message.push(line.get(4..).unwrap_or("").to_string());
    }

    Ok(Reply::new(code, message))
}

fn parse_code(line: &str) -> Result<ReplyCode> {
    if line.len() < 3 {
        return Err(Error::Protocol(format!("reply too short: {line:?}")));
    }
    let code: u16 = line[..3]
        .parse()
        .map_err(|_| Error::Protocol(format!("invalid reply code: {line:?}")))?;
    Ok(ReplyCode::new(code))
}

/// True when `line` completes a reply (`NNN ` or a bare `NNN`).
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    line.len() == 3 || (line.len() >= 4 && line.as_bytes()[3] == b' ')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let reply = parse_reply(&["250 OK".to_string()]).unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(reply.message, vec!["OK"]);
    }

    #[test]
    fn multi_line() {
        let reply = parse_reply(&[
            "250-mail.example.com".to_string(),
            "250-PIPELINING".to_string(),
            "250 SIZE 1000".to_string(),
        ])
        .unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(reply.message.len(), 3);
        assert_eq!(reply.message[1], "PIPELINING");
    }

    #[test]
    fn bare_code_line() {
        let reply = parse_reply(&["250".to_string()]).unwrap();
        assert_eq!(reply.message, vec![""]);
    }

    #[test]
    fn inconsistent_codes_rejected() {
        let result = parse_reply(&["250-ok".to_string(), "550 not ok".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_rejected() {
        assert!(parse_reply(&[]).is_err());
        assert!(parse_reply(&["25".to_string()]).is_err());
        assert!(parse_reply(&["ABC no".to_string()]).is_err());
    }

    #[test]
    fn last_line_detection() {
        assert!(is_last_reply_line("250 OK"));
        assert!(is_last_reply_line("250"));
        assert!(!is_last_reply_line("250-more"));
    }
}
