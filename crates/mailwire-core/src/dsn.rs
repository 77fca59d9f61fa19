//! Delivery-status report parsing (RFC 3464).
//!
//! A bounce arrives as `multipart/report; report-type=delivery-status`
//! with a `message/delivery-status` part whose body is groups of header
//! fields separated by blank lines: the first group describes the
//! reporting message, each following group one recipient.

use std::collections::HashMap;

use mailparse::ParsedMail;

use crate::error::{Error, Result};

/// Disposition reported for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DsnAction {
    /// Delivery failed.
    Failed,
    /// Delivery is delayed; further reports may follow.
    Delayed,
    /// Delivered successfully.
    Delivered,
    /// Relayed to a system that will not report further.
    Relayed,
    /// Expanded to multiple recipients.
    Expanded,
    /// Unrecognized action token.
    Other(String),
}

impl DsnAction {
    fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "failed" => Self::Failed,
            "delayed" => Self::Delayed,
            "delivered" => Self::Delivered,
            "relayed" => Self::Relayed,
            "expanded" => Self::Expanded,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Per-message fields of a delivery-status report.
#[derive(Debug, Clone, Default)]
pub struct MessageFields {
    /// Reporting-MTA value.
    pub reporting_mta: Option<String>,
    /// Received-From-MTA value.
    pub received_from_mta: Option<String>,
    /// Original-Envelope-Id value.
    pub original_envelope_id: Option<String>,
    /// Arrival-Date value, as transmitted.
    pub arrival_date: Option<String>,
    /// Unrecognized fields, lowercased names.
    pub extra: HashMap<String, String>,
}

/// Per-recipient fields of a delivery-status report.
#[derive(Debug, Clone, Default)]
pub struct RecipientFields {
    /// Original-Recipient value.
    pub original_recipient: Option<String>,
    /// Final-Recipient value.
    pub final_recipient: Option<String>,
    /// Action field.
    pub action: Option<DsnAction>,
    /// Status field (`class.subject.detail`).
    pub status: Option<String>,
    /// Remote-MTA value.
    pub remote_mta: Option<String>,
    /// Diagnostic-Code value.
    pub diagnostic_code: Option<String>,
    /// Last-Attempt-Date value.
    pub last_attempt_date: Option<String>,
    /// Final-Log-ID value.
    pub final_log_id: Option<String>,
    /// Will-Retry-Until value.
    pub will_retry_until: Option<String>,
    /// Unrecognized fields, lowercased names.
    pub extra: HashMap<String, String>,
}

/// A parsed delivery-status report.
#[derive(Debug, Clone, Default)]
pub struct DeliveryStatusReport {
    /// Fields describing the reported message.
    pub message: MessageFields,
    /// One entry per recipient.
    pub recipients: Vec<RecipientFields>,
}

/// Parses a full `multipart/report` message.
///
/// # Errors
///
/// Returns an error when the input is not parseable MIME or carries no
/// `message/delivery-status` part.
pub fn parse_delivery_status(raw: &[u8]) -> Result<DeliveryStatusReport> {
    let mail = mailparse::parse_mail(raw)?;
    let part = find_status_part(&mail).ok_or_else(|| {
        Error::MalformedReport("no message/delivery-status part found".to_string())
    })?;
    let body = part.get_body()?;
    parse_status_body(&body)
}

/// Parses the body of a `message/delivery-status` part directly.
///
/// # Errors
///
/// Returns an error when no field groups are present.
pub fn parse_status_body(body: &str) -> Result<DeliveryStatusReport> {
    let groups = split_groups(body);
    let mut iter = groups.into_iter();

    let Some(first) = iter.next() else {
        return Err(Error::MalformedReport("empty delivery-status body".to_string()));
    };

    let mut report = DeliveryStatusReport {
        message: parse_message_group(&first),
        recipients: Vec::new(),
    };
    for group in iter {
        report.recipients.push(parse_recipient_group(&group));
    }
    Ok(report)
}

fn find_status_part<'a, 'b>(mail: &'a ParsedMail<'b>) -> Option<&'a ParsedMail<'b>> {
    if mail.ctype.mimetype.eq_ignore_ascii_case("message/delivery-status") {
        return Some(mail);
    }
    mail.subparts.iter().find_map(find_status_part)
}

/// Splits on blank lines into groups of unfolded `Name: value` fields.
fn split_groups(body: &str) -> Vec<Vec<(String, String)>> {
    let mut groups = Vec::new();
    let mut current: Vec<(String, String)> = Vec::new();

    for line in body.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            continue;
        }
        // Folded continuation line.
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = current.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            current.push((name.trim().to_lowercase(), value.trim().to_string()));
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

fn parse_message_group(fields: &[(String, String)]) -> MessageFields {
    let mut message = MessageFields::default();
    for (name, value) in fields {
        match name.as_str() {
            "reporting-mta" => message.reporting_mta = Some(value.clone()),
            "received-from-mta" => message.received_from_mta = Some(value.clone()),
            "original-envelope-id" => message.original_envelope_id = Some(value.clone()),
            "arrival-date" => message.arrival_date = Some(value.clone()),
            _ => {
                message.extra.insert(name.clone(), value.clone());
            }
        }
    }
    message
}

fn parse_recipient_group(fields: &[(String, String)]) -> RecipientFields {
    let mut recipient = RecipientFields::default();
    for (name, value) in fields {
        match name.as_str() {
            "original-recipient" => recipient.original_recipient = Some(value.clone()),
            "final-recipient" => recipient.final_recipient = Some(value.clone()),
            "action" => recipient.action = Some(DsnAction::parse(value)),
            "status" => recipient.status = Some(value.clone()),
            "remote-mta" => recipient.remote_mta = Some(value.clone()),
            "diagnostic-code" => recipient.diagnostic_code = Some(value.clone()),
            "last-attempt-date" => recipient.last_attempt_date = Some(value.clone()),
            "final-log-id" => recipient.final_log_id = Some(value.clone()),
            "will-retry-until" => recipient.will_retry_until = Some(value.clone()),
            _ => {
                recipient.extra.insert(name.clone(), value.clone());
            }
        }
    }
    recipient
}

/// Extracts headers from a raw header block, used by summary assembly.
///
/// # Errors
///
/// Returns an error when the block is not parseable.
pub fn parse_header_block(raw: &[u8]) -> Result<Vec<(String, String)>> {
    let (headers, _) = mailparse::parse_headers(raw)?;
    Ok(headers
        .iter()
        .map(|h| (h.get_key(), h.get_value()))
        .collect())
}
