//! SOAP 1.1 framing for the `readCustomerSubscriptions` operation.
//!
//! Envelopes are written with `quick_xml::Writer`; responses are read in a
//! single streaming pass that either finds a `Fault` or collects every
//! `customerSubscriptions` element below the response wrapper.

use crate::config::Credentials;
use crate::errors::LookupError;
use crate::models::{LookupRequest, SubscriptionField, SubscriptionRecord};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

pub const OPERATION: &str = "readCustomerSubscriptions";
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const CONTENT_TYPE: &str = "text/xml; charset=utf-8";
/// The binding declares an empty SOAP action.
pub const SOAP_ACTION: &str = "\"\"";

const RECORD_ELEMENT: &str = "customerSubscriptions";

/// A fault raised by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFault {
    /// `faultcode` (1.1) or `Code/Value` (1.2), when present.
    pub fault_code: Option<String>,
    /// `faultstring` (1.1) or `Reason/Text` (1.2).
    pub message: String,
}

impl SoapFault {
    /// Adapter-level code: the message up to the first colon.
    pub fn code(&self) -> &str {
        fault_code(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoapResponse {
    Subscriptions(Vec<SubscriptionRecord>),
    Fault(SoapFault),
}

/// Leading segment of a fault message, up to (not including) the first colon.
pub fn fault_code(message: &str) -> &str {
    message
        .split_once(':')
        .map_or(message, |(code, _)| code)
        .trim()
}

/// Writes the request envelope for `request`.
///
/// Only `username`, `password` and `mandatorId` are taken from the
/// credentials; the other account identifiers are never sent.
pub fn build_envelope(
    namespace: &str,
    credentials: &Credentials,
    request: &LookupRequest,
) -> Result<String, LookupError> {
    let mut writer = Writer::new(Vec::new());

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_failed)?;
    writer
        .write_event(Event::Start(BytesStart::new("SOAP-ENV:Envelope").with_attributes([
            ("xmlns:SOAP-ENV", SOAP_ENV_NS),
            ("xmlns:ns1", namespace),
        ])))
        .map_err(write_failed)?;
    writer
        .write_event(Event::Start(BytesStart::new("SOAP-ENV:Body")))
        .map_err(write_failed)?;

    let wrapper = format!("ns1:{}", OPERATION);
    writer
        .write_event(Event::Start(BytesStart::new(wrapper.as_str())))
        .map_err(write_failed)?;

    let mut fields: Vec<(&str, &str)> = vec![
        ("username", credentials.username.as_str()),
        ("password", credentials.password.as_str()),
        ("mandatorId", credentials.mandator_id.as_str()),
    ];
    fields.extend(request.key_fields());
    fields.push(("filterLogic", request.filter_logic().as_str()));

    for (name, value) in fields {
        writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(write_failed)?;
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(write_failed)?;
        writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(write_failed)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(wrapper.as_str())))
        .map_err(write_failed)?;
    writer
        .write_event(Event::End(BytesEnd::new("SOAP-ENV:Body")))
        .map_err(write_failed)?;
    writer
        .write_event(Event::End(BytesEnd::new("SOAP-ENV:Envelope")))
        .map_err(write_failed)?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| LookupError::InternalError(format!("SOAP envelope is not UTF-8: {}", e)))
}

fn write_failed(err: impl std::fmt::Display) -> LookupError {
    LookupError::InternalError(format!("Failed to write SOAP envelope: {}", err))
}

struct RecordBuilder {
    start: usize,
    depth: usize,
    path: Vec<String>,
    fields: Vec<SubscriptionField>,
    // Last field is still receiving text (split by a comment or CDATA).
    text_open: bool,
}

#[derive(Default)]
struct FaultBuilder {
    code: Option<String>,
    message: Option<String>,
}

fn append_text(slot: &mut Option<String>, text: &str) {
    slot.get_or_insert_with(String::new).push_str(text);
}

/// Reads a response body into either a fault or the list of subscriptions.
pub fn parse_response(xml: &str) -> Result<SoapResponse, LookupError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut body_depth: Option<usize> = None;
    let mut fault: Option<FaultBuilder> = None;
    let mut current: Option<RecordBuilder> = None;
    let mut records = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(e.local_name().as_ref());
                let in_body = body_depth.is_some_and(|d| stack.len() > d);
                if let Some(record) = current.as_mut() {
                    record.path.push(name.clone());
                    record.text_open = false;
                } else if in_body && fault.is_none() && name == RECORD_ELEMENT {
                    current = Some(RecordBuilder {
                        start: before,
                        depth: stack.len(),
                        path: Vec::new(),
                        fields: Vec::new(),
                        text_open: false,
                    });
                } else if in_body && name == "Fault" {
                    fault = Some(FaultBuilder::default());
                } else if body_depth.is_none() && name == "Body" {
                    body_depth = Some(stack.len());
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = local_name(e.local_name().as_ref());
                let in_body = body_depth.is_some_and(|d| stack.len() > d);
                if let Some(record) = current.as_mut() {
                    record.text_open = false;
                }
                if current.is_none() && in_body && fault.is_none() && name == RECORD_ELEMENT {
                    let end = reader.buffer_position() as usize;
                    records.push(SubscriptionRecord {
                        raw_xml: slice(xml, before, end),
                        fields: Vec::new(),
                    });
                } else if current.is_none() && in_body && name == "Fault" {
                    fault = Some(FaultBuilder::default());
                } else if body_depth.is_none() && name == "Body" {
                    // An empty body still counts as a well-formed, empty answer.
                    body_depth = Some(stack.len());
                }
            }
            Event::Text(t) => {
                let text = t.unescape()?.into_owned();
                collect_text(&stack, &mut current, &mut fault, text);
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                collect_text(&stack, &mut current, &mut fault, text);
            }
            Event::End(_) => {
                stack.pop();
                let finished = match current.as_mut() {
                    Some(record) if record.path.is_empty() && stack.len() == record.depth => true,
                    Some(record) => {
                        record.path.pop();
                        record.text_open = false;
                        false
                    }
                    None => false,
                };
                if finished {
                    if let Some(record) = current.take() {
                        let end = reader.buffer_position() as usize;
                        records.push(SubscriptionRecord {
                            raw_xml: slice(xml, record.start, end),
                            fields: record.fields,
                        });
                    }
                }
            }
            Event::Eof => {
                if !stack.is_empty() || current.is_some() {
                    return Err(LookupError::InvalidResponse(
                        "truncated SOAP response".to_string(),
                    ));
                }
                break;
            }
            _ => {}
        }
    }

    if let Some(fault) = fault {
        let message = fault
            .message
            .or_else(|| fault.code.clone())
            .unwrap_or_default();
        return Ok(SoapResponse::Fault(SoapFault {
            fault_code: fault.code,
            message,
        }));
    }

    if body_depth.is_none() {
        return Err(LookupError::InvalidResponse(
            "response has no SOAP Body".to_string(),
        ));
    }

    Ok(SoapResponse::Subscriptions(records))
}

fn collect_text(
    stack: &[String],
    current: &mut Option<RecordBuilder>,
    fault: &mut Option<FaultBuilder>,
    text: String,
) {
    if let Some(record) = current.as_mut() {
        match record.fields.last_mut() {
            Some(field) if record.text_open => field.value.push_str(&text),
            _ => record.fields.push(SubscriptionField {
                path: record.path.join("/"),
                value: text,
            }),
        }
        record.text_open = true;
        return;
    }

    let Some(fault) = fault.as_mut() else {
        return;
    };
    let leaf = stack.last().map(String::as_str).unwrap_or_default();
    let parent = stack
        .len()
        .checked_sub(2)
        .and_then(|i| stack.get(i))
        .map(String::as_str)
        .unwrap_or_default();

    match (parent, leaf) {
        (_, "faultstring") | ("Reason", "Text") => append_text(&mut fault.message, &text),
        (_, "faultcode") | ("Code", "Value") => append_text(&mut fault.code, &text),
        _ => {}
    }
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn slice(xml: &str, start: usize, end: usize) -> String {
    xml.get(start..end).unwrap_or_default().trim().to_string()
}
