use super::data::{RawResponse, SmsRecord};
use super::decode::latin1;
use crate::error::ParseError;

pub const NUMBER_COMMAND: &str = "AT+CNUM";
pub const LIST_COMMAND: &str = "AT+CMGL=\"ALL\"";

const NUMBER_PREFIX: &str = "+CNUM:";
const LIST_PREFIX: &str = "+CMGL:";

/// Line of the `AT+CNUM` batch carrying the number. The batch still starts
/// with the echo and `OK` of the `AT+CMGF=1` sent while opening.
const NUMBER_LINE: usize = 3;

/// Batches shorter than this carry no message: echo, header, body, blank, `OK`.
const MIN_LIST_LINES: usize = 5;

/// Extracts the SIM's own number from an `AT+CNUM` response, e.g.
/// `+CNUM: "My Number","+49151XXXXXXX",145,7,4`.
pub fn parse_number(response: &RawResponse) -> Result<String, ParseError> {
    let is_number_line = |line: &String| line.trim_start().starts_with(NUMBER_PREFIX);
    let line = response
        .line(NUMBER_LINE)
        .map(latin1)
        .filter(is_number_line)
        .or_else(|| response.lines().map(latin1).find(is_number_line));

    let Some(line) = line else {
        if response.len() <= NUMBER_LINE {
            return Err(ParseError::TooShort {
                command: NUMBER_COMMAND,
                expected: NUMBER_LINE + 1,
                actual: response.len(),
            });
        }
        return Err(ParseError::MissingField {
            command: NUMBER_COMMAND,
            field: "+CNUM line",
            line: response.to_strings().join("|"),
        });
    };

    match line.split(',').nth(1).map(unquote) {
        Some(number) if !number.is_empty() => Ok(number.to_owned()),
        _ => Err(ParseError::MissingField {
            command: NUMBER_COMMAND,
            field: "number",
            line,
        }),
    }
}

/// Splits an `AT+CMGL="ALL"` response into messages.
///
/// The batch looks like
///
/// ```text
/// AT+CMGL="ALL"
/// +CMGL: 1,"REC UNREAD","+49172XXXXXXX","","21/03/05,14:20:52+04"
/// Test msg
///
/// +CMGL: 2,"REC READ","+49172XXXXXXX","","21/03/05,14:29:39+04"
/// Testing
///
/// OK
/// ```
///
/// Each message is parsed on its own so a malformed one does not hide the
/// others. Assumes a single body line per message.
pub fn parse_message_list(response: &RawResponse) -> Vec<Result<SmsRecord, ParseError>> {
    let lines = response.as_slice();
    if lines.len() < MIN_LIST_LINES {
        return Vec::new();
    }
    // Without the echo in front and the blank line plus `OK` at the end, the
    // last message also loses its separator.
    lines[1..lines.len() - 2]
        .chunks(3)
        .map(|message| match message {
            [header, body, ..] => parse_list_header(&latin1(header)).map(|(index, sender)| {
                SmsRecord {
                    index,
                    sender_number: sender,
                    raw_body: body.clone(),
                }
            }),
            header => Err(ParseError::MissingField {
                command: LIST_COMMAND,
                field: "body",
                line: header.first().map(|line| latin1(line)).unwrap_or_default(),
            }),
        })
        .collect()
}

/// Returns slot index and sender of a `+CMGL:` header line.
fn parse_list_header(line: &str) -> Result<(u32, String), ParseError> {
    let missing = |field| ParseError::MissingField {
        command: LIST_COMMAND,
        field,
        line: line.to_owned(),
    };
    let fields = line
        .trim_start()
        .strip_prefix(LIST_PREFIX)
        .ok_or_else(|| missing("+CMGL header"))?;
    let mut fields = fields.split(',');

    let index = fields.next().map(str::trim).unwrap_or_default();
    let index = index
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidIndex(index.to_owned()))?;
    let sender = fields.nth(1).map(unquote).ok_or_else(|| missing("sender"))?;
    Ok((index, sender.to_owned()))
}

fn unquote(field: &str) -> &str {
    field.trim().trim_matches('"')
}
