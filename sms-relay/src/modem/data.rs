use super::decode::latin1;

/// The lines a modem emitted for one command, terminators stripped.
///
/// Order matters: the parsers address lines by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    lines: Vec<Vec<u8>>,
}

impl RawResponse {
    /// Splits a byte stream on `\n`, dropping any trailing `\r`s from each line.
    /// A final fragment without terminator is kept if it is not empty.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut lines: Vec<Vec<u8>> = bytes
            .split(|&b| b == b'\n')
            .map(|line| {
                let end = line
                    .iter()
                    .rposition(|&b| b != b'\r')
                    .map_or(0, |pos| pos + 1);
                line[..end].to_vec()
            })
            .collect();
        // split() always yields a last element; it is empty when the stream
        // ended on a terminator.
        if bytes.last().map_or(true, |&b| b == b'\n') {
            lines.pop();
        }
        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> Option<&[u8]> {
        self.lines.get(index).map(Vec::as_slice)
    }

    pub fn lines(&self) -> impl Iterator<Item = &[u8]> {
        self.lines.iter().map(Vec::as_slice)
    }

    pub fn as_slice(&self) -> &[Vec<u8>] {
        &self.lines
    }

    /// True if any line contains `token`.
    pub fn contains_token(&self, token: &str) -> bool {
        self.lines().any(|line| latin1(line).contains(token))
    }

    /// Latin-1 rendering of every line, for logs and errors.
    pub fn to_strings(&self) -> Vec<String> {
        self.lines().map(latin1).collect()
    }
}

impl<L: Into<Vec<u8>>> FromIterator<L> for RawResponse {
    fn from_iter<I: IntoIterator<Item = L>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Who a modem is: the serial device and the number of its SIM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModemIdentity {
    pub interface: String,
    pub number: String,
}

/// One stored message as listed by `AT+CMGL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsRecord {
    /// Storage slot on the SIM, used to delete the message.
    pub index: u32,
    pub sender_number: String,
    /// Body line exactly as the modem sent it.
    pub raw_body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    pub sender_number: String,
    pub text: String,
}
