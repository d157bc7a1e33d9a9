#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use sms_relay::error::DeliveryError;
use sms_relay::modem::SerialLink;
use sms_relay::webhook::WebhookPayload;
use sms_relay::{Connector, DecodedMessage, Notifier};

#[derive(Default)]
struct ModemState {
    replies: HashMap<String, Vec<u8>>,
    commands: Vec<String>,
    partial: Vec<u8>,
    pending: VecDeque<u8>,
    connects: usize,
    open_links: usize,
}

/// An in-memory modem answering commands with canned replies. Clones share
/// state, so a test keeps one handle while the connector owns another.
#[derive(Clone, Default)]
pub struct FakeModem(Arc<Mutex<ModemState>>);

impl FakeModem {
    /// A modem that answers the connection check and text mode switch.
    pub fn new() -> Self {
        Self::default()
            .reply("AT", &["AT", "OK"])
            .reply("AT+CMGF=1", &["AT+CMGF=1", "OK"])
    }

    /// Answers `command` with `lines`, each terminated by `\r\n`.
    pub fn reply(self, command: &str, lines: &[&str]) -> Self {
        let mut raw = Vec::new();
        for line in lines {
            raw.extend_from_slice(line.as_bytes());
            raw.extend_from_slice(b"\r\n");
        }
        self.reply_raw(command, raw)
    }

    pub fn reply_raw(self, command: &str, raw: impl Into<Vec<u8>>) -> Self {
        self.state().replies.insert(command.to_owned(), raw.into());
        self
    }

    /// `AT+CNUM` answer with the `AT+CMGF=1` leftovers real modems emit.
    pub fn with_number(self, number: &str) -> Self {
        let cnum = format!("+CNUM: \"Me\",\"{number}\",145,7,4");
        self.reply("AT+CNUM", &["+CMGF=1", "OK", "AT+CNUM", &cnum, "", "OK"])
    }

    /// `AT+CMGL="ALL"` answer listing `(index, sender, body)` messages.
    pub fn with_messages(self, messages: &[(u32, &str, &str)]) -> Self {
        let mut lines = vec!["AT+CMGL=\"ALL\"".to_owned()];
        for (index, sender, body) in messages {
            lines.push(format!(
                "+CMGL: {index},\"REC UNREAD\",\"{sender}\",\"\",\"21/03/05,14:20:52+04\""
            ));
            lines.push((*body).to_owned());
            lines.push(String::new());
        }
        if messages.is_empty() {
            lines.push(String::new());
        }
        lines.push("OK".to_owned());
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        self.reply("AT+CMGL=\"ALL\"", &lines)
    }

    /// Every command received so far, without the `\r`.
    pub fn commands(&self) -> Vec<String> {
        self.state().commands.clone()
    }

    /// Commands other than the check and text mode switch sent on every open.
    pub fn operations(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| c != "AT" && c != "AT+CMGF=1")
            .collect()
    }

    pub fn connects(&self) -> usize {
        self.state().connects
    }

    pub fn open_links(&self) -> usize {
        self.state().open_links
    }

    fn state(&self) -> MutexGuard<'_, ModemState> {
        self.0.lock().unwrap()
    }
}

struct FakeLink(FakeModem);

impl Read for FakeLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.0.state();
        if state.pending.is_empty() {
            return Err(io::ErrorKind::TimedOut.into());
        }
        let n = buf.len().min(state.pending.len());
        for (slot, byte) in buf.iter_mut().zip(state.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for FakeLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.0.state();
        for &byte in buf {
            if byte != b'\r' {
                state.partial.push(byte);
                continue;
            }
            let command = String::from_utf8_lossy(&state.partial).into_owned();
            state.partial.clear();
            if let Some(reply) = state.replies.get(&command).cloned() {
                state.pending.extend(reply);
            }
            state.commands.push(command);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SerialLink for FakeLink {
    fn clear_buffers(&mut self) -> io::Result<()> {
        let mut state = self.0.state();
        state.pending.clear();
        state.partial.clear();
        Ok(())
    }
}

impl Drop for FakeLink {
    fn drop(&mut self) {
        self.0.state().open_links -= 1;
    }
}

/// Hands out links to fake modems by interface path.
#[derive(Default)]
pub struct FakeConnector {
    modems: HashMap<String, FakeModem>,
}

impl FakeConnector {
    pub fn with(mut self, interface: &str, modem: &FakeModem) -> Self {
        self.modems.insert(interface.to_owned(), modem.clone());
        self
    }
}

impl Connector for FakeConnector {
    fn connect(&self, interface: &str) -> io::Result<Box<dyn SerialLink>> {
        let modem = self
            .modems
            .get(interface)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such device"))?;
        {
            let mut state = modem.state();
            state.connects += 1;
            state.open_links += 1;
        }
        Ok(Box::new(FakeLink(modem.clone())))
    }
}

/// Lets the first `allowed` connects through, across all modems, then
/// refuses every further one like a device that vanished mid-run.
pub struct FailingAfter {
    inner: FakeConnector,
    allowed: usize,
    attempts: Cell<usize>,
}

impl FailingAfter {
    pub fn new(inner: FakeConnector, allowed: usize) -> Self {
        Self {
            inner,
            allowed,
            attempts: Cell::new(0),
        }
    }
}

impl Connector for FailingAfter {
    fn connect(&self, interface: &str) -> io::Result<Box<dyn SerialLink>> {
        let attempt = self.attempts.get() + 1;
        self.attempts.set(attempt);
        if attempt > self.allowed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        self.inner.connect(interface)
    }
}

/// Records deliveries; messages whose text is in `failing` are refused.
#[derive(Default)]
pub struct RecordingNotifier {
    delivered: RefCell<Vec<(String, WebhookPayload)>>,
    failing: HashSet<String>,
}

impl RecordingNotifier {
    pub fn failing_on(texts: &[&str]) -> Self {
        Self {
            failing: texts.iter().map(|t| (*t).to_owned()).collect(),
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<(String, WebhookPayload)> {
        self.delivered.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn deliver(&self, url: &str, message: &DecodedMessage) -> Result<(), DeliveryError> {
        if self.failing.contains(&message.text) {
            return Err(DeliveryError {
                url: url.to_owned(),
                source: "503 Service Unavailable".into(),
            });
        }
        self.delivered
            .borrow_mut()
            .push((url.to_owned(), WebhookPayload::from(message)));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with a subscriber collecting formatted log lines.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8_lossy(&logs.0.lock().unwrap()).into_owned();
    (out, text)
}
