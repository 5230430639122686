use serde_json::Value;

/// One classified line from the serial stream.
#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent {
    /// The line decoded as a JSON document.
    Structured(Value),
    /// The line as opaque text, trimmed of surrounding whitespace.
    Raw(String),
}

/// Classify one framed line.
///
/// The line is trimmed first; a line that is empty after trimming produces
/// no event. Anything that parses as JSON (object, array, or scalar) is
/// `Structured`; everything else is `Raw`. Classification never fails.
pub fn classify(line: &str) -> Option<LineEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(line) {
        Ok(value) => Some(LineEvent::Structured(value)),
        Err(_) => Some(LineEvent::Raw(line.to_string())),
    }
}
