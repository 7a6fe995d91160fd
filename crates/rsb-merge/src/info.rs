//! Creation-date stamp in a bundle's XML property list.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

use crate::error::{MergeError, MergeResult};

const DATE_KEY: &str = "dateCreated";
const DATE: &[u8] = b"date";
const KEY: &[u8] = b"key";

/// Rewrite the `dateCreated` value of the plist at `path` to `now`.
///
/// Returns `false` when there is nothing to stamp: the file is absent, not
/// an XML plist, or has no `dateCreated` date.
pub fn stamp_creation_date(path: &Path, now: DateTime<Utc>) -> MergeResult<bool> {
    let text = match std::fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                debug!(path = %path.display(), "metadata is not an XML plist; not stamped");
                return Ok(false);
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no metadata file; not stamped");
            return Ok(false);
        }
        Err(source) => {
            return Err(MergeError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let Some(stamped) = replace_date(&text, &now.to_rfc3339_opts(SecondsFormat::Secs, true)) else {
        debug!(path = %path.display(), "no dateCreated date in metadata; not stamped");
        return Ok(false);
    };
    std::fs::write(path, stamped).map_err(|source| MergeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), %now, "stamped creation date");
    Ok(true)
}

/// Where the scan stands relative to the `dateCreated` entry.
enum Scan {
    Idle,
    /// Inside a `<key>`, collecting its text.
    Key(String),
    /// Just past the `dateCreated` key, waiting for its value element.
    AfterKey,
    /// Inside the `<date>` being replaced.
    Date,
}

/// Replace the text of the `<date>` element that is the value of the
/// `dateCreated` key. Every other event is written back unchanged.
///
/// Returns `None` if the document is not well-formed XML or has no such
/// date.
fn replace_date(text: &str, date: &str) -> Option<String> {
    let mut reader = Reader::from_str(text);
    let mut writer = Writer::new(Vec::with_capacity(text.len()));
    let mut state = Scan::Idle;
    let mut stamped = false;

    loop {
        let event = reader.read_event().ok()?;
        match &event {
            Event::Eof => break,
            Event::Start(e) if e.name().as_ref() == KEY => state = Scan::Key(String::new()),
            Event::Start(e) if matches!(state, Scan::AfterKey) => {
                state = if e.name().as_ref() == DATE {
                    Scan::Date
                } else {
                    Scan::Idle
                };
            }
            Event::Empty(e) if matches!(state, Scan::AfterKey) => {
                state = Scan::Idle;
                if e.name().as_ref() == DATE {
                    writer.write_event(Event::Start(BytesStart::new("date"))).ok()?;
                    writer.write_event(Event::Text(BytesText::new(date))).ok()?;
                    writer.write_event(Event::End(BytesEnd::new("date"))).ok()?;
                    stamped = true;
                    continue;
                }
            }
            Event::Text(t) => match &mut state {
                Scan::Key(buf) => buf.push_str(&t.unescape().ok()?),
                Scan::Date => continue,
                _ => {}
            },
            Event::End(e) => match std::mem::replace(&mut state, Scan::Idle) {
                Scan::Key(key) if e.name().as_ref() == KEY && !stamped && key == DATE_KEY => {
                    state = Scan::AfterKey;
                }
                Scan::Date => {
                    writer.write_event(Event::Text(BytesText::new(date))).ok()?;
                    stamped = true;
                }
                _ => {}
            },
            _ => {}
        }
        writer.write_event(event).ok()?;
    }

    if !stamped {
        return None;
    }
    String::from_utf8(writer.into_inner()).ok()
}
