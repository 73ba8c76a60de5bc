//! `.properties` format support.

use crate::error::{Error, Result};
use crate::formatter::{extension_matches, Formatter};
use crate::registry::RegisteredFormatter;
use crate::source::PropertySource;
use indexmap::IndexMap;
use std::borrow::Cow;

inventory::submit! { RegisteredFormatter::new(0, &PropertiesFormatter) }

const MALFORMED_UNICODE: &str = "Malformed \\uxxxx encoding.";

/// Formatter for line-oriented `key=value` files.
///
/// Supports `#`/`!` comment lines, `=`, `:` or whitespace separators,
/// `\` line continuations and escapes, `\uXXXX` escapes, and expands
/// `name[]=a,b,c` into `name[0]`, `name[1]`, `name[2]`. A file without any
/// entries yields no source.
pub struct PropertiesFormatter;

impl Formatter for PropertiesFormatter {
    fn provides(&self, identifier: &str) -> bool {
        extension_matches(identifier, self.extensions())
    }

    fn extensions(&self) -> &[&str] {
        &["properties"]
    }

    fn deserialize(&self, name: &str, content: &[u8]) -> Result<Vec<PropertySource>> {
        let text = decode(content);
        let properties = parse(&text).map_err(|e| Error::parse("properties", name, e))?;
        if properties.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![PropertySource::new(name, properties)])
    }

    fn name(&self) -> &str {
        "properties"
    }
}

/// Properties files are read as UTF-8, falling back to ISO-8859-1 when the
/// bytes are not valid UTF-8.
fn decode(content: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(content) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(content.iter().map(|&b| char::from(b)).collect()),
    }
}

type ReadResult<T> = std::result::Result<T, &'static str>;

fn parse(content: &str) -> ReadResult<IndexMap<String, String>> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let mut reader = CharacterReader::new(&normalized);
    let mut result = IndexMap::new();
    let mut buffer = String::new();

    while reader.read()? {
        let key = load_key(&mut buffer, &mut reader)?.trim().to_string();
        if let Some(list_key) = key.strip_suffix("[]") {
            let mut index = 0;
            loop {
                let value = load_value(&mut buffer, &mut reader, true)?;
                put(&mut result, format!("{list_key}[{index}]"), value);
                index += 1;
                if !reader.is_end_of_line() {
                    reader.read()?;
                }
                if reader.is_end_of_line() {
                    break;
                }
            }
        } else {
            let value = load_value(&mut buffer, &mut reader, false)?;
            put(&mut result, key, value);
        }
    }
    Ok(result)
}

fn put(result: &mut IndexMap<String, String>, key: String, value: String) {
    if !key.is_empty() {
        result.insert(key, value);
    }
}

fn load_key(buffer: &mut String, reader: &mut CharacterReader) -> ReadResult<String> {
    buffer.clear();
    let mut previous_whitespace = false;
    while !reader.is_end_of_line() {
        if reader.is_property_delimiter() {
            reader.read()?;
            return Ok(buffer.clone());
        }
        if !reader.is_whitespace() && previous_whitespace {
            return Ok(buffer.clone());
        }
        previous_whitespace = reader.is_whitespace();
        buffer.extend(reader.character);
        reader.read()?;
    }
    Ok(buffer.clone())
}

fn load_value(
    buffer: &mut String,
    reader: &mut CharacterReader,
    split_lists: bool,
) -> ReadResult<String> {
    buffer.clear();
    while reader.is_whitespace() && !reader.is_end_of_line() {
        reader.read()?;
    }
    while !reader.is_end_of_line() && !(split_lists && reader.is_list_delimiter()) {
        buffer.extend(reader.character);
        reader.read()?;
    }
    Ok(buffer.clone())
}

/// Character cursor that skips comments, joins continued lines and decodes
/// `\` escapes. `character` is `None` at end of input.
struct CharacterReader {
    chars: Vec<char>,
    position: usize,
    column: isize,
    escaped: bool,
    character: Option<char>,
}

impl CharacterReader {
    fn new(content: &str) -> Self {
        Self {
            chars: content.chars().collect(),
            position: 0,
            column: -1,
            escaped: false,
            character: None,
        }
    }

    fn next_raw(&mut self) -> Option<char> {
        let c = self.chars.get(self.position).copied();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn read(&mut self) -> ReadResult<bool> {
        self.read_wrapped(false)
    }

    fn read_wrapped(&mut self, wrapped_line: bool) -> ReadResult<bool> {
        loop {
            self.escaped = false;
            self.character = self.next_raw();
            self.column += 1;
            if self.column != 0 {
                break;
            }
            self.skip_leading_whitespace();
            if wrapped_line || !matches!(self.character, Some('#') | Some('!')) {
                break;
            }
            while !matches!(self.character, Some('\n') | None) {
                self.character = self.next_raw();
            }
            if self.character.is_none() {
                break;
            }
            self.column = -1;
        }

        match self.character {
            Some('\\') => {
                self.escaped = true;
                self.read_escaped()?;
            }
            Some('\n') => self.column = -1,
            _ => {}
        }
        Ok(!self.is_end_of_file())
    }

    fn skip_leading_whitespace(&mut self) {
        while self.is_whitespace() {
            self.character = self.next_raw();
            self.column += 1;
        }
    }

    fn read_escaped(&mut self) -> ReadResult<()> {
        self.character = self.next_raw();
        match self.character {
            Some('t') => self.character = Some('\t'),
            Some('r') => self.character = Some('\r'),
            Some('n') => self.character = Some('\n'),
            Some('f') => self.character = Some('\u{000C}'),
            Some('\n') => {
                self.column = -1;
                self.read_wrapped(true)?;
            }
            Some('u') => self.read_unicode()?,
            _ => {}
        }
        Ok(())
    }

    fn read_unicode(&mut self) -> ReadResult<()> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .next_raw()
                .and_then(|c| c.to_digit(16))
                .ok_or(MALFORMED_UNICODE)?;
            code = (code << 4) + digit;
        }
        self.character = Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
        Ok(())
    }

    fn is_whitespace(&self) -> bool {
        !self.escaped && matches!(self.character, Some(' ') | Some('\t') | Some('\u{000C}'))
    }

    fn is_end_of_file(&self) -> bool {
        self.character.is_none()
    }

    fn is_end_of_line(&self) -> bool {
        match self.character {
            None => true,
            Some('\n') => !self.escaped,
            Some(_) => false,
        }
    }

    fn is_list_delimiter(&self) -> bool {
        !self.escaped && self.character == Some(',')
    }

    fn is_property_delimiter(&self) -> bool {
        !self.escaped && matches!(self.character, Some('=') | Some(':'))
    }
}
