//! Mod-256 Checksum
//!
//! The checksum is the byte sum of every `tag=value<delimiter>` segment except
//! the checksum field itself, reduced mod 256 and rendered as three digits.

use crate::protocol_constants::tags;

/// Sum of the bytes of one rendered field, including its delimiter
fn field_sum(tag: &str, value: &str, delimiter: char) -> u32 {
    let mut buf = [0u8; 4];
    let delimiter_bytes = delimiter.encode_utf8(&mut buf).as_bytes();
    tag.bytes()
        .chain(std::iter::once(b'='))
        .chain(value.bytes())
        .chain(delimiter_bytes.iter().copied())
        .fold(0u32, |acc, b| acc.wrapping_add(b as u32))
}

/// Calculate the checksum over ordered fields, skipping tag 10
pub fn calculate<'a, I>(fields: I, delimiter: char) -> u8
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let sum = fields
        .into_iter()
        .filter(|(tag, _)| *tag != tags::CHECKSUM)
        .fold(0u32, |acc, (tag, value)| acc.wrapping_add(field_sum(tag, value, delimiter)));
    (sum % 256) as u8
}

/// Render a checksum the way it appears on the wire
pub fn format(checksum: u8) -> String {
    format!("{:03}", checksum)
}

/// Verify a transmitted checksum value against ordered fields
pub fn verify<'a, I>(fields: I, delimiter: char, transmitted: &str) -> bool
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    transmitted == format(calculate(fields, delimiter))
}

/// Whether `body` (a segment without its delimiter) is a checksum field
pub fn is_checksum_field(body: &str) -> bool {
    body.strip_prefix("10=")
        .is_some_and(|digits| digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit()))
}
