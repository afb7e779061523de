use super::values::{ValueResourceXmlParser, XmlToken};
use crate::resources::ResourceError;
use quick_xml::escape::escape;

/// Plain text of an element plus its raw XML when it contains markup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedText {
    pub text: String,
    pub raw_xml: Option<String>,
}

/// Collect the content of the element the parser is positioned on and
/// leave the parser on its end tag.
///
/// Text inside nested tags (`<xliff:g>`, `<b>`...) is part of the plain
/// text. With `with_raw_xml`, the content is also reproduced as XML and
/// returned when it holds anything besides plain text.
pub fn extract_text(parser: &mut ValueResourceXmlParser, with_raw_xml: bool) -> Result<ExtractedText, ResourceError> {
    let start_depth = parser.depth();
    let mut text = String::new();
    let mut raw_xml = String::new();
    let mut has_markup = false;

    loop {
        match parser.next_token()? {
            XmlToken::StartTag => {
                has_markup = true;
                if with_raw_xml {
                    raw_xml.push('<');
                    raw_xml.push_str(parser.raw_tag());
                    raw_xml.push('>');
                }
            }
            XmlToken::EndTag => {
                if parser.depth() <= start_depth {
                    break;
                }
                if with_raw_xml {
                    raw_xml.push_str("</");
                    if let Some(prefix) = parser.prefix() {
                        raw_xml.push_str(prefix);
                        raw_xml.push(':');
                    }
                    raw_xml.push_str(parser.name());
                    raw_xml.push('>');
                }
            }
            XmlToken::Text => {
                text.push_str(parser.text());
                if with_raw_xml {
                    raw_xml.push_str(&escape(parser.text()));
                }
            }
            XmlToken::CData => {
                has_markup = true;
                text.push_str(parser.text());
                if with_raw_xml {
                    raw_xml.push_str("<![CDATA[");
                    raw_xml.push_str(parser.text());
                    raw_xml.push_str("]]>");
                }
            }
            XmlToken::EndDocument => break,
            _ => {}
        }
    }

    Ok(ExtractedText {
        text: unescape_resource_string(&text, true),
        raw_xml: (with_raw_xml && has_markup).then_some(raw_xml),
    })
}

/// Decode the aapt escaping rules of a resource string.
///
/// Outside of double quotes, runs of whitespace collapse into one space;
/// quotes themselves are dropped. Backslash escapes `\n`, `\t` and
/// `\uXXXX` are decoded and any other escaped character is kept literally.
/// With `trim`, leading and trailing unescaped whitespace is removed.
pub fn unescape_resource_string(s: &str, trim: bool) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut start = 0;
    let mut end = chars.len();

    if trim {
        while start < end && chars[start].is_whitespace() {
            start += 1;
        }
        while end > start && chars[end - 1].is_whitespace() {
            end -= 1;
        }
        // Keep a trailing whitespace character that is escaped
        if end < chars.len() && ends_with_odd_backslashes(&chars[start..end]) {
            end += 1;
        }
    }

    let mut out = String::with_capacity(end - start);
    let mut quoted = false;
    let mut in_whitespace = false;
    let mut i = start;

    while i < end {
        let c = chars[i];
        if c == '\\' && i + 1 < end {
            in_whitespace = false;
            i += 1;
            match chars[i] {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'u' => match decode_unicode_escape(&chars[i + 1..end]) {
                    Some(decoded) => {
                        out.push(decoded);
                        i += 4;
                    }
                    None => out.push('u'),
                },
                other => out.push(other),
            }
        } else if c == '"' {
            quoted = !quoted;
            in_whitespace = false;
        } else if !quoted && c.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
                in_whitespace = true;
            }
        } else {
            out.push(c);
            in_whitespace = false;
        }
        i += 1;
    }

    out
}

fn ends_with_odd_backslashes(chars: &[char]) -> bool {
    chars.iter().rev().take_while(|c| **c == '\\').count() % 2 == 1
}

fn decode_unicode_escape(chars: &[char]) -> Option<char> {
    if chars.len() < 4 {
        return None;
    }
    let hex: String = chars[..4].iter().collect();
    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
}
