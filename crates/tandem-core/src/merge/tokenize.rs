//! Turning markup or line text into token sequences

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::token::{is_self_closing, Token};
use crate::error::{Error, Result};

/// Tokenize markup into open-tag / close-tag / text tokens.
///
/// Tag and attribute names are lowercased. Close tags of self-closing names
/// are dropped, and `<x/>` on a regular name yields an open and a close token.
/// Comments, processing instructions and doctypes are skipped.
pub fn tokenize_markup(markup: &str) -> Result<Vec<Token>> {
    let mut reader = Reader::from_str(markup);
    reader.trim_text(false);
    reader.check_end_names(false);

    let mut tokens = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => tokens.push(open_token(&start)?),
            Ok(Event::Empty(start)) => {
                let token = open_token(&start)?;
                let close = match &token {
                    Token::Open { name, .. } if !is_self_closing(name) => {
                        Some(Token::close(name.clone()))
                    }
                    _ => None,
                };
                tokens.push(token);
                tokens.extend(close);
            }
            Ok(Event::End(end)) => {
                let name = lowercase(end.name().as_ref());
                if !is_self_closing(&name) {
                    tokens.push(Token::Close { name });
                }
            }
            Ok(Event::Text(text)) => push_text(&mut tokens, &String::from_utf8_lossy(&text)),
            Ok(Event::CData(data)) => push_text(
                &mut tokens,
                &format!("<![CDATA[{}]]>", String::from_utf8_lossy(&data)),
            ),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => {
                return Err(Error::Merge(format!(
                    "malformed markup near byte {}: {error}",
                    reader.buffer_position()
                )));
            }
        }
    }

    Ok(tokens)
}

/// Tokenize line text: one token per line.
pub fn tokenize_lines(text: &str) -> Vec<Token> {
    text.lines().map(Token::text).collect()
}

fn open_token(start: &BytesStart<'_>) -> Result<Token> {
    let name = lowercase(start.name().as_ref());
    let mut attributes = Vec::new();
    for attribute in start.html_attributes() {
        let attribute = attribute
            .map_err(|error| Error::Merge(format!("malformed attribute on <{name}>: {error}")))?;
        attributes.push((
            lowercase(attribute.key.as_ref()),
            String::from_utf8_lossy(attribute.value.as_ref()).into_owned(),
        ));
    }
    Ok(Token::Open { name, attributes })
}

/// Parser-split text (e.g. around a skipped comment) is joined into one run.
fn push_text(tokens: &mut Vec<Token>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Token::Text(previous)) = tokens.last_mut() {
        previous.push_str(text);
    } else {
        tokens.push(Token::text(text));
    }
}

fn lowercase(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokenizes_fragment_without_root() {
        let tokens = tokenize_markup("foo<B>bold</B>end").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::text("foo"),
                Token::open("b"),
                Token::text("bold"),
                Token::close("b"),
                Token::text("end"),
            ]
        );
    }

    #[test]
    fn self_closing_names_have_no_close_token() {
        let tokens = tokenize_markup("a<br>b<br/>c<hr></hr>").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::text("a"),
                Token::open("br"),
                Token::text("b"),
                Token::open("br"),
                Token::text("c"),
                Token::open("hr"),
            ]
        );
    }

    #[test]
    fn empty_element_on_regular_name_is_balanced() {
        let tokens = tokenize_markup("<p/>").unwrap();
        assert_eq!(tokens, vec![Token::open("p"), Token::close("p")]);
    }

    #[test]
    fn attributes_keep_order_and_fold_names() {
        let tokens = tokenize_markup(r#"<IMG SRC="a.png" Alt='x'>"#).unwrap();
        match &tokens[0] {
            Token::Open { name, attributes } => {
                assert_eq!(name, "img");
                assert_eq!(
                    attributes,
                    &vec![
                        ("src".to_string(), "a.png".to_string()),
                        ("alt".to_string(), "x".to_string()),
                    ]
                );
            }
            other => panic!("unexpected token {other:?}"),
        }
    }

    #[test]
    fn comments_are_skipped_and_text_rejoined() {
        let tokens = tokenize_markup("one<!-- hidden -->two").unwrap();
        assert_eq!(tokens, vec![Token::text("onetwo")]);
    }

    #[test]
    fn line_tokens() {
        assert_eq!(
            tokenize_lines("a\r\nb\n\nc"),
            vec![
                Token::text("a"),
                Token::text("b"),
                Token::text(""),
                Token::text("c"),
            ]
        );
    }
}
