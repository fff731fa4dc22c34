//! Serializing aligned segments back to markup or line text

use super::align::Segment;
use super::token::{is_self_closing, Token};

const DELETED_TAG: &str = "del";
const INSERTED_TAG: &str = "ins";

/// Render segments as markup, wrapping contentful runs in `<del>` / `<ins>`.
pub fn render_markup(segments: &[Segment]) -> String {
    let mut tokens: Vec<&Token> = Vec::new();
    let deleted = (Token::open(DELETED_TAG), Token::close(DELETED_TAG));
    let inserted = (Token::open(INSERTED_TAG), Token::close(INSERTED_TAG));

    for segment in segments {
        match segment {
            Segment::Common(token) => tokens.push(token),
            Segment::Deleted(run) => push_run(&mut tokens, run, &deleted),
            Segment::Inserted(run) => push_run(&mut tokens, run, &inserted),
        }
    }

    let mut out = String::new();
    let mut previous_was_text = false;
    for token in tokens {
        if token.is_text() && previous_was_text {
            out.push(' ');
        }
        write_token(&mut out, token);
        previous_was_text = token.is_text();
    }
    out
}

/// Render segments as lines, bracketing every run with blank lines.
pub fn render_lines(segments: &[Segment]) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for segment in segments {
        match segment {
            Segment::Common(token) => lines.push(line_text(token)),
            Segment::Deleted(run) | Segment::Inserted(run) => {
                let wrap = run.iter().any(Token::is_contentful);
                if wrap {
                    lines.push("");
                }
                lines.extend(run.iter().map(line_text));
                if wrap {
                    lines.push("");
                }
            }
        }
    }

    lines.join("\n")
}

/// Structural-only runs are emitted bare.
fn push_run<'a>(tokens: &mut Vec<&'a Token>, run: &'a [Token], markers: &'a (Token, Token)) {
    let wrap = run.iter().any(Token::is_contentful);
    if wrap {
        tokens.push(&markers.0);
    }
    tokens.extend(run);
    if wrap {
        tokens.push(&markers.1);
    }
}

fn line_text(token: &Token) -> &str {
    match token {
        Token::Text(line) => line,
        Token::Open { name, .. } | Token::Close { name } => name,
    }
}

fn write_token(out: &mut String, token: &Token) {
    match token {
        Token::Text(text) => out.push_str(text),
        Token::Open { name, attributes } => {
            out.push('<');
            out.push_str(name);
            for (key, value) in attributes {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&value.replace('"', "&quot;"));
                out.push('"');
            }
            out.push_str(if is_self_closing(name) { "/>" } else { ">" });
        }
        Token::Close { name } => {
            if !is_self_closing(name) {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn structural_runs_are_not_wrapped() {
        let segments = vec![
            Segment::Deleted(vec![Token::open("p")]),
            Segment::Common(Token::text("x")),
            Segment::Deleted(vec![Token::close("p")]),
        ];
        assert_eq!(render_markup(&segments), "<p>x</p>");
    }

    #[test]
    fn adjacent_text_gets_a_space() {
        let segments = vec![
            Segment::Common(Token::text("one")),
            Segment::Deleted(vec![Token::open("hr")]),
            Segment::Common(Token::text("two")),
            Segment::Common(Token::text("three")),
        ];
        assert_eq!(render_markup(&segments), "one<del><hr/></del>two three");
    }

    #[test]
    fn attributes_are_quoted_in_order() {
        let token = Token::Open {
            name: "a".to_string(),
            attributes: vec![
                ("href".to_string(), "/x".to_string()),
                ("title".to_string(), "say \"hi\"".to_string()),
            ],
        };
        let segments = vec![
            Segment::Common(token),
            Segment::Common(Token::text("link")),
            Segment::Common(Token::close("a")),
        ];
        assert_eq!(
            render_markup(&segments),
            r#"<a href="/x" title="say &quot;hi&quot;">link</a>"#
        );
    }

    #[test]
    fn line_runs_are_bracketed_by_blank_lines() {
        let segments = vec![
            Segment::Common(Token::text("a")),
            Segment::Inserted(vec![Token::text("b")]),
            Segment::Common(Token::text("c")),
        ];
        assert_eq!(render_lines(&segments), "a\n\nb\n\nc");
    }
}
