//! Structural merge of two diverged versions of one document
//!
//! Both versions are tokenized, aligned greedily, and serialized back into a
//! single document. Runs only in the first version are marked deleted, runs
//! only in the second are marked inserted, shared runs appear once. The result
//! is meant for a human to review; nothing is reconciled automatically.

mod align;
mod render;
mod token;
mod tokenize;

pub use align::{align, Segment};
pub use token::{is_self_closing, Attribute, Token};
pub use tokenize::{tokenize_lines, tokenize_markup};

use crate::error::Result;
use crate::models::ContentKind;

/// How content is tokenized and marked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Tag markup, runs wrapped in `<del>` / `<ins>`
    Markup,
    /// One token per line, runs bracketed by blank lines
    Lines,
}

impl MergeMode {
    pub fn for_kind(kind: &ContentKind) -> Self {
        if kind.is_markup() {
            Self::Markup
        } else {
            Self::Lines
        }
    }
}

/// Merge two versions of a document in the given mode.
pub fn merge(first: &str, second: &str, mode: MergeMode) -> Result<String> {
    match mode {
        MergeMode::Markup => merge_markup(first, second),
        MergeMode::Lines => Ok(merge_lines(first, second)),
    }
}

/// Merge two markup documents.
///
/// ```
/// use tandem_core::merge::merge_markup;
///
/// let merged = merge_markup("end", "<h1>title</h1>end").unwrap();
/// assert_eq!(merged, "<ins><h1>title</h1></ins>end");
/// ```
pub fn merge_markup(first: &str, second: &str) -> Result<String> {
    let first = tokenize_markup(first)?;
    let second = tokenize_markup(second)?;
    let segments = align(&first, &second);
    tracing::debug!(
        first_tokens = first.len(),
        second_tokens = second.len(),
        segments = segments.len(),
        "Aligned markup"
    );
    Ok(render::render_markup(&segments))
}

/// Merge two line-oriented texts.
pub fn merge_lines(first: &str, second: &str) -> String {
    let segments = align(&tokenize_lines(first), &tokenize_lines(second));
    render::render_lines(&segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Every open tag of a regular name is closed later, innermost first.
    fn assert_well_formed(markup: &str) {
        let mut stack = Vec::new();
        for token in tokenize_markup(markup).unwrap() {
            match token {
                Token::Open { name, .. } if !is_self_closing(&name) => stack.push(name),
                Token::Close { name } => assert_eq!(stack.pop(), Some(name), "in {markup}"),
                _ => {}
            }
        }
        assert!(stack.is_empty(), "unclosed tags {stack:?} in {markup}");
    }

    #[test]
    fn merges_diverged_formatting() {
        let merged = merge_markup("foo<b>bold</b>end", "bar<i>italic</i>end").unwrap();
        assert_eq!(merged, "<del>foo<b>bold</b></del><ins>bar<i>italic</i></ins>end");
    }

    #[test]
    fn merges_inserted_heading() {
        let merged = merge_markup("end", "<h1>title</h1>end").unwrap();
        assert_eq!(merged, "<ins><h1>title</h1></ins>end");
    }

    #[test]
    fn merging_with_itself_is_identity_after_case_folding() {
        let doc = r#"<P class="a">Hello <B>world</B><BR>again<IMG src="x.png"></P>"#;
        let merged = merge_markup(doc, doc).unwrap();
        assert_eq!(
            merged,
            r#"<p class="a">Hello <b>world</b><br/>again<img src="x.png"/></p>"#
        );
        assert!(!merged.contains("<del>"));
        assert!(!merged.contains("<ins>"));
    }

    #[test]
    fn fully_divergent_documents_are_delete_then_insert() {
        let merged = merge_markup("<p>alpha</p>", "<div>beta</div>").unwrap();
        assert_eq!(merged, "<del><p>alpha</p></del><ins><div>beta</div></ins>");
    }

    #[test]
    fn merged_output_is_well_formed() {
        let cases = [
            ("<p>one</p><p>two</p>", "<p>one</p><p>three</p>"),
            ("<ul><li>a</li><li>b</li></ul>", "<ul><li>a</li></ul><p>c</p>"),
            ("<p>x<img src=\"a\">y</p>", "<p>x<hr>y</p>"),
            ("foo<b>bold</b>end", "bar<i>italic</i>end"),
        ];
        for (first, second) in cases {
            assert_well_formed(&merge_markup(first, second).unwrap());
        }
    }

    #[test]
    fn mismatched_wrappers_around_shared_text_interleave() {
        // Only the text aligns; both opens and both closes are bare structural
        // runs, emitted deleted-then-inserted, so the tags cross.
        let merged = merge_markup("<p>a</p>", "<div>a</div>").unwrap();
        assert_eq!(merged, "<p><div>a</p></div>");
        assert!(!merged.contains("<del>"));
        assert!(!merged.contains("<ins>"));
    }

    #[test]
    fn paragraph_edit_marks_only_the_changed_text() {
        let merged = merge_markup("<p>one</p><p>two</p>", "<p>one</p><p>three</p>").unwrap();
        assert_eq!(merged, "<p>one</p><p><del>two</del><ins>three</ins></p>");
    }

    #[test]
    fn line_mode_brackets_both_versions_of_the_changed_line() {
        let merged = merge_lines("first\nmine\nthird\nlast", "first\ntheirs\nthird\nlast");
        assert_eq!(merged, "first\n\nmine\n\n\ntheirs\n\nthird\nlast");
        assert_eq!(merged.matches("first").count(), 1);
        assert_eq!(merged.matches("last").count(), 1);
    }

    #[test]
    fn line_mode_identity() {
        let text = "a\nb\nc";
        assert_eq!(merge_lines(text, text), text);
    }

    #[test]
    fn mode_follows_content_kind() {
        assert_eq!(
            MergeMode::for_kind(&ContentKind::semantic_html()),
            MergeMode::Markup
        );
        assert_eq!(MergeMode::for_kind(&ContentKind::markdown()), MergeMode::Lines);
        assert_eq!(
            merge("a\nb", "a\nc", MergeMode::Lines).unwrap(),
            "a\n\nb\n\n\nc\n"
        );
    }
}
