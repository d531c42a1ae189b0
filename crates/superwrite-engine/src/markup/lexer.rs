//! # Markup Lexer
//!
//! Splits markup into tags and text runs with [Logos]. The lexer knows
//! nothing about which tags mean what; it only finds where each tag starts
//! and ends. Comments and declarations (`<!DOCTYPE html>`) get their own
//! kinds so the parser can drop them.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ```
//! use superwrite_engine::markup::lexer::{TokenKind, lex};
//!
//! let tokens = lex("<p>Hi</p>").unwrap();
//! let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(kinds, [TokenKind::OpenTag, TokenKind::Text, TokenKind::CloseTag]);
//! ```

use std::ops::Range;

use logos::Logos;

use crate::markup::MarkupError;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<!-- ... -->`
    #[token("<!--", skip_comment)]
    Comment,

    /// `<!DOCTYPE ...>` and friends
    #[regex(r"<![A-Za-z][^>]*>")]
    Declaration,

    /// `<name attr="value" ...>` or `<name ... />`
    ///
    /// The body is matched as a flat run of quoted or unquoted pieces; the
    /// parser splits it into attributes.
    #[regex(r#"<[A-Za-z][A-Za-z0-9]*([^"'<>]|"[^"]*"|'[^']*')*>"#)]
    OpenTag,

    /// `</name>`
    #[regex(r"</[A-Za-z][A-Za-z0-9]*\s*>")]
    CloseTag,

    /// Anything up to the next `<`
    #[regex(r"[^<]+")]
    Text,
}

fn skip_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    match lex.remainder().find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            true
        }
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

/// Tokenize markup.
///
/// A `<` that does not start a well-formed tag is kept as text, unless it
/// opens something tag-like that is never closed, which is an error.
pub fn lex(input: &str) -> Result<Vec<Token<'_>>, MarkupError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let kind = match result {
            Ok(kind) => kind,
            Err(()) if looks_unterminated(&input[span.start..]) => {
                return Err(MarkupError::UnterminatedTag { offset: span.start });
            }
            Err(()) => TokenKind::Text,
        };
        tokens.push(Token {
            kind,
            text: lexer.slice(),
            span,
        });
    }

    Ok(tokens)
}

fn looks_unterminated(rest: &str) -> bool {
    let tag_like = rest
        .chars()
        .nth(1)
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');
    tag_like && !rest.contains('>')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<(TokenKind, &str)> {
        lex(input)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(lex("").unwrap(), vec![]);
    }

    #[test]
    fn lex_paragraph() {
        assert_eq!(
            kinds("<p>Hello</p>"),
            vec![
                (TokenKind::OpenTag, "<p>"),
                (TokenKind::Text, "Hello"),
                (TokenKind::CloseTag, "</p>"),
            ]
        );
    }

    #[test]
    fn lex_attributes() {
        assert_eq!(
            kinds(r#"<a href="https://x.test/?a=1&amp;b=2" data-x='y'>"#),
            vec![(
                TokenKind::OpenTag,
                r#"<a href="https://x.test/?a=1&amp;b=2" data-x='y'>"#
            )]
        );
        assert_eq!(kinds("<br/>"), vec![(TokenKind::OpenTag, "<br/>")]);
        assert_eq!(kinds("<br />"), vec![(TokenKind::OpenTag, "<br />")]);
    }

    #[test]
    fn lex_whitespace_before_tag_end() {
        assert_eq!(kinds("<p >"), vec![(TokenKind::OpenTag, "<p >")]);
        assert_eq!(
            kinds(r#"<p class="x" >c"#),
            vec![(TokenKind::OpenTag, r#"<p class="x" >"#), (TokenKind::Text, "c")]
        );
        assert_eq!(
            kinds(r#"<img src="a.png" alt='a > b' />"#),
            vec![(TokenKind::OpenTag, r#"<img src="a.png" alt='a > b' />"#)]
        );
    }

    #[test]
    fn lex_comment_with_angle_brackets() {
        assert_eq!(
            kinds("<!-- a > b -->x"),
            vec![(TokenKind::Comment, "<!-- a > b -->"), (TokenKind::Text, "x")]
        );
    }

    #[test]
    fn lex_doctype() {
        assert_eq!(
            kinds("<!DOCTYPE html>"),
            vec![(TokenKind::Declaration, "<!DOCTYPE html>")]
        );
    }

    #[test]
    fn stray_angle_bracket_is_text() {
        let tokens = kinds("1 < 2");
        assert!(tokens.iter().all(|(kind, _)| *kind == TokenKind::Text));
        let text: String = tokens.iter().map(|(_, text)| *text).collect();
        assert_eq!(text, "1 < 2");
    }

    #[test]
    fn unterminated_tag_is_an_error() {
        assert_eq!(
            lex("<p>ok</p><strong class=\"x"),
            Err(MarkupError::UnterminatedTag { offset: 9 })
        );
    }
}
