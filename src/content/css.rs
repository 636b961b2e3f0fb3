//! CSS style sheet checks.
//!
//! Drives the CSS tokenizer across the sheet, including nested blocks;
//! every tokenizer-level failure (unterminated strings, bad `url()`
//! tokens) lands as a `CSS-001` with its source position, and `url()`
//! references feed the cross-reference stage.

use crate::content::collect_ref;
use crate::context::{ContentRef, ValidationContext};
use crate::messages::{EpubLocation, MessageId};
use crate::package::ManifestItem;
use cssparser::{ParseError, Parser, ParserInput, Token};

struct CssFinding {
    line: u32,
    column: u32,
    message: String,
}

struct CssUrl {
    line: u32,
    column: u32,
    url: String,
}

pub(crate) fn check(ctx: &mut ValidationContext<'_>, item: &ManifestItem, data: &[u8]) {
    let text = String::from_utf8_lossy(data);
    let mut input = ParserInput::new(&text);
    let mut parser = Parser::new(&mut input);

    let mut findings = Vec::new();
    let mut urls = Vec::new();
    scan(&mut parser, &mut findings, &mut urls);

    for finding in findings {
        ctx.report(
            MessageId::Css001,
            Some(EpubLocation::at(&item.path, finding.line, finding.column)),
            finding.message,
        );
    }

    let mut refs: Vec<ContentRef> = Vec::new();
    for CssUrl { line, column, url } in urls {
        collect_ref(&mut refs, &item.path, line, column, &url);
    }
    ctx.references.extend(refs);
}

fn scan(parser: &mut Parser<'_, '_>, findings: &mut Vec<CssFinding>, urls: &mut Vec<CssUrl>) {
    loop {
        let location = parser.current_source_location();
        // The source location is 0-based on lines, 1-based on columns.
        let line = location.line + 1;
        let column = location.column;

        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::BadString(raw) => findings.push(CssFinding {
                line,
                column,
                message: format!("unterminated string: {raw}"),
            }),
            Token::BadUrl(raw) => findings.push(CssFinding {
                line,
                column,
                message: format!("invalid `url()` token: {raw}"),
            }),
            Token::UnquotedUrl(url) => urls.push(CssUrl {
                line,
                column,
                url: url.to_string(),
            }),
            Token::Function(name) if name.eq_ignore_ascii_case("url") => {
                let _ = parser.parse_nested_block(|nested| {
                    while let Ok(token) = nested.next_including_whitespace() {
                        if let Token::QuotedString(url) = token {
                            urls.push(CssUrl {
                                line,
                                column,
                                url: url.to_string(),
                            });
                        }
                    }
                    Ok::<(), ParseError<'_, ()>>(())
                });
            }
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => {
                let _ = parser.parse_nested_block(|nested| {
                    scan(nested, findings, urls);
                    Ok::<(), ParseError<'_, ()>>(())
                });
            }
            _ => {}
        }
    }
}
