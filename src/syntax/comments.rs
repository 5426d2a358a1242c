//! Comment collection.
//!
//! The main grammar skips comments, so they are gathered by a separate scan
//! that steps over string, raw string and rune literals.

use pest::Parser;

use super::ast::Comment;
use super::parser::{convert_parse_error, GoParser, Rule};
use super::Span;
use crate::errors::{EmbedResult, SourceContext};

/// Every `//` and `/* */` comment of the source, in order.
pub fn collect(source: &SourceContext) -> EmbedResult<Vec<Comment>> {
    let pairs = GoParser::parse(Rule::comment_scan, &source.content)
        .map_err(|e| convert_parse_error(e, source))?;

    Ok(pairs
        .flatten()
        .filter(|p| matches!(p.as_rule(), Rule::line_comment | Rule::block_comment))
        .map(|p| Comment {
            text: p.as_str().trim_end_matches('\r').to_string(),
            span: Span::new(p.as_span().start(), p.as_span().end()),
        })
        .collect())
}
