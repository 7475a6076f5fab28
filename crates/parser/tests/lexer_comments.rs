use go_surface_syntax::ast::CommentKind;
use go_surface_syntax::error::LexErrorKind;
use go_surface_syntax::lexer::{tokenize, Tok};

fn comment_texts(src: &str) -> Vec<(CommentKind, &str)> {
    tokenize(src)
        .comments
        .iter()
        .map(|c| (c.kind, &src[c.span.range()]))
        .collect()
}

#[test]
fn captures_line_and_block_comments() {
    let src = "// a\nx /* b */ y\n/* c\n d */\n";
    assert_eq!(
        comment_texts(src),
        vec![
            (CommentKind::Line, "// a"),
            (CommentKind::Block, "/* b */"),
            (CommentKind::Block, "/* c\n d */"),
        ]
    );
}

#[test]
fn line_comment_stops_before_cr() {
    assert_eq!(comment_texts("//x\r\ny"), vec![(CommentKind::Line, "//x")]);
}

#[test]
fn comment_markers_inside_strings_are_not_comments() {
    let src = "x := \"// no\" + `/* no */`";
    assert!(comment_texts(src).is_empty());
}

#[test]
fn unterminated_block_comment_reports_and_keeps_text() {
    let src = "x /* open";
    let lexed = tokenize(src);
    assert_eq!(lexed.diags.len(), 1);
    assert_eq!(lexed.diags[0].message, LexErrorKind::UnterminatedComment.to_string());
    assert_eq!(lexed.comments.len(), 1);
    assert!(lexed.tokens.iter().any(|t| t.tok == Tok::Error));
}

#[test]
fn invalid_literals_become_error_tokens() {
    let lexed = tokenize("a := 09 + '\\q'");
    assert_eq!(lexed.diags.len(), 2);
    let errors = lexed.tokens.iter().filter(|t| t.tok == Tok::Error).count();
    assert_eq!(errors, 2);
}
