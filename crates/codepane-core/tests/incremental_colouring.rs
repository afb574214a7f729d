//! Incremental recolouring must always agree with a full scan of the edited text.

use codepane_core::{Category, ColourSpan, ColouringOptions, RedrawRequest, ViewId, Workspace};
use std::cell::RefCell;
use std::rc::Rc;
use codepane_syntax::scan_text;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DEF: &str = r#"
name: Stress
keywords: [bar, let, if, else]
autocomplete_words: [barometer]
rules:
  - category: comment
    begin: '//'
  - category: comment
    begin: '/\*'
    end: '\*/'
    multiline: true
  - category: string
    begin: '"'
    end: '"'
    escape: '\'
    multiline: true
  - category: string
    begin: "'"
    end: "'"
    multiline: true
    stop_at_end_of_line: true
  - category: number
    pattern: '\b\d+\b'
  - category: variable
    pattern: '\$[a-z]+'
"#;

const PIECES: &[&str] = &[
    "bar", "let ", "if", " ", "\n", "\r\n", "/*", "*/", "//", "\"", "'", "\\", "42", "$x", "else",
    "baz", "\n\n", "*", "/",
];

fn full_scan(workspace: &Workspace, view: ViewId) -> Vec<ColourSpan> {
    let syntax = workspace.syntax_for_view(view).unwrap();
    let options = workspace.config(view).unwrap().colouring;
    let text = workspace.buffer_text(view).unwrap();
    if !options.syntax_coloured {
        return Vec::new();
    }
    scan_text(&syntax, &text, &options.scan_options())
}

fn stress(seed: u64, syntax: &str, options: ColouringOptions, initial: &str) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut workspace = Workspace::new();
    workspace.syntaxes_mut().load_from_str(DEF).unwrap();
    let opened = workspace.open_buffer(initial).unwrap();
    let view = opened.view_id;
    workspace.set_syntax_definition(view, syntax).unwrap();
    workspace.set_colouring_options(view, options).unwrap();

    // A second view of the same buffer that is only queried now and then.
    let lazy = workspace.create_view(opened.buffer_id).unwrap();
    workspace.set_syntax_definition(lazy, syntax).unwrap();
    workspace.set_colouring_options(lazy, options).unwrap();

    assert_eq!(
        workspace.styled_text(view).unwrap().spans,
        full_scan(&workspace, view)
    );

    for step in 0..300 {
        let len = workspace.char_count(view).unwrap();
        let start = rng.gen_range(0..=len);
        let end = rng.gen_range(start..=len.min(start + 4));
        let piece = PIECES[rng.gen_range(0..PIECES.len())];
        let text = if rng.gen_bool(0.2) { "" } else { piece };
        workspace.replace(view, start..end, text).unwrap();

        let expected = full_scan(&workspace, view);
        let actual = workspace.styled_text(view).unwrap().spans;
        assert_eq!(
            actual,
            expected,
            "step {step}: edit {start}..{end} <- {text:?} in {:?}",
            workspace.buffer_text(view).unwrap()
        );
        if step % 37 == 0 {
            assert_eq!(workspace.styled_text(lazy).unwrap().spans, expected);
        }
    }
}

#[test]
fn test_random_edits_match_full_scan() {
    let initial = "let a = \"x\";\n/* block\n comment */ bar 12\n'single' $v // tail\n";
    stress(1, "Stress", ColouringOptions::default(), initial);
    stress(2, "Stress", ColouringOptions::default(), "");
}

#[test]
fn test_random_edits_match_full_scan_single_line_modes() {
    let initial = "bar\n\"open\nstill\" 7\n/* a\nb */\n";
    let options = ColouringOptions {
        multiline_strings: false,
        ..ColouringOptions::default()
    };
    stress(3, "Stress", options, initial);

    let options = ColouringOptions {
        only_until_end_of_line: true,
        ..ColouringOptions::default()
    };
    stress(4, "Stress", options, initial);
}

#[test]
fn test_random_edits_match_full_scan_with_builtin_rust() {
    let initial = "fn main() {\n    let s = \"hi\";\n    /* c */ println!(\"{s}\");\n}\n";
    stress(5, "Rust", ColouringOptions::default(), initial);
}

#[test]
fn test_keyword_appears_when_split_from_identifier() {
    let mut workspace = Workspace::new();
    workspace.syntaxes_mut().load_from_str(DEF).unwrap();
    let opened = workspace.open_buffer("foo\nbarbaz\n").unwrap();
    let view = opened.view_id;
    workspace.set_syntax_definition(view, "Stress").unwrap();
    assert!(workspace.styled_text(view).unwrap().spans.is_empty());

    workspace.replace(view, 7..7, " ").unwrap();
    assert_eq!(
        workspace.spans(view, 0..11).unwrap(),
        vec![ColourSpan::new(4, 7, Category::Keyword)]
    );
}

#[test]
fn test_category_toggle_and_uncached_colourize() {
    let mut workspace = Workspace::new();
    workspace.syntaxes_mut().load_from_str(DEF).unwrap();
    let opened = workspace.open_buffer("let n = 5; // five\n").unwrap();
    let view = opened.view_id;
    workspace.set_syntax_definition(view, "Stress").unwrap();
    assert_eq!(workspace.styled_text(view).unwrap().spans.len(), 3);

    workspace
        .set_category_enabled(view, Category::Number, false)
        .unwrap();
    let spans = workspace.styled_text(view).unwrap().spans;
    assert!(spans.iter().all(|s| s.category != Category::Number));
    assert_eq!(spans.len(), 2);

    workspace
        .set_category_enabled(view, Category::Number, true)
        .unwrap();
    assert_eq!(
        workspace.styled_text(view).unwrap().spans,
        full_scan(&workspace, view)
    );

    assert_eq!(
        workspace.colourize(view, 0..3).unwrap(),
        vec![ColourSpan::new(0, 3, Category::Keyword)]
    );
    assert!(workspace.colourize(view, 0..100).is_err());
}

#[test]
fn test_unterminated_single_line_span_keeps_recolouring_local() {
    let mut workspace = Workspace::new();
    workspace.syntaxes_mut().load_from_str(DEF).unwrap();
    let text = format!("'unterminated\n{}", "x\n".repeat(2000));
    let opened = workspace.open_buffer(&text).unwrap();
    let view = opened.view_id;
    workspace.set_syntax_definition(view, "Stress").unwrap();
    assert_eq!(
        workspace.spans(view, 0..14).unwrap(),
        vec![ColourSpan::new(0, 13, Category::String)]
    );

    let requests = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&requests);
    workspace
        .subscribe_view(view, move |request: &RedrawRequest| {
            sink.borrow_mut().push(request.clone())
        })
        .unwrap();

    // Line 2000 is the last "x"; typing happens on the empty line after it.
    let last_x = 14 + 2 * 1999;
    for _ in 0..50 {
        let len = workspace.char_count(view).unwrap();
        workspace.replace(view, len..len, "y").unwrap();
    }
    let requests = requests.borrow();
    assert_eq!(requests.len(), 50);
    for request in requests.iter() {
        assert!(request.range.start >= last_x, "{request:?}");
        assert!(request.lines.start >= 2000, "{request:?}");
        assert!(!request.line_count_changed);
    }
    drop(requests);
    assert_eq!(
        workspace.styled_text(view).unwrap().spans,
        full_scan(&workspace, view)
    );

    // A closer on a later line does not reach back to the open span.
    workspace.replace(view, 14..14, "'closed'\n").unwrap();
    assert_eq!(
        workspace.spans(view, 0..23).unwrap(),
        vec![
            ColourSpan::new(0, 13, Category::String),
            ColourSpan::new(14, 22, Category::String),
        ]
    );
}
