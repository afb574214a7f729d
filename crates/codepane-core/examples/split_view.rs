use codepane_core::{Annotation, EditorConfig, OpenBufferResult, RedrawRequest, Workspace};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = "
syntax_definition: Rust
autocomplete:
  source: both
gutter:
  highlights_current_line: true
";

fn main() {
    // RUST_LOG=codepane_core=debug shows the recolouring bookkeeping.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(true)
        .init();

    let config = EditorConfig::from_yaml_str(CONFIG).unwrap();
    let mut ws = Workspace::with_config(config);

    let OpenBufferResult {
        buffer_id,
        view_id: left,
    } = ws
        .open_buffer("fn main() {\n    let greeting = \"hi\";\n}\n")
        .unwrap();

    // Simulate a split pane: a second view into the same buffer.
    let right = ws.create_view(buffer_id).unwrap();
    for view in [left, right] {
        ws.subscribe_view(view, |request: &RedrawRequest| {
            println!(
                "view {} redraw lines {:?} (chars {:?})",
                request.view.get(),
                request.lines,
                request.range
            );
        })
        .unwrap();
    }

    ws.set_annotations(left, vec![Annotation::syntax_error(1, "unused variable")])
        .unwrap();
    ws.replace(right, 12..12, "    /* entry */\n").unwrap();

    for view in [left, right] {
        let styled = ws.styled_text(view).unwrap();
        println!("view {} spans:", view.get());
        for span in styled.spans {
            let text: String = styled
                .text
                .chars()
                .skip(span.start)
                .take(span.len())
                .collect();
            println!("  {:?} {:?}", span.category, text);
        }
        for row in ws.gutter_lines(view, 0..ws.line_count(view).unwrap()).unwrap() {
            let marker = if row.annotations.is_empty() { ' ' } else { '!' };
            println!("  {marker} {:>3}", row.number.unwrap_or(row.line));
        }
    }

    ws.replace(left, 0..0, "pri").unwrap();
    ws.set_cursor(left, 3).unwrap();
    let (range, words) = ws.completions_at_cursor(left).unwrap();
    println!("completions for {range:?}: {words:?}");
}
