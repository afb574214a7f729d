use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use codepane_core::Workspace;

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 64);
    for i in 0..line_count {
        out.push_str(&format!(
            "    let value_{i} = \"line {i}\"; // the quick brown fox {i}\n"
        ));
    }
    // Remove the final '\n' to avoid creating an extra trailing empty line.
    out.pop();
    out
}

fn bench_large_file_open(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("large_file_open/50k_lines", |b| {
        b.iter(|| {
            let mut workspace = Workspace::new();
            let opened = workspace.open_buffer(black_box(&text)).unwrap();
            black_box(workspace.line_count(opened.view_id).unwrap());
        })
    });
}

fn bench_full_colouring(c: &mut Criterion) {
    let text = large_text(10_000);
    c.bench_function("full_colouring/10k_lines", |b| {
        b.iter_batched(
            || {
                let mut workspace = Workspace::new();
                let opened = workspace.open_buffer(&text).unwrap();
                workspace
                    .set_syntax_definition(opened.view_id, "Rust")
                    .unwrap();
                (workspace, opened.view_id)
            },
            |(mut workspace, view)| {
                black_box(workspace.styled_text(view).unwrap().spans.len());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_typing_in_middle(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("typing_middle/100_inserts_two_views", |b| {
        b.iter_batched(
            || {
                let mut workspace = Workspace::new();
                let opened = workspace.open_buffer(&text).unwrap();
                let split = workspace.create_view(opened.buffer_id).unwrap();
                for view in [opened.view_id, split] {
                    workspace.set_syntax_definition(view, "Rust").unwrap();
                    workspace.styled_text(view).unwrap();
                }
                (workspace, opened.view_id)
            },
            |(mut workspace, view)| {
                let mut offset = workspace.char_count(view).unwrap() / 2;
                for _ in 0..100 {
                    workspace.replace(view, offset..offset, "x").unwrap();
                    offset += 1;
                }
                black_box(workspace.spans(view, offset - 100..offset).unwrap());
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_large_file_open,
    bench_full_colouring,
    bench_typing_in_middle
);
criterion_main!(benches);
