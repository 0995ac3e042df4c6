//! Benchmarks for the per-keystroke work: trigger scanning and filtering.
//!
//! Run with: `cargo bench -p the-lib --bench filter`

use std::sync::Arc;

use divan::{
  Bencher,
  black_box,
};
use the_lib::{
  completer::{
    Completer,
    CompleterRegistry,
    CompletionOption,
    KeyedOption,
    OptionsFuture,
    key_options,
  },
  cursor::Cursor,
  document::Document,
  filter::{
    SearchPattern,
    filter_options,
  },
  scanner::find_match,
  text_tree::TextTree,
};

fn main() {
  divan::main();
}

fn make_options(count: usize) -> Vec<KeyedOption> {
  let words = ["apple", "banana", "cherry", "damson", "elderberry", "fig"];
  key_options(
    0,
    (0..count)
      .map(|idx| {
        let word = words[idx % words.len()];
        CompletionOption::new(idx, format!("{word} {idx}")).with_keywords(["fruit", word])
      })
      .collect(),
  )
}

struct Prefix(&'static str);

impl Completer for Prefix {
  fn name(&self) -> &str {
    self.0
  }

  fn trigger_prefix(&self) -> &str {
    self.0
  }

  fn options(&self) -> OptionsFuture {
    Box::pin(async { Ok(Vec::new()) })
  }
}

mod filter {
  use super::*;

  #[divan::bench(args = [100, 1_000, 10_000])]
  fn sparse_query(bencher: Bencher, count: usize) {
    let options = make_options(count);
    let search = SearchPattern::for_query("fig");

    bencher.bench(|| black_box(filter_options(black_box(&search), &options, 10)));
  }

  #[divan::bench(args = [100, 1_000, 10_000])]
  fn no_hits(bencher: Bencher, count: usize) {
    let options = make_options(count);
    let search = SearchPattern::for_query("zucchini");

    bencher.bench(|| black_box(filter_options(black_box(&search), &options, 10)));
  }

  #[divan::bench]
  fn compile_query(bencher: Bencher) {
    bencher.bench(|| black_box(SearchPattern::for_query(black_box("élder"))));
  }
}

mod scan {
  use super::*;

  /// A paragraph of `nodes` adjacent text nodes ending in a trigger.
  fn fragmented(nodes: usize) -> (Document, Cursor) {
    let mut doc = Document::new("p");
    let root = doc.root();
    let mut last = root;
    for idx in 0..nodes {
      let text = if idx + 1 == nodes { "@query" } else { "x" };
      last = doc.create_text(text);
      // fresh nodes always attach
      let _ = doc.append_child(root, last);
    }
    let cursor = Cursor {
      node:   last,
      offset: doc.text_len(last),
    };
    (doc, cursor)
  }

  #[divan::bench(args = [1, 16, 256])]
  fn find_trigger(bencher: Bencher, nodes: usize) {
    let (doc, cursor) = fragmented(nodes);
    let registry: CompleterRegistry = ["/", ":", "@"]
      .into_iter()
      .map(|prefix| Arc::new(Prefix(prefix)) as Arc<dyn Completer>)
      .collect();

    bencher.bench(|| black_box(find_match(&doc, doc.root(), black_box(cursor), &registry, None)));
  }
}
