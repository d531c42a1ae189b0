// Benchmark helpers - Rust's dead code analysis doesn't see that these are
// used by benchmark files in the same directory
use superwrite_engine::markup::parse_markup;
use superwrite_engine::model::Document;

#[allow(dead_code)]
pub fn generate_markup(sections: usize) -> String {
    let base = "<h2>Section</h2><p>This is <strong>very</strong> good, and it can't get <em>much</em> better.</p><p>Another paragraph with <a href=\"https://example.com\">a link</a>.</p>";
    base.repeat(sections)
}

#[allow(dead_code)]
pub fn generate_document(sections: usize) -> Document {
    parse_markup(&generate_markup(sections)).unwrap()
}
