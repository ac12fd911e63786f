use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use super::{RewritePass, is_candidate, process};
use crate::config::Options;
use crate::css::{Stylesheet, ValueTree};
use crate::error::LoadError;
use crate::fragment::Overlay;
use crate::uri::{self, BASE64_PREFIX, Encoding, UTF8_PREFIX};
use crate::utils::path::normalize_path;

const ICONS: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16">
  <g id="check" fill="black"><path d="M2 8l4 4 8-8"/></g>
  <g id="cross"><path d="M2 2l12 12M14 2L2 14"/></g>
</svg>
"#;

fn fixture() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path());
    fs::write(root.join("icons.svg"), ICONS).unwrap();
    (temp, root)
}

fn utf8() -> Options {
    Options { utf8: true }
}

fn base64() -> Options {
    Options { utf8: false }
}

fn run(css: &str, options: &Options, root: &Path) -> super::Processed {
    process(css, options, Some(root.join("style.css").as_path()))
}

/// Values of every declaration named `prop`, in source order.
fn values(css: &str, prop: &str) -> Vec<String> {
    Stylesheet::parse(css)
        .declarations()
        .into_iter()
        .filter(|decl| decl.prop == prop)
        .map(|decl| decl.value.clone())
        .collect()
}

/// Unescaped url arguments of a declaration value.
fn url_arguments(value: &str) -> Vec<String> {
    let mut tree = ValueTree::parse(value);
    tree.urls_mut()
        .iter()
        .map(|url| url.argument().to_string())
        .collect()
}

fn decoded(value: &str) -> String {
    let args = url_arguments(value);
    uri::decode(&args[0]).unwrap()
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn test_utf8_fragment_with_overlay() {
    let (_temp, root) = fixture();
    let css = ".a { background: url(icons.svg#check); fill: blue; }";

    let out = run(css, &utf8(), &root);
    assert!(out.warnings.is_empty());

    let value = &values(&out.css, "background")[0];
    assert!(value.starts_with(&format!("url('{UTF8_PREFIX}")));
    assert!(value.ends_with("')"));
    assert_eq!(
        decoded(value),
        "<svg fill='blue' viewBox='0 0 16 16' xmlns='http://www.w3.org/2000/svg'>\
         <path d='M2 8l4 4 8-8'/></svg>"
    );
}

#[test]
fn test_base64_fragment_with_overlay() {
    let (_temp, root) = fixture();
    let css = ".a { background: url(icons.svg#check); fill: blue; }";

    let out = run(css, &base64(), &root);
    assert!(out.warnings.is_empty());

    let value = &values(&out.css, "background")[0];
    assert!(value.starts_with(&format!("url({BASE64_PREFIX}")));
    assert!(!value.contains('\''));
    assert_eq!(
        decoded(value),
        r#"<svg fill="blue" viewBox="0 0 16 16" xmlns="http://www.w3.org/2000/svg"><path d="M2 8l4 4 8-8"/></svg>"#
    );
}

#[test]
fn test_missing_file_warns_and_keeps_value() {
    let (_temp, root) = fixture();
    let css = ".a { background: url(missing.svg#x) no-repeat; }";

    let out = run(css, &utf8(), &root);
    assert_eq!(out.css, css);
    assert_eq!(out.warnings.len(), 1);

    let warning = &out.warnings[0];
    assert!(warning.error.is_not_found());
    assert_eq!(warning.node, "url(missing.svg#x)");
    assert_eq!(warning.declaration, "background");
    assert_eq!(warning.error.path(), &root.join("missing.svg"));
}

#[test]
fn test_unknown_id_is_silent() {
    let (_temp, root) = fixture();
    let css = ".a { background: url(icons.svg#nonexistent); }";

    let out = run(css, &utf8(), &root);
    assert_eq!(out.css, css);
    assert!(out.warnings.is_empty());
}

// ============================================================================
// Rewriter behaviour
// ============================================================================

#[test]
fn test_values_without_fragment_urls_are_untouched() {
    let (_temp, root) = fixture();
    let css = "/* keep */\n.a{background:url(image.png) ;color : red}\n.b { mask: url(icons.svg) }\n";

    let out = run(css, &utf8(), &root);
    assert_eq!(out.css, css);
    assert!(out.warnings.is_empty());
    assert!(out.css.contains("color : red"));
}

#[test]
fn test_prefilter() {
    assert!(is_candidate("url(icons.svg#check)"));
    assert!(is_candidate("center url(\"a/b.svg#c\") no-repeat"));
    assert!(!is_candidate("url(icons.svg)"));
    assert!(!is_candidate("xurl(icons.svg#check)"));
    assert!(!is_candidate("URL(icons.svg#check)"));
    assert!(!is_candidate("url(icons.svg#)"));
}

#[test]
fn test_uppercase_url_is_not_rewritten() {
    let (_temp, root) = fixture();
    let css = ".a { background: URL(icons.svg#check); }";
    assert_eq!(run(css, &utf8(), &root).css, css);
}

#[test]
fn test_quoted_argument() {
    let (_temp, root) = fixture();
    let css = r#".a { background: url("icons.svg#cross"); }"#;

    let value = &values(&run(css, &utf8(), &root).css, "background")[0];
    assert!(value.starts_with(&format!("url('{UTF8_PREFIX}")));

    let value = &values(&run(css, &base64(), &root).css, "background")[0];
    assert!(value.starts_with(&format!("url(\"{BASE64_PREFIX}")));
    assert!(value.ends_with("\")"));
}

#[test]
fn test_whole_document_reference() {
    let (_temp, root) = fixture();
    let css = ".a { background: url(icons.svg#) , url(icons.svg#cross) }";

    let out = run(css, &utf8(), &root);
    let value = &values(&out.css, "background")[0];
    let args = url_arguments(value);
    assert_eq!(args.len(), 2);

    let whole = uri::decode(&args[0]).unwrap();
    assert!(whole.starts_with("<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 16 16'>"));
    assert!(whole.contains("<g id='check' fill='black'>"));
    assert!(whole.contains("<g id='cross'>"));

    let cross = uri::decode(&args[1]).unwrap();
    assert!(!cross.contains("id="));
}

#[test]
fn test_nested_function_urls() {
    let (_temp, root) = fixture();
    let css = ".a { background: image-set(url(icons.svg#check) 1x, url(icons.svg#cross) 2x); }";

    let value = &values(&run(css, &base64(), &root).css, "background")[0];
    assert!(value.starts_with("image-set(url(data:image/svg+xml;base64,"));
    assert!(value.ends_with(" 2x)"));
    assert_eq!(url_arguments(value).len(), 2);
}

#[test]
fn test_relative_to_source_directory() {
    let (_temp, root) = fixture();
    let css_dir = root.join("css");
    fs::create_dir_all(&css_dir).unwrap();

    let css = ".a { background: url(../icons.svg#check); }";
    let out = process(css, &utf8(), Some(css_dir.join("style.css").as_path()));
    assert!(out.warnings.is_empty());
    assert!(values(&out.css, "background")[0].contains(UTF8_PREFIX));
}

#[test]
fn test_leading_slash_stays_in_base_directory() {
    let (_temp, root) = fixture();
    let css = ".a { background: url(/icons.svg#check); }";
    let out = run(css, &utf8(), &root);
    assert!(out.warnings.is_empty());
    assert_ne!(out.css, css);
}

#[test]
fn test_overlay_reads_only_same_block() {
    let (_temp, root) = fixture();
    let css = ".a { background: url(icons.svg#cross); .b { fill: red; } }\n.c { fill: green }";

    let out = run(css, &base64(), &root);
    let xml = decoded(&values(&out.css, "background")[0]);
    assert!(!xml.contains("fill="));
    // Nested rule is still intact.
    assert!(out.css.contains(".b { fill: red; }"));
}

#[test]
fn test_overlay_whitelist_and_order() {
    let (_temp, root) = fixture();
    let css = ".a {
  fill-opacity: 0.5;
  width: 1em;
  background: url(icons.svg#check);
  width: 2em;
  stroke: red !important;
  color: currentColor;
}";

    let out = run(css, &base64(), &root);
    let xml = decoded(&values(&out.css, "background")[0]);
    assert!(xml.starts_with(
        r#"<svg fill="black" viewBox="0 0 16 16" xmlns="http://www.w3.org/2000/svg" width="2em" stroke="red" color="currentColor">"#
    ));
    assert!(!xml.contains("fill-opacity"));
}

#[test]
fn test_overlay_after_comment() {
    let (_temp, root) = fixture();
    let css = ".a {
  /* icon colour */
  fill: red;
  background: url(icons.svg#cross);
}";

    let out = run(css, &base64(), &root);
    let xml = decoded(&values(&out.css, "background")[0]);
    assert!(xml.starts_with(
        r#"<svg viewBox="0 0 16 16" xmlns="http://www.w3.org/2000/svg" fill="red">"#
    ));
    assert!(out.css.contains("  /* icon colour */\n  fill: red;\n"));
}

#[test]
fn test_warning_names_property_after_comment() {
    let (_temp, root) = fixture();
    let css = ".a { /* mask */ mask: url(missing.svg#x) }";

    let out = run(css, &utf8(), &root);
    assert_eq!(out.warnings.len(), 1);
    assert_eq!(out.warnings[0].declaration, "mask");
}

#[test]
fn test_shared_document_independent_fragments() {
    let (_temp, root) = fixture();
    let css = ".red { background: url(icons.svg#check); fill: red }
.green { background: url(icons.svg#check); fill: green }
.plain { background: url(icons.svg#check) }";

    let pass = RewritePass::new(&base64(), Some(root.join("style.css").as_path()));
    let out = pass.process(css);
    assert!(out.warnings.is_empty());

    let backgrounds = values(&out.css, "background");
    assert!(decoded(&backgrounds[0]).contains(r#"fill="red""#));
    assert!(decoded(&backgrounds[1]).contains(r#"fill="green""#));
    assert!(decoded(&backgrounds[2]).contains(r#"fill="black""#));

    assert_eq!(pass.cache().len(), 1);
    let doc = pass.cache().get(&root.join("icons.svg")).unwrap();
    assert_eq!(doc.locate("check").unwrap().attr("fill"), Some("black"));
    assert_eq!(doc.lookups(), 1);
}

#[test]
fn test_broken_file_warns_per_reference() {
    let (_temp, root) = fixture();
    fs::write(root.join("broken.svg"), "<svg><g></svg>").unwrap();
    let css = ".a { background: url(broken.svg#x), url(icons.svg#check) }
.b { mask: url(broken.svg#y) }";

    let out = run(css, &utf8(), &root);
    assert_eq!(out.warnings.len(), 2);
    assert!(matches!(
        out.warnings[0].error.as_ref(),
        LoadError::XmlParse { .. }
    ));
    assert!(Arc::ptr_eq(&out.warnings[0].error, &out.warnings[1].error));
    assert_eq!(out.warnings[1].declaration, "mask");

    // The valid url in the same declaration is still rewritten.
    let value = &values(&out.css, "background")[0];
    assert!(value.starts_with("url(broken.svg#x), url('data:"));
    assert_eq!(values(&out.css, "mask")[0], "url(broken.svg#y)");
}

#[test]
fn test_only_changed_declarations_are_reserialized() {
    let (_temp, root) = fixture();
    let css = "@media screen{.a{  background :url(icons.svg#check)  !important ;x:y}}";

    let out = run(css, &base64(), &root);
    assert!(out.css.starts_with("@media screen{.a{  background :url(data:"));
    assert!(out.css.ends_with(")  !important ;x:y}}"));
}

#[test]
fn test_utf8_uri_round_trips() {
    let (_temp, root) = fixture();
    let css = ".a { background: url(icons.svg#check); fill: #00f }";

    let out = run(css, &utf8(), &root);
    let value = &values(&out.css, "background")[0];
    let body = &value["url('".len()..value.len() - "')".len()];

    let xml = uri::decode(body).unwrap();
    assert_eq!(uri::encode_xml(&xml, Encoding::Utf8), body);
}

#[test]
fn test_rewrite_value_directly() {
    let (_temp, root) = fixture();
    let pass = RewritePass::with_base_dir(Encoding::Base64, &root);
    let overlay = Overlay::collect([("fill", "red")]);

    let rewritten = pass.rewrite_value("background", "url(icons.svg#check) center", &overlay);
    let value = rewritten.value.unwrap();
    assert!(value.ends_with(") center"));
    assert!(decoded(&value).contains(r#"fill="red""#));

    let untouched = pass.rewrite_value("background", "url(icons.svg#none) center", &overlay);
    assert!(untouched.value.is_none());
    assert!(untouched.warnings.is_empty());
}

#[test]
fn test_prefetch_collects_distinct_files() {
    let (_temp, root) = fixture();
    fs::write(root.join("other.svg"), r#"<svg><g id="x"/></svg>"#).unwrap();
    let sheet = Stylesheet::parse(
        ".a { background: url(icons.svg#check) }
.b { background: url(other.svg#x), url(icons.svg#cross) }
.c { background: url(missing.svg#x) }
.d { background: url(image.png) }",
    );

    let pass = RewritePass::with_base_dir(Encoding::Utf8, &root);
    pass.prefetch(&sheet);
    assert_eq!(pass.cache().len(), 3);
}
