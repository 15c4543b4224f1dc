//! Text patch behaviour across comment styles

use pretty_assertions::assert_eq;
use rstest::rstest;
use stencil_blocks::{CommentStyle, Error, find_block, upsert_block};

#[rstest]
#[case::hash(CommentStyle::Hash, "# stencil:begin k", "# stencil:end k")]
#[case::html(CommentStyle::Html, "<!-- stencil:begin k -->", "<!-- stencil:end k -->")]
#[case::slash(CommentStyle::Slash, "// stencil:begin k", "// stencil:end k")]
fn test_upsert_appends_marked_block(
    #[case] style: CommentStyle,
    #[case] begin: &str,
    #[case] end: &str,
) {
    let result = upsert_block("user text\n", style, "k", "managed").unwrap();
    assert_eq!(result, format!("user text\n\n{begin}\nmanaged\n{end}\n"));
}

#[rstest]
#[case::hash(CommentStyle::Hash)]
#[case::html(CommentStyle::Html)]
#[case::slash(CommentStyle::Slash)]
fn test_repatching_identical_content_is_noop(#[case] style: CommentStyle) {
    let once = upsert_block("header\n", style, "k", "line one\nline two").unwrap();
    let twice = upsert_block(&once, style, "k", "line one\nline two").unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_repatching_changed_content_updates_bounded_region_only() {
    let original = "\
# user rules
node_modules/
# stencil:begin stencil
.stencil/cache/
# stencil:end stencil
# more user rules
target/
";
    let patched = upsert_block(original, CommentStyle::Hash, "stencil", ".stencil/cache/\n.stencil/tmp/").unwrap();

    assert_eq!(
        patched,
        "\
# user rules
node_modules/
# stencil:begin stencil
.stencil/cache/
.stencil/tmp/
# stencil:end stencil
# more user rules
target/
"
    );
}

#[test]
fn test_blocks_with_different_keys_are_independent() {
    let content = upsert_block("", CommentStyle::Hash, "a", "one").unwrap();
    let content = upsert_block(&content, CommentStyle::Hash, "b", "two").unwrap();
    let content = upsert_block(&content, CommentStyle::Hash, "a", "uno").unwrap();

    let a = find_block(&content, CommentStyle::Hash, "a").unwrap().unwrap();
    let b = find_block(&content, CommentStyle::Hash, "b").unwrap().unwrap();
    assert_eq!(a.content, "uno\n");
    assert_eq!(b.content, "two\n");
}

#[test]
fn test_crlf_content_outside_markers_is_preserved() {
    let original = "keep\r\n# stencil:begin k\r\nold\r\n# stencil:end k\r\ntail\r\n";
    let patched = upsert_block(original, CommentStyle::Hash, "k", "new").unwrap();
    assert!(patched.starts_with("keep\r\n# stencil:begin k\r\n"));
    assert!(patched.ends_with("# stencil:end k\r\ntail\r\n"));
}

#[test]
fn test_unterminated_block_is_reported() {
    let broken = "# stencil:begin k\nno end marker\n";
    assert!(upsert_block(broken, CommentStyle::Hash, "k", "x").is_err());
}

#[test]
fn test_upsert_rejects_content_carrying_markers() {
    let err = upsert_block("", CommentStyle::Hash, "stencil", "a\n# stencil:end stencil\nb\n")
        .unwrap_err();
    assert!(matches!(err, Error::MarkerInBody { line: 2 }));
}
