//! Comment syntax used for block markers.

/// Comment syntax a block marker is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentStyle {
    /// `# stencil:begin key` (shell, YAML, TOML, .gitignore, ...)
    #[default]
    Hash,
    /// `<!-- stencil:begin key -->` (Markdown, HTML, XML)
    Html,
    /// `// stencil:begin key` (C-family, JS/TS, Rust, Go, JSONC)
    Slash,
}

impl CommentStyle {
    /// Pick a comment style from a file path's extension.
    pub fn for_path(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        let extension = match name.rfind('.') {
            Some(idx) if idx > 0 => &name[idx + 1..],
            _ => return Self::Hash,
        };

        match extension.to_ascii_lowercase().as_str() {
            "md" | "markdown" | "mdc" | "html" | "htm" | "xml" | "svg" => Self::Html,
            "js" | "mjs" | "cjs" | "ts" | "tsx" | "jsx" | "rs" | "go" | "c" | "h" | "cpp"
            | "hpp" | "java" | "kt" | "swift" | "jsonc" | "css" | "scss" => Self::Slash,
            _ => Self::Hash,
        }
    }

    fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            Self::Hash => ("# ", ""),
            Self::Html => ("<!-- ", " -->"),
            Self::Slash => ("// ", ""),
        }
    }

    /// The line opening block `key`.
    pub fn begin_marker(self, key: &str) -> String {
        let (open, close) = self.delimiters();
        format!("{open}stencil:begin {key}{close}")
    }

    /// The line closing block `key`.
    pub fn end_marker(self, key: &str) -> String {
        let (open, close) = self.delimiters();
        format!("{open}stencil:end {key}{close}")
    }

    /// If `line` is a marker in this style, return `(is_begin, key)`.
    pub(crate) fn parse_marker(self, line: &str) -> Option<(bool, &str)> {
        let (open, close) = self.delimiters();
        let inner = line.trim().strip_prefix(open)?.strip_suffix(close)?;
        if let Some(key) = inner.strip_prefix("stencil:begin ") {
            Some((true, key.trim()))
        } else {
            inner.strip_prefix("stencil:end ").map(|key| (false, key.trim()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_from_extension() {
        assert_eq!(CommentStyle::for_path("AGENTS.md"), CommentStyle::Html);
        assert_eq!(CommentStyle::for_path("src/lib.rs"), CommentStyle::Slash);
        assert_eq!(CommentStyle::for_path(".gitignore"), CommentStyle::Hash);
        assert_eq!(CommentStyle::for_path("config/app.yaml"), CommentStyle::Hash);
        assert_eq!(CommentStyle::for_path("Makefile"), CommentStyle::Hash);
    }

    #[test]
    fn markers_round_trip_through_parser() {
        for style in [CommentStyle::Hash, CommentStyle::Html, CommentStyle::Slash] {
            let begin = style.begin_marker("tools");
            let end = style.end_marker("tools");
            assert_eq!(style.parse_marker(&begin), Some((true, "tools")));
            assert_eq!(style.parse_marker(&end), Some((false, "tools")));
        }
    }

    #[test]
    fn foreign_comment_is_not_a_marker() {
        assert_eq!(CommentStyle::Hash.parse_marker("# just a comment"), None);
        assert_eq!(CommentStyle::Html.parse_marker("# stencil:begin x"), None);
    }
}
