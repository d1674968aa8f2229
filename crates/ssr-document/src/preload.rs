//! Preload markup for resolved page dependencies.

/// Kind of preload link emitted for a dependency file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadKind {
    /// JavaScript module (`.js`).
    ModulePreload,
    /// Stylesheet (`.css`).
    Stylesheet,
}

impl PreloadKind {
    /// Classify a file by suffix. Other suffixes get no link.
    pub fn for_file(file: &str) -> Option<Self> {
        if file.ends_with(".js") {
            Some(Self::ModulePreload)
        } else if file.ends_with(".css") {
            Some(Self::Stylesheet)
        } else {
            None
        }
    }

    /// Render the link tag for `href`.
    pub fn render(&self, href: &str) -> String {
        match self {
            Self::ModulePreload => format!(r#"<link rel="modulepreload" crossorigin href="{}">"#, href),
            Self::Stylesheet => format!(r#"<link rel="stylesheet" href="{}">"#, href),
        }
    }
}

/// Render preload links for `files`, in order.
pub fn render_preload_links<S: AsRef<str>>(files: &[S]) -> String {
    files
        .iter()
        .filter_map(|file| {
            let file = file.as_ref();
            PreloadKind::for_file(file).map(|kind| kind.render(file))
        })
        .collect()
}
