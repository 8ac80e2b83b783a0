//! Typed document assembly.
//!
//! A document is an ordered list of typed blocks. Order is fixed by block kind
//! (style, underlay, structure, data, bootstrap, behavior) regardless of push
//! order; blocks of the same kind keep their push order. Each kind is escaped
//! for the context it lands in when rendered.

use crate::bootstrap::{MEDIA_ELEMENT_ID, OVERLAY_ID, UNDERLAY_ID};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Underlay {
    /// Foreign page in an iframe.
    Page { url: String },
    /// `video` or `audio` element.
    Media { url: String, tag: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Style(String),
    Underlay(Underlay),
    Structure(String),
    /// Script-safe JSON texts for the config and data globals.
    Data { config_json: String, data_json: String },
    Bootstrap { name: &'static str, source: String },
    Behavior(String),
}

impl Block {
    fn rank(&self) -> u8 {
        match self {
            Block::Style(_) => 0,
            Block::Underlay(_) => 1,
            Block::Structure(_) => 2,
            Block::Data { .. } => 3,
            Block::Bootstrap { .. } => 4,
            Block::Behavior(_) => 5,
        }
    }
}

/// One script in execution order, as the harness evaluates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptUnit {
    pub label: String,
    pub source: String,
}

#[derive(Debug, Default)]
pub struct DocumentBuilder {
    title: String,
    blocks: Vec<Block>,
}

impl DocumentBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn style(self, css: impl Into<String>) -> Self {
        self.block(Block::Style(css.into()))
    }

    pub fn structure(self, html: impl Into<String>) -> Self {
        self.block(Block::Structure(html.into()))
    }

    pub fn bootstrap(self, name: &'static str, source: impl Into<String>) -> Self {
        self.block(Block::Bootstrap {
            name,
            source: source.into(),
        })
    }

    pub fn behavior(self, js: impl Into<String>) -> Self {
        self.block(Block::Behavior(js.into()))
    }

    pub fn build(mut self) -> Document {
        self.blocks.sort_by_key(Block::rank);
        Document {
            title: self.title,
            blocks: self.blocks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    title: String,
    blocks: Vec<Block>,
}

impl Document {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn has_underlay(&self) -> bool {
        self.blocks.iter().any(|b| matches!(b, Block::Underlay(_)))
    }

    /// Concatenated body markup: underlay plus structure, as rendered.
    pub fn body_markup(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Underlay(underlay) => out.push_str(&render_underlay(underlay)),
                Block::Structure(html) => out.push_str(html),
                _ => {}
            }
        }
        out
    }

    /// Raw behavior source (unwrapped).
    pub fn behavior(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Behavior(js) => Some(js.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Every script in document order, with the same text the browser runs.
    pub fn scripts(&self) -> Vec<ScriptUnit> {
        self.blocks.iter().filter_map(script_unit).collect()
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        );
        out.push_str(&format!("<title>{}</title>\n", escape_html(&self.title)));
        for block in &self.blocks {
            if let Block::Style(css) = block {
                out.push_str(&format!("<style>\n{}\n</style>\n", escape_style(css)));
            }
        }
        out.push_str("</head>\n<body>\n");

        let overlay = self.has_underlay();
        let mut overlay_open = false;
        for block in &self.blocks {
            match block {
                Block::Style(_) => {}
                Block::Underlay(underlay) => {
                    out.push_str(&render_underlay(underlay));
                    out.push('\n');
                }
                Block::Structure(html) => {
                    if overlay && !overlay_open {
                        out.push_str(&format!("<div id=\"{}\">\n", OVERLAY_ID));
                        overlay_open = true;
                    }
                    out.push_str(html);
                    out.push('\n');
                }
                script => {
                    if overlay_open {
                        out.push_str("</div>\n");
                        overlay_open = false;
                    }
                    if let Some(unit) = script_unit(script) {
                        out.push_str(&format!(
                            "<script data-interaction=\"{}\">\n{}\n</script>\n",
                            escape_html(&unit.label),
                            unit.source
                        ));
                    }
                }
            }
        }
        if overlay_open {
            out.push_str("</div>\n");
        }
        out.push_str("</body>\n</html>\n");
        out
    }
}

fn script_unit(block: &Block) -> Option<ScriptUnit> {
    let (label, source) = match block {
        Block::Data {
            config_json,
            data_json,
        } => (
            "data-bootstrap".to_string(),
            crate::bootstrap::data_bootstrap(config_json, data_json),
        ),
        Block::Bootstrap { name, source } => (format!("bootstrap:{}", name), source.clone()),
        Block::Behavior(js) => ("behavior".to_string(), wrap_behavior(js)),
        _ => return None,
    };
    Some(ScriptUnit {
        label,
        source: escape_script(&source),
    })
}

/// Behavior runs last inside an error boundary that swaps the surface for
/// the diagnostic panel.
pub fn wrap_behavior(js: &str) -> String {
    format!(
        "try {{\n{}\n}} catch (err) {{\n  window.__interactionShowDiagnostic(err);\n}}",
        js
    )
}

fn render_underlay(underlay: &Underlay) -> String {
    match underlay {
        Underlay::Page { url } => format!(
            "<iframe id=\"{}\" src=\"{}\" title=\"Embedded page\" allow=\"fullscreen\" referrerpolicy=\"no-referrer\"></iframe>",
            UNDERLAY_ID,
            escape_html(url)
        ),
        Underlay::Media { url, tag } => format!(
            "<{tag} id=\"{}\" src=\"{}\" playsinline preload=\"metadata\"></{tag}>",
            MEDIA_ELEMENT_ID,
            escape_html(url),
            tag = tag
        ),
    }
}

// ─── Per-context escaping ────────────────────────────────────────────────────

fn closing_tag(tag: &'static str) -> Option<&'static Regex> {
    static SCRIPT: OnceLock<Option<Regex>> = OnceLock::new();
    static STYLE: OnceLock<Option<Regex>> = OnceLock::new();
    let cell = if tag == "script" { &SCRIPT } else { &STYLE };
    cell.get_or_init(|| Regex::new(&format!(r"(?i)</({})", tag)).ok())
        .as_ref()
}

/// Neutralize `</script` and `<!--` inside script text.
pub fn escape_script(js: &str) -> String {
    let escaped = match closing_tag("script") {
        Some(re) => re.replace_all(js, r"<\/$1").into_owned(),
        None => js.replace("</script", r"<\/script"),
    };
    escaped.replace("<!--", r"<\!--")
}

/// Neutralize `</style` inside style text.
pub fn escape_style(css: &str) -> String {
    match closing_tag("style") {
        Some(re) => re.replace_all(css, r"<\/$1").into_owned(),
        None => css.replace("</style", r"<\/style"),
    }
}

/// JSON safe to embed as a script expression: no `<`, `>`, `&` or JS line
/// terminators survive literally.
pub fn embed_json(value: &Value) -> serde_json::Result<String> {
    let raw = serde_json::to_string(value)?;
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    Ok(out)
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
