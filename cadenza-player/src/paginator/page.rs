//! Renderable pages
//!
//! A page is a fixed sequence of content blocks. Pages are built once with
//! `PageBuilder` and never mutated; "changing" a page (for example adding
//! a page-number footer) produces a new one.

use serde::Serialize;

/// Accent for a page, mapped to a color by chat transports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Success,
    Error,
}

/// One content block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Block {
    Heading { text: String },
    Text { text: String },
    Field { name: String, value: String },
    Thumbnail { url: String },
    Footer { text: String },
}

/// Immutable page content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    tone: Tone,
    blocks: Vec<Block>,
}

impl Page {
    pub fn builder(title: impl Into<String>) -> PageBuilder {
        PageBuilder {
            tone: Tone::Success,
            blocks: vec![Block::Heading { text: title.into() }],
        }
    }

    /// Title plus one line of text, the shape of most command replies
    pub fn message(title: impl Into<String>, text: impl Into<String>, tone: Tone) -> Self {
        Self::builder(title).text(text).tone(tone).build()
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn title(&self) -> Option<&str> {
        self.blocks.iter().find_map(|b| match b {
            Block::Heading { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Copy of this page with a footer appended
    pub fn with_footer(&self, footer: impl Into<String>) -> Page {
        let mut blocks = self.blocks.clone();
        blocks.push(Block::Footer {
            text: footer.into(),
        });
        Page {
            tone: self.tone,
            blocks,
        }
    }

    /// Plain-text rendering for terminals and logs
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Heading { text } => out.push_str(&format!("== {} ==\n", text)),
                Block::Text { text } => out.push_str(&format!("{}\n", text)),
                Block::Field { name, value } => out.push_str(&format!("  {}: {}\n", name, value)),
                Block::Thumbnail { url } => out.push_str(&format!("  [thumbnail] {}\n", url)),
                Block::Footer { text } => out.push_str(&format!("-- {} --\n", text)),
            }
        }
        out
    }
}

/// Builder for `Page`
#[derive(Debug, Clone)]
pub struct PageBuilder {
    tone: Tone,
    blocks: Vec<Block>,
}

impl PageBuilder {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Text { text: text.into() });
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.blocks.push(Block::Field {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn thumbnail(mut self, url: Option<&str>) -> Self {
        if let Some(url) = url {
            self.blocks.push(Block::Thumbnail {
                url: url.to_string(),
            });
        }
        self
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn build(self) -> Page {
        Page {
            tone: self.tone,
            blocks: self.blocks,
        }
    }
}

/// Append "Page i/n" footers to a listing
pub fn number_pages(pages: Vec<Page>) -> Vec<Page> {
    let total = pages.len();
    pages
        .iter()
        .enumerate()
        .map(|(i, page)| page.with_footer(format!("Page {}/{}", i + 1, total)))
        .collect()
}
