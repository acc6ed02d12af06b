//! Text-to-image rendering for digests

use crate::RenderError;

/// Visual options for rendered text
#[derive(Clone, Debug)]
pub struct StyleOptions {
    pub font_family: String,
    pub font_size: u32,
    pub line_height: u32,
    pub padding: u32,
    pub foreground: String,
    pub background: String,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 24,
            line_height: 34,
            padding: 24,
            foreground: "#1f2933".to_string(),
            background: "#ffffff".to_string(),
        }
    }
}

/// Turns text into image bytes
pub trait Renderer: Send + Sync {
    fn render_text(&self, text: &str, style: &StyleOptions) -> Result<Vec<u8>, RenderError>;
}

/// Renders each input line as an SVG `<text>` element
#[derive(Clone, Debug, Default)]
pub struct SvgRenderer;

impl Renderer for SvgRenderer {
    fn render_text(&self, text: &str, style: &StyleOptions) -> Result<Vec<u8>, RenderError> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.iter().all(|l| l.trim().is_empty()) {
            return Err(RenderError::Empty);
        }
        if style.font_size == 0 || style.line_height == 0 {
            return Err(RenderError::Failed(
                "font size and line height must be positive".to_string(),
            ));
        }

        // Rough advance width of 0.6em per character.
        // Sizes saturate rather than wrap on absurd input.
        let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let widest = u32::try_from(widest).unwrap_or(u32::MAX);
        let line_count = u32::try_from(lines.len()).unwrap_or(u32::MAX);
        let width = style
            .padding
            .saturating_mul(2)
            .saturating_add(widest.saturating_mul(style.font_size) / 5 * 3);
        let height = style
            .padding
            .saturating_mul(2)
            .saturating_add(line_count.saturating_mul(style.line_height));

        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            w = width,
            h = height
        );
        svg.push_str(&format!(
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
            escape(&style.background)
        ));
        for (i, line) in lines.iter().enumerate() {
            let row = u32::try_from(i + 1).unwrap_or(u32::MAX);
            let baseline = style
                .padding
                .saturating_add(row.saturating_mul(style.line_height));
            let y = baseline.saturating_sub(style.line_height.saturating_sub(style.font_size) / 2);
            svg.push_str(&format!(
                "<text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>\n",
                style.padding,
                y,
                escape(&style.font_family),
                style.font_size,
                escape(&style.foreground),
                escape(line)
            ));
        }
        svg.push_str("</svg>\n");

        Ok(svg.into_bytes())
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
