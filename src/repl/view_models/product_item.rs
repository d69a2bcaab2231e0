//! # Product Item ViewModel
//!
//! Display adapter for a single product: price, review label and feature
//! bullets, pre-formatted for the list and detail panes.

use crate::config::GlyphStyle;
use crate::repl::models::Product;

/// Decorations placed in front of labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    /// Precedes the review score
    Star,
    /// Precedes each feature bullet
    Checkmark,
}

/// How a span should be painted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpanStyle {
    #[default]
    Plain,
    /// Highlighted (green) glyph
    Accent,
    /// Dimmed (grey) glyph
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

/// Styled text made of spans; newlines inside spans separate lines
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RichText {
    spans: Vec<Span>,
}

impl RichText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.push(text, SpanStyle::Plain);
    }

    pub fn push(&mut self, text: impl Into<String>, style: SpanStyle) {
        self.spans.push(Span {
            text: text.into(),
            style,
        });
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|span| span.text.is_empty())
    }

    /// Text without styling
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    /// Split into lines of spans at every `'\n'`; a trailing newline does not
    /// produce an extra empty line.
    pub fn lines(&self) -> Vec<Vec<Span>> {
        let mut lines = vec![Vec::new()];
        for span in &self.spans {
            let mut parts = span.text.split('\n').peekable();
            while let Some(part) = parts.next() {
                if !part.is_empty() {
                    if let Some(line) = lines.last_mut() {
                        line.push(Span {
                            text: part.to_string(),
                            style: span.style,
                        });
                    }
                }
                if parts.peek().is_some() {
                    lines.push(Vec::new());
                }
            }
        }
        if lines.len() > 1 && lines.last().is_some_and(Vec::is_empty) {
            lines.pop();
        }
        lines
    }
}

/// Symbols available for glyphs under the configured style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphSet {
    style: GlyphStyle,
}

impl GlyphSet {
    pub fn new(style: GlyphStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> GlyphStyle {
        self.style
    }

    pub fn symbol(&self, glyph: Glyph) -> Option<&'static str> {
        match (self.style, glyph) {
            (GlyphStyle::Unicode, Glyph::Star) => Some("★"),
            (GlyphStyle::Unicode, Glyph::Checkmark) => Some("✔"),
            (GlyphStyle::Ascii, Glyph::Star) => Some("*"),
            (GlyphStyle::Ascii, Glyph::Checkmark) => Some("+"),
            (GlyphStyle::None, _) => None,
        }
    }

    /// Span for `glyph`, or an empty span when the glyph cannot be produced
    fn attachment(&self, glyph: Glyph) -> Span {
        let style = match glyph {
            Glyph::Star => SpanStyle::Accent,
            Glyph::Checkmark => SpanStyle::Muted,
        };
        Span {
            text: self.symbol(glyph).unwrap_or_default().to_string(),
            style,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductItemViewModel {
    product: Product,
    glyphs: GlyphSet,
}

impl ProductItemViewModel {
    pub fn new(product: Product, glyphs: GlyphSet) -> Self {
        Self { product, glyphs }
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn name(&self) -> &str {
        &self.product.product_name
    }

    pub fn image_path(&self) -> &str {
        &self.product.product_image
    }

    /// `"$ 1299.00"`
    pub fn formatted_price(&self) -> String {
        format!("$ {:.2}", self.product.sales_price_inc_vat)
    }

    /// Star glyph followed by `" 8.5 (120 reviews)"`
    pub fn formatted_review(&self) -> RichText {
        let summary = self.product.review_summary();
        let mut text = RichText::new();
        let star = self.glyphs.attachment(Glyph::Star);
        text.push(star.text, star.style);
        text.push_text(format!(
            " {} ({} reviews)",
            format_rating(summary.review_average),
            summary.review_count
        ));
        text
    }

    /// One checkmark line per feature, each ending in a newline
    pub fn formatted_usps(&self) -> RichText {
        let mut text = RichText::new();
        for usp in &self.product.usps {
            let check = self.glyphs.attachment(Glyph::Checkmark);
            text.push(check.text, check.style);
            text.push_text(format!(" {usp}"));
            text.push_text("\n");
        }
        text
    }
}

/// Ratings print like floating point literals: always at least one decimal
fn format_rating(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(style: GlyphStyle) -> ProductItemViewModel {
        let product = Product::new(
            "Apple iPhone 13 128GB",
            "https://img.example.com/iphone.png",
            909.0,
            vec!["A15 Bionic".to_string(), "Dual camera".to_string()],
            9.2,
            1203,
        );
        ProductItemViewModel::new(product, GlyphSet::new(style))
    }

    #[test]
    fn price_should_have_two_decimals_and_currency_prefix() {
        assert_eq!(item(GlyphStyle::Unicode).formatted_price(), "$ 909.00");

        let mut cheap = item(GlyphStyle::Unicode).product().clone();
        cheap.sales_price_inc_vat = 4.999;
        let cheap = ProductItemViewModel::new(cheap, GlyphSet::default());
        assert_eq!(cheap.formatted_price(), "$ 5.00");
    }

    #[test]
    fn review_should_show_star_average_and_count() {
        let review = item(GlyphStyle::Unicode).formatted_review();
        assert_eq!(review.plain_text(), "★ 9.2 (1203 reviews)");
        assert_eq!(review.spans()[0].style, SpanStyle::Accent);
    }

    #[test]
    fn whole_ratings_should_keep_one_decimal() {
        assert_eq!(format_rating(4.0), "4.0");
        assert_eq!(format_rating(4.5), "4.5");
        assert_eq!(format_rating(3.25), "3.25");
        assert_eq!(format_rating(0.0), "0.0");
    }

    #[test]
    fn usps_should_render_one_bullet_line_each() {
        let usps = item(GlyphStyle::Unicode).formatted_usps();
        assert_eq!(usps.plain_text(), "✔ A15 Bionic\n✔ Dual camera\n");

        let lines = usps.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0][0].text, "✔");
        assert_eq!(lines[0][0].style, SpanStyle::Muted);
        assert_eq!(lines[1][1].text, " Dual camera");
    }

    #[test]
    fn ascii_glyphs_should_replace_symbols() {
        let view = item(GlyphStyle::Ascii);
        assert_eq!(view.formatted_review().plain_text(), "* 9.2 (1203 reviews)");
        assert!(view.formatted_usps().plain_text().starts_with("+ A15 Bionic"));
    }

    #[test]
    fn missing_glyphs_should_fall_back_to_empty_text() {
        let view = item(GlyphStyle::None);
        assert_eq!(view.formatted_review().plain_text(), " 9.2 (1203 reviews)");
        assert_eq!(
            view.formatted_usps().plain_text(),
            " A15 Bionic\n Dual camera\n"
        );
    }

    #[test]
    fn product_without_usps_should_have_empty_bullets() {
        let product = Product::new("Cable", "", 2.0, Vec::new(), 0.0, 0);
        let view = ProductItemViewModel::new(product, GlyphSet::default());
        assert!(view.formatted_usps().is_empty());
        assert_eq!(view.formatted_usps().lines(), vec![Vec::<Span>::new()]);
        assert_eq!(view.image_path(), "");
        assert_eq!(view.name(), "Cable");
    }
}
