//! Inspect report types and terminal formatting.

use std::fmt;

use serde::Serialize;

/// The result of inspecting a COCO document.
#[derive(Clone, Debug, Serialize)]
pub struct InspectReport {
    pub summary: SummarySection,
    /// One row per class, in class index order.
    pub classes: Vec<ClassRow>,
    pub boxes: BoxSection,
    /// Width of histogram bars (in characters).
    #[serde(skip)]
    pub(crate) bar_width: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SummarySection {
    pub images: usize,
    pub annotations: usize,
    pub categories: usize,
    /// Images that will get an empty label file.
    pub images_without_annotations: usize,
    /// Top-level keys besides `images`, `annotations` and `categories`.
    pub extra_keys: Vec<String>,
}

/// A class index with its COCO category and annotation count.
#[derive(Clone, Debug, Serialize)]
pub struct ClassRow {
    pub index: usize,
    pub category_id: u64,
    pub name: String,
    pub annotations: usize,
}

/// How the document's boxes would fare under the current box policy.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BoxSection {
    pub policy: String,
    pub total: usize,
    pub encodable: usize,
    pub degenerate: usize,
    pub outside_image: usize,
    /// Annotations whose category is not in the document's categories.
    pub unknown_category: usize,
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        writeln!(f, "Summary")?;
        writeln!(f, "  Images:       {:>8}", format_number(s.images))?;
        writeln!(f, "  Annotations:  {:>8}", format_number(s.annotations))?;
        writeln!(f, "  Categories:   {:>8}", format_number(s.categories))?;
        writeln!(
            f,
            "  Unannotated:  {:>8} ({})",
            format_number(s.images_without_annotations),
            fmt_percent(s.images_without_annotations, s.images)
        )?;
        if !s.extra_keys.is_empty() {
            writeln!(f, "  Other keys:   {}", s.extra_keys.join(", "))?;
        }
        writeln!(f)?;

        writeln!(f, "Classes ({})", self.classes.len())?;
        if self.classes.is_empty() {
            writeln!(f, "  No categories found.")?;
        } else {
            let max_count = self
                .classes
                .iter()
                .map(|c| c.annotations)
                .max()
                .unwrap_or(0);
            for row in &self.classes {
                writeln!(
                    f,
                    "  {:>3}  {:<16} (id {:>4}) {:>7}  {}",
                    row.index,
                    truncate_label(&row.name, 16),
                    row.category_id,
                    format_number(row.annotations),
                    render_bar(row.annotations, max_count, self.bar_width)
                )?;
            }
        }
        writeln!(f)?;

        let b = &self.boxes;
        writeln!(f, "Boxes ({} policy)", b.policy)?;
        writeln!(
            f,
            "  Encodable:    {:>8} / {} ({})",
            format_number(b.encodable),
            format_number(b.total),
            fmt_percent(b.encodable, b.total)
        )?;
        if b.degenerate > 0 {
            writeln!(f, "  Degenerate:   {:>8}", format_number(b.degenerate))?;
        }
        if b.outside_image > 0 {
            writeln!(f, "  Outside:      {:>8}", format_number(b.outside_image))?;
        }
        if b.unknown_category > 0 {
            writeln!(f, "  Unknown cat.: {:>8}", format_number(b.unknown_category))?;
        }

        Ok(())
    }
}

/// Format a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

fn fmt_percent(numerator: usize, denominator: usize) -> String {
    if denominator == 0 {
        "n/a".to_string()
    } else {
        format!("{:.1}%", (numerator as f64 / denominator as f64) * 100.0)
    }
}

fn render_bar(count: usize, max_count: usize, width: usize) -> String {
    if max_count == 0 || width == 0 {
        return String::new();
    }
    let filled = ((count * width) / max_count).min(width);
    "█".repeat(filled) + &"░".repeat(width - filled)
}

fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let head: String = label.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_fmt_percent() {
        assert_eq!(fmt_percent(0, 0), "n/a");
        assert_eq!(fmt_percent(1, 3), "33.3%");
    }

    #[test]
    fn test_render_bar() {
        assert_eq!(render_bar(5, 10, 10), "█████░░░░░");
        assert_eq!(render_bar(0, 0, 10), "");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_label("ripe", 16), "ripe");
        assert_eq!(truncate_label("äääääää", 4), "äää…");
    }
}
