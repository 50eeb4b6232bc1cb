//! Fixed page geometry for the screening report, in PDF points with a
//! top-left origin (converted to printpdf's bottom-left Mm at draw time).
//!
//! A value object rather than module constants so tests can shrink the page
//! and exercise wrap/overflow behavior cheaply.

/// One legend entry placed by [`PageGeometry::legend_layout`].
#[derive(Debug, Clone, PartialEq)]
pub struct LegendSlot<'a> {
    pub label: &'a str,
    /// Swatch top-left, points from the page top-left.
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
pub struct PageGeometry {
    /// Page size in points (A4 portrait).
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,

    /// Image panel row.
    pub panel_y: f32,
    pub panel_width: f32,
    pub panel_height: f32,
    pub panel_start_x: f32,
    pub panel_gap: f32,
    pub panel_corner_radius: f32,

    /// Caption pill beneath each panel.
    pub caption_offset: f32,
    pub caption_height: f32,
    pub caption_radius: f32,

    /// Gap between a section heading's top and the first body row.
    pub section_body_offset: f32,

    /// Findings legend.
    pub findings_y: f32,
    pub legend_box: f32,
    pub legend_wrap_x: f32,
    pub legend_row_height: f32,

    /// Treatment recommendations.
    pub recommendations_y: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            margin: 40.0,
            panel_y: 80.0,
            panel_width: 160.0,
            panel_height: 120.0,
            panel_start_x: 45.0,
            panel_gap: 15.0,
            panel_corner_radius: 8.0,
            caption_offset: 10.0,
            caption_height: 25.0,
            caption_radius: 12.5,
            section_body_offset: 24.0,
            findings_y: 280.0,
            legend_box: 10.0,
            legend_wrap_x: 480.0,
            legend_row_height: 20.0,
            recommendations_y: 450.0,
        }
    }
}

impl PageGeometry {
    /// Left edge of panel `index` (0-based).
    pub fn panel_x(&self, index: usize) -> f32 {
        self.panel_start_x + index as f32 * (self.panel_width + self.panel_gap)
    }

    /// Top of the caption pill row.
    pub fn caption_y(&self) -> f32 {
        self.panel_y + self.panel_height + self.caption_offset
    }

    /// Assign swatch positions for the legend, left-to-right, wrapping to a
    /// new row once the cursor would pass `legend_wrap_x`. Entry widths use
    /// the same approximate Helvetica metrics as the draw pass, so layout
    /// and rendering always agree.
    pub fn legend_layout<'a>(&self, labels: &[&'a str], start_y: f32) -> Vec<LegendSlot<'a>> {
        let mut slots = Vec::with_capacity(labels.len());
        let mut x = self.margin;
        let mut y = start_y;
        for label in labels {
            slots.push(LegendSlot { label, x, y });
            x += super::pdf::approx_text_width(label, 10.0) + self.legend_box + 15.0;
            if x > self.legend_wrap_x {
                x = self.margin;
                y += self.legend_row_height;
            }
        }
        slots
    }
}
