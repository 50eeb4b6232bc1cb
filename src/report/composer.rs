//! The report composer: turns an annotated submission into a stored PDF.
//!
//! Pipeline per compose call: validate prerequisites → fetch each required
//! image (sequential, abort on first failure) → draw header, image panels
//! with caption pills, findings legend, and treatment recommendations →
//! serialize → hand bytes to the sink. `generate_report` adds the persist
//! phase (status + report URL, with one automatic retry).

use std::io::BufWriter;

use printpdf::path::PaintMode;
use printpdf::{
    image_crate, BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfLayerReference, Rect,
};
use rusqlite::Connection;

use super::findings::{unique_labels, FindingTables};
use super::geometry::PageGeometry;
use super::pdf::{
    approx_text_width, baseline, black, hex_color, pt_to_mm, rounded_rect, white, wrap_text,
    y_from_top,
};
use super::ComposeError;
use crate::db::repository::record_report;
use crate::fetch::ImageFetcher;
use crate::models::{Submission, SubmissionImages};
use crate::sink::ReportSink;

/// Caption pill fill color.
const CAPTION_FILL: &str = "#E57373";

/// Image placement resolution; panel scale factors are derived from it.
const IMAGE_DPI: f32 = 300.0;

/// Result of a successful compose: the document itself and its durable URL.
#[derive(Debug)]
pub struct ComposedReport {
    pub document_bytes: Vec<u8>,
    pub url: String,
}

/// One image panel ready to draw.
struct Panel {
    caption: &'static str,
    bytes: Vec<u8>,
}

pub struct ReportComposer<F, S> {
    fetcher: F,
    sink: S,
    tables: FindingTables,
    geometry: PageGeometry,
}

impl<F: ImageFetcher, S: ReportSink> ReportComposer<F, S> {
    pub fn new(fetcher: F, sink: S) -> Self {
        Self {
            fetcher,
            sink,
            tables: FindingTables::default(),
            geometry: PageGeometry::default(),
        }
    }

    pub fn with_tables(mut self, tables: FindingTables) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Compose the report for an annotated submission and store it.
    ///
    /// Fails with `PrerequisiteNotMet` before any fetch when an image
    /// reference the layout needs is missing.
    pub fn compose(&self, submission: &Submission) -> Result<ComposedReport, ComposeError> {
        let annotated_url = submission
            .annotated_image_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(ComposeError::PrerequisiteNotMet)?;
        if submission.images.source_urls().iter().any(|u| u.is_empty()) {
            return Err(ComposeError::PrerequisiteNotMet);
        }

        // Fetch phase. The centre panel of the three-view layout shows the
        // annotated markup of the front view; the front photo is still
        // fetched so a broken reference fails the compose here, not later.
        let panels = match &submission.images {
            SubmissionImages::ThreePanel {
                upper_url,
                front_url,
                lower_url,
            } => {
                let upper = self.fetcher.fetch(upper_url)?;
                let _front = self.fetcher.fetch(front_url)?;
                let lower = self.fetcher.fetch(lower_url)?;
                let annotated = self.fetcher.fetch(annotated_url)?;
                vec![
                    Panel {
                        caption: "Upper Teeth",
                        bytes: upper,
                    },
                    Panel {
                        caption: "Front Teeth",
                        bytes: annotated,
                    },
                    Panel {
                        caption: "Lower Teeth",
                        bytes: lower,
                    },
                ]
            }
            SubmissionImages::SinglePanel { original_url } => {
                let original = self.fetcher.fetch(original_url)?;
                let annotated = self.fetcher.fetch(annotated_url)?;
                vec![
                    Panel {
                        caption: "Original",
                        bytes: original,
                    },
                    Panel {
                        caption: "Annotated",
                        bytes: annotated,
                    },
                ]
            }
        };

        let labels = unique_labels(&submission.annotation_data);
        let document_bytes = self.render(&panels, &labels)?;

        let file_name = format!("report-{}.pdf", submission.id);
        let url = self.sink.store(&document_bytes, &file_name)?;

        tracing::info!(
            submission = %submission.id,
            %url,
            findings = labels.len(),
            "screening report composed"
        );

        Ok(ComposedReport {
            document_bytes,
            url,
        })
    }

    /// Draw the full document. Panel positions, legend order, and
    /// recommendation order are deterministic for identical inputs.
    fn render(&self, panels: &[Panel], labels: &[&str]) -> Result<Vec<u8>, ComposeError> {
        let g = &self.geometry;
        let (doc, page_idx, layer_idx) = PdfDocument::new(
            "Screening Report",
            pt_to_mm(g.page_width),
            pt_to_mm(g.page_height),
            "Layer 1",
        );
        let mut layer = doc.get_page(page_idx).get_layer(layer_idx);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ComposeError::Render(format!("font: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ComposeError::Render(format!("font: {e}")))?;

        // Header
        layer.set_fill_color(black());
        layer.use_text(
            "SCREENING REPORT:",
            18.0,
            pt_to_mm(g.margin),
            y_from_top(g.page_height, baseline(g.margin, 18.0)),
            &bold,
        );

        // Image panels with caption pills
        for (i, panel) in panels.iter().enumerate() {
            let x = g.panel_x(i);
            self.draw_panel(&layer, panel, x)?;
            self.draw_caption(&layer, panel.caption, x, &bold);
        }

        // Findings legend
        self.draw_heading(&layer, "FINDINGS:", g.findings_y, &bold);
        for slot in g.legend_layout(labels, g.findings_y + g.section_body_offset) {
            layer.set_fill_color(hex_color(self.tables.color_for(slot.label)));
            layer.add_rect(
                Rect::new(
                    pt_to_mm(slot.x),
                    y_from_top(g.page_height, slot.y + g.legend_box),
                    pt_to_mm(slot.x + g.legend_box),
                    y_from_top(g.page_height, slot.y),
                )
                .with_mode(PaintMode::Fill),
            );
            layer.set_fill_color(black());
            layer.use_text(
                slot.label,
                10.0,
                pt_to_mm(slot.x + g.legend_box + 5.0),
                y_from_top(g.page_height, baseline(slot.y, 10.0)),
                &font,
            );
        }

        // Treatment recommendations. Labels without a table entry are
        // legend-only: they contribute no line here, and when every label
        // is legend-only the section is simply empty. The placeholder is
        // reserved for submissions with no findings at all.
        self.draw_heading(&layer, "TREATMENT RECOMMENDATIONS:", g.recommendations_y, &bold);
        let mut y = g.recommendations_y + g.section_body_offset;
        let recs: Vec<(&str, &str)> = labels
            .iter()
            .filter_map(|l| self.tables.recommendation_for(l).map(|r| (*l, r)))
            .collect();

        if labels.is_empty() {
            layer.use_text(
                "No specific treatment recommendations.",
                11.0,
                pt_to_mm(g.margin),
                y_from_top(g.page_height, baseline(y, 11.0)),
                &font,
            );
        } else {
            let bottom_limit = g.page_height - g.margin;
            for (label, rec) in recs {
                let lines = wrap_text(rec, 80);
                let needed = 14.0 + lines.len() as f32 * 12.0;
                if y + needed > bottom_limit {
                    // Overflow onto a fresh page
                    let (pidx, lidx) =
                        doc.add_page(pt_to_mm(g.page_width), pt_to_mm(g.page_height), "Layer 1");
                    layer = doc.get_page(pidx).get_layer(lidx);
                    layer.set_fill_color(black());
                    y = g.margin;
                }
                layer.use_text(
                    format!("\u{2022} {label}:"),
                    11.0,
                    pt_to_mm(g.margin),
                    y_from_top(g.page_height, baseline(y, 11.0)),
                    &bold,
                );
                y += 14.0;
                for line in lines {
                    layer.use_text(
                        line,
                        10.0,
                        pt_to_mm(g.margin + 20.0),
                        y_from_top(g.page_height, baseline(y, 10.0)),
                        &font,
                    );
                    y += 12.0;
                }
                y += 6.0;
            }
        }

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| ComposeError::Render(format!("save: {e}")))?;
        buf.into_inner()
            .map_err(|e| ComposeError::Render(format!("buffer: {e}")))
    }

    /// Place one image inside its rounded-rect panel bounds.
    ///
    /// The image is scaled to the panel width with aspect preserved; any
    /// vertical overflow is clipped by the rounded bounds, matching the
    /// caption-pill layout regardless of source aspect ratio.
    fn draw_panel(
        &self,
        layer: &PdfLayerReference,
        panel: &Panel,
        x: f32,
    ) -> Result<(), ComposeError> {
        let g = &self.geometry;
        let dyn_img = image_crate::load_from_memory(&panel.bytes)
            .map_err(|e| ComposeError::Render(format!("decode {}: {e}", panel.caption)))?;
        let (px_w, px_h) = image_crate::GenericImageView::dimensions(&dyn_img);
        let image = Image::from_dynamic_image(&dyn_img);

        let natural_w_mm = px_w as f32 * 25.4 / IMAGE_DPI;
        let natural_h_mm = px_h as f32 * 25.4 / IMAGE_DPI;
        let scale = pt_to_mm(g.panel_width).0 / natural_w_mm;
        let drawn_h_mm = natural_h_mm * scale;

        layer.save_graphics_state();
        layer.add_polygon(rounded_rect(
            x,
            g.panel_y,
            g.panel_width,
            g.panel_height,
            g.panel_corner_radius,
            g.page_height,
            PaintMode::Clip,
        ));
        let panel_top_mm = y_from_top(g.page_height, g.panel_y).0;
        image.add_to_layer(
            layer.clone(),
            ImageTransform {
                translate_x: Some(pt_to_mm(x)),
                translate_y: Some(Mm(panel_top_mm - drawn_h_mm)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        layer.restore_graphics_state();
        Ok(())
    }

    /// Caption pill: rounded accent bar with centered white bold text.
    fn draw_caption(
        &self,
        layer: &PdfLayerReference,
        caption: &str,
        x: f32,
        bold: &IndirectFontRef,
    ) {
        let g = &self.geometry;
        let y = g.caption_y();
        layer.set_fill_color(hex_color(CAPTION_FILL));
        layer.add_polygon(rounded_rect(
            x,
            y,
            g.panel_width,
            g.caption_height,
            g.caption_radius,
            g.page_height,
            PaintMode::Fill,
        ));
        layer.set_fill_color(white());
        let text_x = x + (g.panel_width - approx_text_width(caption, 11.0)) / 2.0;
        layer.use_text(
            caption,
            11.0,
            pt_to_mm(text_x),
            y_from_top(g.page_height, baseline(y + 7.0, 11.0)),
            bold,
        );
    }

    /// Bold underlined section heading at the left margin.
    fn draw_heading(
        &self,
        layer: &PdfLayerReference,
        text: &str,
        y_top: f32,
        bold: &IndirectFontRef,
    ) {
        let g = &self.geometry;
        layer.set_fill_color(black());
        layer.use_text(
            text,
            14.0,
            pt_to_mm(g.margin),
            y_from_top(g.page_height, baseline(y_top, 14.0)),
            bold,
        );
        let underline_y = y_top + 14.0 + 1.5;
        layer.add_rect(
            Rect::new(
                pt_to_mm(g.margin),
                y_from_top(g.page_height, underline_y + 0.7),
                pt_to_mm(g.margin + approx_text_width(text, 14.0)),
                y_from_top(g.page_height, underline_y),
            )
            .with_mode(PaintMode::Fill),
        );
    }
}

/// Compose a report and persist the outcome: `report_url` set and status
/// advanced to `reported` in one write. No store write happens when
/// composition or storage failed.
pub fn generate_report<F: ImageFetcher, S: ReportSink>(
    conn: &Connection,
    submission: &Submission,
    composer: &ReportComposer<F, S>,
) -> Result<ComposedReport, ComposeError> {
    let report = composer.compose(submission)?;
    persist_report_url(conn, &submission.id, &report.url)?;
    Ok(report)
}

/// Record the report URL with one automatic retry.
///
/// The sink already holds the artifact at this point, so a failed write
/// orphans the upload; the retry reuses the obtained URL rather than
/// re-uploading.
pub fn persist_report_url(
    conn: &Connection,
    id: &str,
    url: &str,
) -> Result<(), ComposeError> {
    if let Err(first) = record_report(conn, id, url) {
        tracing::error!(
            submission = id,
            url,
            error = %first,
            "report stored but submission update failed; retrying once"
        );
        record_report(conn, id, url).map_err(|retry| ComposeError::PersistFailed {
            url: url.to_string(),
            reason: retry.to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;

    use super::*;
    use crate::db::repository::{annotate_submission, create_submission, get_submission, NewSubmission};
    use crate::db::sqlite::open_memory_database;
    use crate::fetch::FetchError;
    use crate::models::{Annotation, PatientInfo, SubmissionStatus};
    use crate::sink::SinkError;

    // ── Test doubles ─────────────────────────────────────────────────────

    struct MapFetcher {
        images: HashMap<String, Vec<u8>>,
        fetched: Mutex<Vec<String>>,
    }

    impl MapFetcher {
        fn new(urls: &[&str]) -> Self {
            let png = tiny_png();
            Self {
                images: urls.iter().map(|u| (u.to_string(), png.clone())).collect(),
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetched.lock().unwrap().len()
        }
    }

    impl ImageFetcher for MapFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.images
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    struct MemorySink {
        stored: Mutex<Vec<String>>,
        fail: bool,
    }

    impl MemorySink {
        fn new() -> Self {
            Self {
                stored: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                stored: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn upload_count(&self) -> usize {
            self.stored.lock().unwrap().len()
        }
    }

    impl ReportSink for MemorySink {
        fn store(&self, _bytes: &[u8], file_name: &str) -> Result<String, SinkError> {
            if self.fail {
                return Err(SinkError::Store {
                    file_name: file_name.to_string(),
                    reason: "simulated outage".into(),
                });
            }
            self.stored.lock().unwrap().push(file_name.to_string());
            Ok(format!("/reports/{file_name}"))
        }
    }

    fn tiny_png() -> Vec<u8> {
        let img = image_crate::DynamicImage::new_rgb8(4, 3);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image_crate::ImageFormat::Png)
            .unwrap();
        buf
    }

    /// Whether the document draws `text`. Text runs are written as
    /// uppercase-hex WinAnsi strings, so ASCII content is searchable as
    /// its hex expansion.
    fn contains_text(document: &[u8], text: &str) -> bool {
        let needle: Vec<u8> = text
            .bytes()
            .flat_map(|b| format!("{b:02X}").into_bytes())
            .collect();
        document.windows(needle.len()).any(|w| w == needle)
    }

    const PLACEHOLDER: &str = "No specific treatment recommendations.";

    const UPPER: &str = "https://img/upper.jpg";
    const FRONT: &str = "https://img/front.jpg";
    const LOWER: &str = "https://img/lower.jpg";
    const ANNOTATED: &str = "https://img/annotated.png";
    const ORIGINAL: &str = "https://img/original.jpg";

    fn ann(label: &str) -> Annotation {
        Annotation {
            shape: "rect".into(),
            label: label.into(),
            details: serde_json::Value::Null,
        }
    }

    fn three_panel_submission(annotations: Vec<Annotation>) -> Submission {
        Submission {
            id: "sub-1".into(),
            patient_info: PatientInfo {
                name: "Asha Rao".into(),
                patient_id: "P-1041".into(),
                email: "asha@example.com".into(),
            },
            note: None,
            images: SubmissionImages::ThreePanel {
                upper_url: UPPER.into(),
                front_url: FRONT.into(),
                lower_url: LOWER.into(),
            },
            annotated_image_url: Some(ANNOTATED.into()),
            annotation_data: annotations,
            status: SubmissionStatus::Annotated,
            report_url: None,
            created_at: "2026-08-01T00:00:00Z".into(),
            updated_at: "2026-08-01T00:00:00Z".into(),
        }
    }

    fn composer(fetcher: MapFetcher, sink: MemorySink) -> ReportComposer<MapFetcher, MemorySink> {
        ReportComposer::new(fetcher, sink)
    }

    // ── Compose pipeline ─────────────────────────────────────────────────

    #[test]
    fn compose_produces_pdf_and_url() {
        let c = composer(
            MapFetcher::new(&[UPPER, FRONT, LOWER, ANNOTATED]),
            MemorySink::new(),
        );
        let submission = three_panel_submission(vec![ann("Caries"), ann("Stains")]);

        let report = c.compose(&submission).unwrap();

        assert_eq!(&report.document_bytes[0..4], b"%PDF");
        assert_eq!(report.url, "/reports/report-sub-1.pdf");
        assert_eq!(c.sink.upload_count(), 1);
        // All four references fetched: three source views + annotated markup
        assert_eq!(c.fetcher.fetch_count(), 4);
    }

    #[test]
    fn compose_single_panel_variant() {
        let c = composer(MapFetcher::new(&[ORIGINAL, ANNOTATED]), MemorySink::new());
        let mut submission = three_panel_submission(vec![ann("Caries")]);
        submission.images = SubmissionImages::SinglePanel {
            original_url: ORIGINAL.into(),
        };

        let report = c.compose(&submission).unwrap();
        assert_eq!(&report.document_bytes[0..4], b"%PDF");
        assert_eq!(c.fetcher.fetch_count(), 2);
    }

    #[test]
    fn missing_annotated_image_fails_before_any_fetch() {
        let c = composer(
            MapFetcher::new(&[UPPER, FRONT, LOWER, ANNOTATED]),
            MemorySink::new(),
        );
        let mut submission = three_panel_submission(vec![]);
        submission.annotated_image_url = None;

        let err = c.compose(&submission).unwrap_err();
        assert!(matches!(err, ComposeError::PrerequisiteNotMet));
        assert_eq!(c.fetcher.fetch_count(), 0);
        assert_eq!(c.sink.upload_count(), 0);
    }

    #[test]
    fn fetch_failure_aborts_without_partial_document() {
        // Lower view 404s while upper and front succeed
        let c = composer(MapFetcher::new(&[UPPER, FRONT, ANNOTATED]), MemorySink::new());
        let submission = three_panel_submission(vec![ann("Caries")]);

        let err = c.compose(&submission).unwrap_err();
        match err {
            ComposeError::AssetFetchFailed(FetchError::Status { url, status }) => {
                assert_eq!(url, LOWER);
                assert_eq!(status, 404);
            }
            other => panic!("expected AssetFetchFailed, got {other:?}"),
        }
        // Nothing was emitted
        assert_eq!(c.sink.upload_count(), 0);
        // Upper and front were fetched before the abort
        let fetched = c.fetcher.fetched.lock().unwrap().clone();
        assert_eq!(fetched, vec![UPPER.to_string(), FRONT.to_string(), LOWER.to_string()]);
    }

    #[test]
    fn sink_failure_is_surfaced_and_nothing_persisted() {
        let c = composer(
            MapFetcher::new(&[UPPER, FRONT, LOWER, ANNOTATED]),
            MemorySink::failing(),
        );
        let submission = three_panel_submission(vec![ann("Caries")]);

        let err = c.compose(&submission).unwrap_err();
        assert!(matches!(err, ComposeError::SinkUploadFailed(_)));
    }

    #[test]
    fn empty_findings_compose_with_placeholder() {
        let c = composer(
            MapFetcher::new(&[UPPER, FRONT, LOWER, ANNOTATED]),
            MemorySink::new(),
        );
        let submission = three_panel_submission(vec![]);

        let report = c.compose(&submission).unwrap();
        assert_eq!(&report.document_bytes[0..4], b"%PDF");
        assert!(contains_text(&report.document_bytes, PLACEHOLDER));
    }

    #[test]
    fn legend_only_labels_leave_recommendations_empty() {
        // "Other" has a swatch color but no treatment entry; with findings
        // present the placeholder must not appear.
        let c = composer(
            MapFetcher::new(&[UPPER, FRONT, LOWER, ANNOTATED]),
            MemorySink::new(),
        );
        let submission = three_panel_submission(vec![ann("Other")]);

        let report = c.compose(&submission).unwrap();
        assert!(contains_text(&report.document_bytes, "Other"));
        assert!(!contains_text(&report.document_bytes, PLACEHOLDER));
    }

    #[test]
    fn unrecognized_label_uses_fallback_and_composes() {
        let c = composer(
            MapFetcher::new(&[UPPER, FRONT, LOWER, ANNOTATED]),
            MemorySink::new(),
        );
        let submission =
            three_panel_submission(vec![ann("Mystery finding"), ann("Caries")]);

        let report = c.compose(&submission).unwrap();
        assert_eq!(&report.document_bytes[0..4], b"%PDF");
    }

    #[test]
    fn duplicate_labels_compose_once() {
        let c = composer(
            MapFetcher::new(&[UPPER, FRONT, LOWER, ANNOTATED]),
            MemorySink::new(),
        );
        let submission = three_panel_submission(vec![
            ann("Caries"),
            ann("Stains"),
            ann("Caries"),
            ann("Caries"),
        ]);

        assert!(c.compose(&submission).is_ok());
        assert_eq!(
            unique_labels(&submission.annotation_data),
            vec!["Caries", "Stains"]
        );
    }

    #[test]
    fn many_findings_overflow_to_second_page() {
        let c = composer(
            MapFetcher::new(&[UPPER, FRONT, LOWER, ANNOTATED]),
            MemorySink::new(),
        );
        let mut g = PageGeometry::default();
        g.page_height = 520.0; // recommendations start near the bottom edge
        g.recommendations_y = 470.0;
        let c = c.with_geometry(g);

        let submission = three_panel_submission(vec![
            ann("Caries"),
            ann("Stains"),
            ann("Attrition"),
            ann("Scaling"),
        ]);

        let report = c.compose(&submission).unwrap();
        assert_eq!(&report.document_bytes[0..4], b"%PDF");
    }

    #[test]
    fn compose_is_deterministic_in_url_and_ordering() {
        let submission = three_panel_submission(vec![ann("Stains"), ann("Caries")]);

        let first = composer(
            MapFetcher::new(&[UPPER, FRONT, LOWER, ANNOTATED]),
            MemorySink::new(),
        )
        .compose(&submission)
        .unwrap();
        let second = composer(
            MapFetcher::new(&[UPPER, FRONT, LOWER, ANNOTATED]),
            MemorySink::new(),
        )
        .compose(&submission)
        .unwrap();

        assert_eq!(first.url, second.url);
        assert_eq!(
            unique_labels(&submission.annotation_data),
            vec!["Stains", "Caries"]
        );
    }

    // ── Persist phase ────────────────────────────────────────────────────

    fn seeded_annotated(conn: &Connection) -> Submission {
        let created = create_submission(
            conn,
            &NewSubmission {
                patient_info: PatientInfo {
                    name: "Asha Rao".into(),
                    patient_id: "P-1041".into(),
                    email: "asha@example.com".into(),
                },
                note: None,
                images: SubmissionImages::ThreePanel {
                    upper_url: UPPER.into(),
                    front_url: FRONT.into(),
                    lower_url: LOWER.into(),
                },
            },
        )
        .unwrap();
        annotate_submission(conn, &created.id, ANNOTATED, &[ann("Caries")]).unwrap()
    }

    #[test]
    fn generate_report_persists_url_and_status() {
        let conn = open_memory_database().unwrap();
        let submission = seeded_annotated(&conn);
        let c = composer(
            MapFetcher::new(&[UPPER, FRONT, LOWER, ANNOTATED]),
            MemorySink::new(),
        );

        let report = generate_report(&conn, &submission, &c).unwrap();

        let stored = get_submission(&conn, &submission.id).unwrap();
        assert_eq!(stored.status, SubmissionStatus::Reported);
        assert_eq!(stored.report_url.as_deref(), Some(report.url.as_str()));
    }

    #[test]
    fn generate_report_fetch_failure_leaves_status_unchanged() {
        let conn = open_memory_database().unwrap();
        let submission = seeded_annotated(&conn);
        // Lower view unreachable
        let c = composer(MapFetcher::new(&[UPPER, FRONT, ANNOTATED]), MemorySink::new());

        let err = generate_report(&conn, &submission, &c).unwrap_err();
        assert!(matches!(err, ComposeError::AssetFetchFailed(_)));

        let stored = get_submission(&conn, &submission.id).unwrap();
        assert_eq!(stored.status, SubmissionStatus::Annotated);
        assert!(stored.report_url.is_none());
    }

    #[test]
    fn persist_failure_after_upload_surfaces_and_retry_reuses_url() {
        let conn = open_memory_database().unwrap();
        let submission = seeded_annotated(&conn);
        let c = composer(
            MapFetcher::new(&[UPPER, FRONT, LOWER, ANNOTATED]),
            MemorySink::new(),
        );

        // Upload succeeds...
        let report = c.compose(&submission).unwrap();
        assert_eq!(c.sink.upload_count(), 1);

        // ...but the store write fails (row vanished, e.g. concurrent delete)
        conn.execute("DELETE FROM submissions WHERE id = ?1", [&submission.id])
            .unwrap();
        let err = persist_report_url(&conn, &submission.id, &report.url).unwrap_err();
        match err {
            ComposeError::PersistFailed { url, .. } => assert_eq!(url, report.url),
            other => panic!("expected PersistFailed, got {other:?}"),
        }

        // Caller-level retry with the already-obtained URL, once the store
        // recovers, succeeds without touching the sink again.
        let recovered = seeded_annotated(&conn);
        persist_report_url(&conn, &recovered.id, &report.url).unwrap();
        let stored = get_submission(&conn, &recovered.id).unwrap();
        assert_eq!(stored.status, SubmissionStatus::Reported);
        assert_eq!(stored.report_url.as_deref(), Some(report.url.as_str()));
        assert_eq!(c.sink.upload_count(), 1);
    }
}
