//! Report Renderer: clinical summary to a paginated A4 PDF via `printpdf`.
//!
//! Every page carries the same header band: title, generation time, patient
//! identifiers and, when an archive link is supplied, a QR code encoding it.
//! Each render writes a new file; names are derived from the patient id, the
//! timestamp and a random suffix.

pub mod layout;

pub use layout::*;

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use printpdf::*;
use thiserror::Error;

use crate::config::AppConfig;

pub const REPORT_TITLE: &str = "Akupunktur Klinik Raporu";

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 15.0;
const MARGIN_RIGHT: f32 = 15.0;
const MARGIN_BOTTOM: f32 = 20.0;
const BODY_TOP: f32 = 252.0;
const QR_SIZE: f32 = 25.0;
const QR_TOP: f32 = 287.0;

const BODY_FONT_SIZE: f32 = 12.0;
const BODY_LINE_HEIGHT: f32 = 6.0;
const SPACER_HEIGHT: f32 = 3.0;
/// Characters per wrapped body line at `BODY_FONT_SIZE`.
const BODY_MAX_CHARS: usize = 85;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("PDF font error: {0}")]
    Font(String),

    #[error("QR code error: {0}")]
    QrCode(String),

    #[error("PDF save error: {0}")]
    Save(String),

    #[error("Cannot write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a successful render.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub path: PathBuf,
    pub body: Vec<BodyBlock>,
}

impl RenderedReport {
    /// The drawn body text, one entry per wrapped line.
    pub fn body_text(&self) -> Vec<String> {
        self.body
            .iter()
            .flat_map(|block| block.lines().iter().cloned())
            .collect()
    }

    pub fn unwritable_lines(&self) -> usize {
        self.body
            .iter()
            .filter(|b| matches!(b, BodyBlock::Unwritable { .. }))
            .count()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

pub struct ReportRenderer {
    output_dir: PathBuf,
    font_path: PathBuf,
}

impl ReportRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, font_path: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            font_path: font_path.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.reports_dir, &config.font_path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render the report and write it to a fresh file in the output directory.
    pub fn render(
        &self,
        summary: &str,
        patient_name: &str,
        patient_id: &str,
        archive_link: Option<&str>,
    ) -> Result<RenderedReport, ReportError> {
        let now = Local::now();
        let (bytes, body) =
            self.render_to_bytes(summary, patient_name, patient_id, archive_link, &now)?;

        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(report_file_name(patient_id, &now));
        fs::write(&path, &bytes)?;

        tracing::info!(
            path = %path.display(),
            size = bytes.len(),
            body_lines = body.len(),
            "Report written"
        );
        Ok(RenderedReport { path, body })
    }

    /// Render the report in memory. Returns PDF bytes and the laid-out body.
    pub fn render_to_bytes(
        &self,
        summary: &str,
        patient_name: &str,
        patient_id: &str,
        archive_link: Option<&str>,
        generated_at: &DateTime<Local>,
    ) -> Result<(Vec<u8>, Vec<BodyBlock>), ReportError> {
        let (doc, page1, layer1) =
            PdfDocument::new(REPORT_TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let (font, coverage) = self.load_font(&doc)?;

        let qr = archive_link.map(QrMatrix::encode).transpose()?;
        let header = Header {
            date_line: format!("Tarih: {}", generated_at.format("%d.%m.%Y %H:%M")),
            patient_line: (!patient_name.is_empty() || !patient_id.is_empty())
                .then(|| format!("Hasta: {patient_name} | ID: {patient_id}")),
            qr,
        };

        let body = compose_body(summary, &coverage, BODY_MAX_CHARS);

        let mut page = PageCursor {
            doc: &doc,
            layer: doc.get_page(page1).get_layer(layer1),
            y: BODY_TOP,
            font: &font,
            coverage: &coverage,
            header: &header,
            pages: 1,
        };
        page.draw_header();

        page.set_gray(0.2);
        for line in [
            format!("Hasta Adı Soyadı: {patient_name}"),
            format!("Hasta ID: {patient_id}"),
        ] {
            for wrapped in wrap_text(&encode_lossy(&line, &coverage), 90) {
                page.text_line(&wrapped, 11.0, 5.5);
            }
        }
        page.advance(3.0);
        page.set_gray(0.0);

        for block in &body {
            match block {
                BodyBlock::Spacer => page.advance(SPACER_HEIGHT),
                BodyBlock::Paragraph(lines) | BodyBlock::Unwritable { lines, .. } => {
                    for line in lines {
                        page.text_line(line, BODY_FONT_SIZE, BODY_LINE_HEIGHT);
                    }
                }
            }
        }

        tracing::debug!(pages = page.pages, "Report laid out");

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| ReportError::Save(e.to_string()))?;
        let bytes = buf
            .into_inner()
            .map_err(|e| ReportError::Save(format!("PDF buffer error: {e}")))?;
        Ok((bytes, body))
    }

    /// Embed the configured TrueType font, falling back to built-in Helvetica.
    fn load_font(
        &self,
        doc: &PdfDocumentReference,
    ) -> Result<(IndirectFontRef, FontCoverage), ReportError> {
        match self.embed_font(doc) {
            Ok(loaded) => return Ok(loaded),
            Err(reason) => tracing::warn!(
                path = %self.font_path.display(),
                error = %reason,
                "Font could not be embedded, using Helvetica"
            ),
        }

        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Font(e.to_string()))?;
        Ok((font, FontCoverage::WinAnsi))
    }

    /// Read the font file once: its cmap decides which characters are
    /// writable, the same bytes are embedded in the document.
    fn embed_font(
        &self,
        doc: &PdfDocumentReference,
    ) -> Result<(IndirectFontRef, FontCoverage), String> {
        let bytes = fs::read(&self.font_path).map_err(|e| e.to_string())?;
        let glyphs =
            GlyphSet::from_font(&bytes).ok_or_else(|| "no Unicode character map".to_string())?;
        let font = doc
            .add_external_font(bytes.as_slice())
            .map_err(|e| e.to_string())?;
        tracing::debug!(glyphs = glyphs.len(), "Font embedded");
        Ok((font, FontCoverage::Embedded(glyphs)))
    }
}

/// File name for a report: `rapor_<id>_<YYYYmmdd_HHMMSS>_<8 hex>.pdf`.
pub fn report_file_name(patient_id: &str, at: &DateTime<Local>) -> String {
    let mut slug: String = patient_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(32)
        .collect();
    if slug.trim_matches('_').is_empty() {
        slug = "hasta".to_string();
    }
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "rapor_{slug}_{}_{}.pdf",
        at.format("%Y%m%d_%H%M%S"),
        &suffix[..8]
    )
}

struct Header {
    date_line: String,
    patient_line: Option<String>,
    qr: Option<QrMatrix>,
}

/// Module grid of a QR code, drawn as filled squares.
struct QrMatrix {
    width: usize,
    dark: Vec<bool>,
}

impl QrMatrix {
    fn encode(link: &str) -> Result<Self, ReportError> {
        let code = qrcode::QrCode::new(link.as_bytes())
            .map_err(|e| ReportError::QrCode(e.to_string()))?;
        let width = code.width();
        let dark = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();
        Ok(Self { width, dark })
    }
}

struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    font: &'a IndirectFontRef,
    coverage: &'a FontCoverage,
    header: &'a Header,
    pages: usize,
}

impl PageCursor<'_> {
    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = BODY_TOP;
        self.pages += 1;
        self.draw_header();
        self.set_gray(0.0);
    }

    fn draw_header(&self) {
        self.set_gray(0.0);

        let title_width = approx_text_width(REPORT_TITLE, 16.0);
        self.layer.use_text(
            REPORT_TITLE,
            16.0,
            Mm((PAGE_WIDTH - title_width) / 2.0),
            Mm(280.0),
            self.font,
        );

        // The QR code occupies the top-right corner.
        let right_edge = if self.header.qr.is_some() {
            PAGE_WIDTH - MARGIN_RIGHT - QR_SIZE - 3.0
        } else {
            PAGE_WIDTH - MARGIN_RIGHT
        };
        let date_width = approx_text_width(&self.header.date_line, 10.0);
        self.layer.use_text(
            self.header.date_line.as_str(),
            10.0,
            Mm(right_edge - date_width),
            Mm(272.0),
            self.font,
        );

        if let Some(patient) = &self.header.patient_line {
            self.layer.use_text(
                encode_lossy(patient, self.coverage),
                10.0,
                Mm(MARGIN_LEFT),
                Mm(264.0),
                self.font,
            );
        }

        if let Some(qr) = &self.header.qr {
            self.draw_qr(qr);
        }
    }

    fn draw_qr(&self, qr: &QrMatrix) {
        let quiet = 2.0;
        let module = QR_SIZE / (qr.width as f32 + 2.0 * quiet);
        let left = PAGE_WIDTH - MARGIN_RIGHT - QR_SIZE + quiet * module;
        let top = QR_TOP - quiet * module;

        for (i, _) in qr.dark.iter().enumerate().filter(|(_, dark)| **dark) {
            let col = (i % qr.width) as f32;
            let row = (i / qr.width) as f32;
            let rect = Rect::new(
                Mm(left + col * module),
                Mm(top - (row + 1.0) * module),
                Mm(left + (col + 1.0) * module),
                Mm(top - row * module),
            );
            self.layer.add_rect(rect);
        }
    }

    fn set_gray(&self, level: f32) {
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(level, level, level, None)));
    }

    fn advance(&mut self, height: f32) {
        self.y -= height;
        if self.y < MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn text_line(&mut self, text: &str, size: f32, line_height: f32) {
        if self.y - line_height < MARGIN_BOTTOM {
            self.new_page();
        }
        self.y -= line_height;
        self.layer
            .use_text(text, size, Mm(MARGIN_LEFT), Mm(self.y), self.font);
    }
}

/// Rough width of a text run in millimetres (half an em per character).
fn approx_text_width(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * size_pt * 0.5 * 0.3528
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = "Qi eksikliği tespit edildi.\n\n<b>Akupunktur Noktaları</b>\n- LI4\n- GB20";

    fn renderer(dir: &Path) -> ReportRenderer {
        // Missing font path: exercises the Helvetica fallback deterministically.
        ReportRenderer::new(dir.join("reports"), dir.join("no-such-font.ttf"))
    }

    #[test]
    fn render_writes_pdf_file() {
        let tmp = tempfile::tempdir().unwrap();
        let report = renderer(tmp.path())
            .render(SUMMARY, "Ayşe Yılmaz", "P-001", None)
            .unwrap();

        assert!(report.path.exists());
        assert!(report.path.starts_with(tmp.path().join("reports")));
        let bytes = fs::read(&report.path).unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
        assert_eq!(report.unwritable_lines(), 0);
    }

    #[test]
    fn body_text_is_tag_stripped() {
        let tmp = tempfile::tempdir().unwrap();
        let report = renderer(tmp.path())
            .render(SUMMARY, "Ayşe", "P-001", None)
            .unwrap();
        assert_eq!(
            report.body_text(),
            vec![
                "Qi eksikligi tespit edildi.".to_string(),
                "Akupunktur Noktalari".to_string(),
                "- LI4".to_string(),
                "- GB20".to_string(),
            ]
        );
        assert_eq!(report.body[1], BodyBlock::Spacer);
    }

    #[test]
    fn rendering_twice_gives_same_body_and_distinct_files() {
        let tmp = tempfile::tempdir().unwrap();
        let r = renderer(tmp.path());
        let first = r.render(SUMMARY, "Ayşe", "P-001", None).unwrap();
        let second = r.render(SUMMARY, "Ayşe", "P-001", None).unwrap();

        assert_eq!(first.body_text(), second.body_text());
        assert_ne!(first.path, second.path);
        assert!(first.path.exists());
        assert!(second.path.exists());
    }

    #[test]
    fn unwritable_line_is_replaced_and_rest_renders() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = "Birinci satır\nQi (气) durgunluğu\nÜçüncü satır";
        let report = renderer(tmp.path())
            .render(summary, "Ali", "7", None)
            .unwrap();

        assert!(report.path.exists());
        assert_eq!(report.unwritable_lines(), 1);
        let text = report.body_text();
        assert_eq!(text[0], "Birinci satir");
        assert!(text[1].starts_with("[Yazilamadi:"));
        assert!(text[1].contains("karakteri yazi tipinde yok"));
        assert_eq!(text[2], "Üçüncü satir");
    }

    /// The default production font, when installed on this machine.
    fn installed_font() -> Option<PathBuf> {
        let path = PathBuf::from(crate::config::DEFAULT_FONT_PATH);
        if path.is_file() {
            Some(path)
        } else {
            eprintln!("{} not installed, skipping", path.display());
            None
        }
    }

    #[test]
    fn embedded_font_cmap_covers_turkish_but_not_cjk() {
        let Some(font) = installed_font() else { return };
        let glyphs = GlyphSet::from_font(&fs::read(font).unwrap()).unwrap();
        for c in "şŞğĞıİçöü".chars() {
            assert!(glyphs.contains(c), "missing {c}");
        }
        assert!(!glyphs.contains('气'));
    }

    #[test]
    fn embedded_font_missing_glyph_becomes_placeholder() {
        let Some(font) = installed_font() else { return };
        let tmp = tempfile::tempdir().unwrap();
        let report = ReportRenderer::new(tmp.path().join("reports"), font)
            .render(
                "Birinci satır\nQi (气) durgunluğu\nÜçüncü satır",
                "Ayşe",
                "P-1",
                None,
            )
            .unwrap();

        assert!(report.path.exists());
        assert_eq!(report.unwritable_lines(), 1);
        let text = report.body_text();
        assert_eq!(text[0], "Birinci satır");
        assert_eq!(text[1], "[Yazılamadı: '?' karakteri yazı tipinde yok]");
        assert_eq!(text[2], "Üçüncü satır");
    }

    #[test]
    fn embedded_font_keeps_turkish_text() {
        let Some(font) = installed_font() else { return };
        let tmp = tempfile::tempdir().unwrap();
        let report = ReportRenderer::new(tmp.path().join("reports"), font)
            .render(SUMMARY, "Ayşe", "P-001", None)
            .unwrap();
        assert_eq!(report.body_text()[0], "Qi eksikliği tespit edildi.");
        assert_eq!(report.unwritable_lines(), 0);
    }

    #[test]
    fn unparseable_font_falls_back_to_builtin() {
        let tmp = tempfile::tempdir().unwrap();
        let font = tmp.path().join("bozuk.ttf");
        fs::write(&font, b"not a font").unwrap();
        let report = ReportRenderer::new(tmp.path().join("reports"), font)
            .render(SUMMARY, "Ayşe", "P-001", None)
            .unwrap();
        assert_eq!(report.body_text()[0], "Qi eksikligi tespit edildi.");
    }

    #[test]
    fn archive_link_embeds_qr_code() {
        let tmp = tempfile::tempdir().unwrap();
        let r = renderer(tmp.path());
        let now = Local::now();
        let (with_qr, _) = r
            .render_to_bytes(SUMMARY, "Ali", "7", Some("https://example.org/kayit/7"), &now)
            .unwrap();
        let (without_qr, _) = r.render_to_bytes(SUMMARY, "Ali", "7", None, &now).unwrap();

        assert_eq!(&with_qr[0..4], b"%PDF");
        assert!(with_qr.len() > without_qr.len());
    }

    #[test]
    fn long_summary_spans_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = (0..200)
            .map(|i| format!("Satır {i}: LI4, ST36, SP6 noktaları uygulanacak."))
            .collect::<Vec<_>>()
            .join("\n");
        let report = renderer(tmp.path()).render(&summary, "", "", None).unwrap();
        assert_eq!(report.body.len(), 200);
        assert!(fs::metadata(&report.path).unwrap().len() > 0);
    }

    #[test]
    fn file_name_is_sanitized_and_unique() {
        let now = Local::now();
        let a = report_file_name("../../etc/passwd", &now);
        let b = report_file_name("../../etc/passwd", &now);
        assert!(a.starts_with(&format!("rapor_{}etc_passwd_", "_".repeat(6))));
        assert!(a.ends_with(".pdf"));
        assert!(!a.contains('/'));
        assert_ne!(a, b);
    }

    #[test]
    fn empty_patient_id_uses_placeholder_slug() {
        let name = report_file_name("  ", &Local::now());
        assert!(name.starts_with("rapor_hasta_"));
    }

    #[test]
    fn overlong_link_is_a_qr_error() {
        let tmp = tempfile::tempdir().unwrap();
        let link = "x".repeat(8000);
        let err = renderer(tmp.path())
            .render_to_bytes("a", "b", "c", Some(&link), &Local::now())
            .unwrap_err();
        assert!(matches!(err, ReportError::QrCode(_)));
    }
}
