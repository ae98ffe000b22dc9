//! # PDF Serializer
//!
//! Takes laid-out pages and writes a valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. The subset needed for reports is
//! small: standard Type1 fonts, filled and stroked paths, single-line text
//! and image XObjects.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, pages, content streams, etc.)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Text is encoded as WinAnsi bytes. Characters outside WinAnsi are written
//! as `?`, which is also the width the layout measured them with.

use std::collections::HashMap;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::RenderError;
use crate::font::{metrics, Font};
use crate::image_loader::{ImagePixelData, LoadedImage};
use crate::layout::{DrawCommand, LayoutPage, Stroke};
use crate::model::Metadata;
use crate::style::Color;

const PAGE_NUMBER: &str = "{{pageNumber}}";
const TOTAL_PAGES: &str = "{{totalPages}}";

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Font → object id, in resource-name order.
    font_objects: Vec<(Font, usize)>,
    /// XObject ids for images, referenced as /Im0, /Im1, ...
    image_objects: Vec<usize>,
    /// (page index, command index) → index into `image_objects`.
    image_index_map: HashMap<(usize, usize), usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    fn push_stream(&mut self, dict_entries: &str, content: &[u8]) -> usize {
        let mut data: Vec<u8> = Vec::with_capacity(content.len() + 64);
        let _ = write!(data, "<< {} /Length {} >>\nstream\n", dict_entries, content.len());
        data.extend_from_slice(content);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(&self, pages: &[LayoutPage], metadata: &Metadata) -> Result<Vec<u8>, RenderError> {
        if pages.is_empty() {
            return Err(RenderError::Render("document has no pages".to_string()));
        }

        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            image_objects: Vec::new(),
            image_index_map: HashMap::new(),
        };

        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        builder.objects.push(PdfObject { data: vec![] });
        builder.objects.push(PdfObject { data: vec![] });
        builder.objects.push(PdfObject { data: vec![] });

        self.register_fonts(&mut builder, pages);
        self.register_images(&mut builder, pages);

        let mut page_obj_ids: Vec<usize> = Vec::with_capacity(pages.len());
        for (page_idx, page) in pages.iter().enumerate() {
            let content = self.build_content_stream(page, page_idx, &builder, pages.len());
            let compressed = compress_to_vec_zlib(&content, 6);
            let content_obj_id = builder.push_stream("/Filter /FlateDecode", &compressed);

            let mut resources = format!("/Font << {} >>", self.build_font_resource_dict(&builder));
            let xobjects = self.build_xobject_resource_dict(page_idx, &builder);
            if !xobjects.is_empty() {
                resources.push_str(&format!(" /XObject << {} >>", xobjects));
            }
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width, page.height, content_obj_id, resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        let mut catalog = String::from("<< /Type /Catalog /Pages 2 0 R");
        if let Some(ref lang) = metadata.lang {
            catalog.push_str(&format!(" /Lang ({})", escape_pdf_string(lang)));
        }
        catalog.push_str(" >>");
        builder.objects[1].data = catalog.into_bytes();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = self.write_info(&mut builder, metadata);
        Ok(self.serialize(&builder, info_obj_id))
    }

    fn write_info(&self, builder: &mut PdfBuilder, metadata: &Metadata) -> Option<usize> {
        if metadata.title.is_none() && metadata.author.is_none() && metadata.subject.is_none() {
            return None;
        }
        let mut info: Vec<u8> = b"<< ".to_vec();
        let entries = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Creator", &metadata.creator),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                let _ = write!(info, "/{} (", key);
                info.extend_from_slice(&encode_text(value));
                info.extend_from_slice(b") ");
            }
        }
        info.extend_from_slice(b"/Producer (bogen) >>");
        Some(builder.push(info))
    }

    /// Build the content stream for a single page.
    fn build_content_stream(
        &self,
        page: &LayoutPage,
        page_idx: usize,
        builder: &PdfBuilder,
        total_pages: usize,
    ) -> Vec<u8> {
        let mut stream: Vec<u8> = Vec::new();

        for (cmd_idx, command) in page.commands.iter().enumerate() {
            match command {
                DrawCommand::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    stroke,
                } => {
                    if let Some(c) = fill {
                        let _ = write!(
                            stream,
                            "q\n{} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                            rgb(c),
                            x,
                            y,
                            width,
                            height
                        );
                    }
                    if let Some(s) = stroke {
                        let _ = write!(
                            stream,
                            "q\n{}{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n",
                            stroke_state(s),
                            x,
                            y,
                            width,
                            height
                        );
                    }
                }

                DrawCommand::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    stroke,
                } => {
                    let _ = write!(
                        stream,
                        "q\n{}{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                        stroke_state(stroke),
                        x1,
                        y1,
                        x2,
                        y2
                    );
                }

                DrawCommand::Text {
                    x,
                    y,
                    text,
                    font,
                    size,
                    color,
                } => {
                    let text = text
                        .replace(PAGE_NUMBER, &(page_idx + 1).to_string())
                        .replace(TOTAL_PAGES, &total_pages.to_string());
                    let _ = write!(
                        stream,
                        "BT\n{} rg\n/{} {:.1} Tf\n{:.2} {:.2} Td\n(",
                        rgb(color),
                        font_resource_name(*font),
                        size,
                        x,
                        y
                    );
                    stream.extend_from_slice(&encode_text(&text));
                    stream.extend_from_slice(b") Tj\nET\n");
                }

                DrawCommand::Image {
                    x,
                    y,
                    width,
                    height,
                    ..
                } => {
                    if let Some(img_idx) = builder.image_index_map.get(&(page_idx, cmd_idx)) {
                        let _ = write!(
                            stream,
                            "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                            width, height, x, y, img_idx
                        );
                    }
                }
            }
        }

        stream
    }

    /// Register the standard fonts actually used across all pages.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        let mut used: Vec<Font> = pages
            .iter()
            .flat_map(|p| p.commands.iter())
            .filter_map(|c| match c {
                DrawCommand::Text { font, .. } => Some(*font),
                _ => None,
            })
            .collect();
        used.sort();
        used.dedup();

        for font in used {
            let dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.standard().pdf_name()
            );
            let id = builder.push(dict.into_bytes());
            builder.font_objects.push((font, id));
        }
    }

    fn build_font_resource_dict(&self, builder: &PdfBuilder) -> String {
        builder
            .font_objects
            .iter()
            .map(|(font, id)| format!("/{} {} 0 R", font_resource_name(*font), id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Create XObject PDF objects for each image command and remember where
    /// each one is referenced from.
    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        for (page_idx, page) in pages.iter().enumerate() {
            for (cmd_idx, command) in page.commands.iter().enumerate() {
                if let DrawCommand::Image { image, .. } = command {
                    let img_idx = builder.image_objects.len();
                    let xobj_id = Self::write_image_xobject(builder, image);
                    builder.image_objects.push(xobj_id);
                    builder.image_index_map.insert((page_idx, cmd_idx), img_idx);
                }
            }
        }
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let dict = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode",
                    image.width_px,
                    image.height_px,
                    color_space.pdf_name()
                );
                builder.push_stream(&dict, data)
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_id = alpha.as_ref().map(|alpha_data| {
                    let dict = format!(
                        "/Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode",
                        image.width_px, image.height_px
                    );
                    builder.push_stream(&dict, &compress_to_vec_zlib(alpha_data, 6))
                });

                let smask_ref = smask_id
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();
                let dict = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode{}",
                    image.width_px, image.height_px, smask_ref
                );
                builder.push_stream(&dict, &compress_to_vec_zlib(rgb, 6))
            }
        }
    }

    /// Build the /XObject resource dict entries for a specific page.
    fn build_xobject_resource_dict(&self, page_idx: usize, builder: &PdfBuilder) -> String {
        let mut entries: Vec<(usize, usize)> = builder
            .image_index_map
            .iter()
            .filter(|((pidx, _), _)| *pidx == page_idx)
            .map(|(_, &img_idx)| (img_idx, builder.image_objects[img_idx]))
            .collect();
        entries.sort_by_key(|(idx, _)| *idx);
        entries
            .iter()
            .map(|(idx, obj_id)| format!("/Im{} {} 0 R", idx, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(output, "trailer\n<< /Size {} /Root 1 0 R", builder.objects.len());
        if let Some(info_id) = info_obj_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}

fn font_resource_name(font: Font) -> &'static str {
    match font {
        Font::Regular => "F0",
        Font::Bold => "F1",
    }
}

fn rgb(c: &Color) -> String {
    format!("{:.3} {:.3} {:.3}", c.r, c.g, c.b)
}

fn stroke_state(s: &Stroke) -> String {
    format!("{:.3} {:.3} {:.3} RG\n{:.2} w\n", s.color.r, s.color.g, s.color.b, s.width)
}

/// Escape special characters in a PDF string.
fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Encode text as escaped WinAnsi bytes for a literal string. Characters
/// without a measured width become `?`, matching what layout measured.
fn encode_text(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for ch in s.chars() {
        let byte = if metrics::is_covered(ch) {
            unicode_to_winansi(ch).unwrap_or(b'?')
        } else {
            b'?'
        };
        match byte {
            b'\\' | b'(' | b')' => {
                out.push(b'\\');
                out.push(byte);
            }
            _ => out.push(byte),
        }
    }
    out
}

/// Map a Unicode codepoint to a WinAnsiEncoding byte value.
///
/// WinAnsiEncoding is based on Windows-1252. Most codepoints in
/// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
/// contains special mappings for smart quotes, bullets, dashes, etc.
fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x20AC => Some(0x80), // Euro sign
        0x201A => Some(0x82), // Single low-9 quotation mark
        0x0192 => Some(0x83), // Latin small letter f with hook
        0x201E => Some(0x84), // Double low-9 quotation mark
        0x2026 => Some(0x85), // Horizontal ellipsis
        0x2020 => Some(0x86), // Dagger
        0x2021 => Some(0x87), // Double dagger
        0x02C6 => Some(0x88), // Modifier letter circumflex accent
        0x2030 => Some(0x89), // Per mille sign
        0x0160 => Some(0x8A), // Latin capital letter S with caron
        0x2039 => Some(0x8B), // Single left-pointing angle quotation
        0x0152 => Some(0x8C), // Latin capital ligature OE
        0x017D => Some(0x8E), // Latin capital letter Z with caron
        0x2018 => Some(0x91), // Left single quotation mark
        0x2019 => Some(0x92), // Right single quotation mark
        0x201C => Some(0x93), // Left double quotation mark
        0x201D => Some(0x94), // Right double quotation mark
        0x2022 => Some(0x95), // Bullet
        0x2013 => Some(0x96), // En dash
        0x2014 => Some(0x97), // Em dash
        0x02DC => Some(0x98), // Small tilde
        0x2122 => Some(0x99), // Trade mark sign
        0x0161 => Some(0x9A), // Latin small letter s with caron
        0x203A => Some(0x9B), // Single right-pointing angle quotation
        0x0153 => Some(0x9C), // Latin small ligature oe
        0x017E => Some(0x9E), // Latin small letter z with caron
        0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::ImageAsset;
    use crate::text::TextStyle;
    use crate::units::{A4_HEIGHT_PT, A4_WIDTH_PT};

    fn page() -> LayoutPage {
        LayoutPage::new(A4_WIDTH_PT, A4_HEIGHT_PT)
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(escape_pdf_string("Hello (World)"), "Hello \\(World\\)");
        assert_eq!(escape_pdf_string("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_encode_text_winansi() {
        assert_eq!(encode_text("Maß €"), vec![b'M', b'a', 0xDF, b' ', 0x80]);
        assert_eq!(encode_text("(λ)"), b"\\(?\\)".to_vec());
    }

    #[test]
    fn test_every_encoded_glyph_has_a_measured_width() {
        for cp in 0x20u32..0x2200 {
            let Some(ch) = char::from_u32(cp) else { continue };
            let encoded = encode_text(&ch.to_string());
            if encoded != b"?" && ch != '?' {
                assert!(metrics::is_covered(ch), "{:?} encoded without a width", ch);
            }
        }
        assert_eq!(encode_text("Isofloc™ ±¾"), vec![b'I', b's', b'o', b'f', b'l', b'o', b'c', 0x99, b' ', 0xB1, 0xBE]);
    }

    #[test]
    fn test_no_pages_is_an_error() {
        assert!(PdfWriter::new().write(&[], &Metadata::default()).is_err());
    }

    #[test]
    fn test_empty_page_produces_valid_pdf() {
        let bytes = PdfWriter::new().write(&[page()], &Metadata::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(contains(&bytes, b"%%EOF"));
        assert!(contains(&bytes, b"xref"));
        assert!(contains(&bytes, b"/Count 1"));
        assert!(!contains(&bytes, b"/Info"));
    }

    #[test]
    fn test_metadata_in_pdf() {
        let metadata = Metadata {
            title: Some("Prüfprotokoll A-1".to_string()),
            author: Some("bogen".to_string()),
            lang: Some("de-DE".to_string()),
            ..Default::default()
        };
        let bytes = PdfWriter::new().write(&[page()], &metadata).unwrap();
        assert!(contains(&bytes, b"/Title (Pr\xfcfprotokoll A-1)"));
        assert!(contains(&bytes, b"/Author (bogen)"));
        assert!(contains(&bytes, b"/Lang (de-DE)"));
    }

    #[test]
    fn test_only_used_fonts_registered() {
        let mut p = page();
        p.text(10.0, 10.0, "fett", &TextStyle::new(Font::Bold, 9.0, 11.0), Color::BLACK);
        let bytes = PdfWriter::new().write(&[p], &Metadata::default()).unwrap();
        assert!(contains(&bytes, b"/BaseFont /Helvetica-Bold"));
        assert!(!contains(&bytes, b"/BaseFont /Helvetica "));
    }

    #[test]
    fn test_page_numbers_substituted() {
        let style = TextStyle::new(Font::Regular, 8.0, 10.0);
        let mut pages = vec![page(), page()];
        for p in &mut pages {
            p.text(10.0, 10.0, "Seite {{pageNumber}} von {{totalPages}}", &style, Color::BLACK);
        }
        let writer = PdfWriter::new();
        let builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            image_objects: Vec::new(),
            image_index_map: HashMap::new(),
        };
        let second = writer.build_content_stream(&pages[1], 1, &builder, 2);
        assert!(contains(&second, b"(Seite 2 von 2) Tj"));
    }

    #[test]
    fn test_png_with_alpha_gets_smask() {
        let png = crate::image_loader::tests::png_bytes(2, 2, 100);
        let image = ImageAsset::from_bytes(png).decode().unwrap().unwrap();
        let mut p = page();
        p.image(50.0, 50.0, 100.0, 100.0, image);
        let bytes = PdfWriter::new().write(&[p], &Metadata::default()).unwrap();
        assert!(contains(&bytes, b"/SMask"));
        assert!(contains(&bytes, b"/XObject << /Im0"));
    }

    #[test]
    fn test_jpeg_is_embedded_with_dct() {
        let jpeg = crate::image_loader::tests::jpeg_bytes(2, 2);
        let image = ImageAsset::from_bytes(jpeg).decode().unwrap().unwrap();
        let mut p = page();
        p.image(0.0, 0.0, 20.0, 20.0, image);
        let bytes = PdfWriter::new().write(&[p], &Metadata::default()).unwrap();
        assert!(contains(&bytes, b"/Filter /DCTDecode"));
    }

    #[test]
    fn test_output_parses_with_lopdf() {
        let style = TextStyle::new(Font::Regular, 9.0, 11.0);
        let mut pages = vec![page(), page(), page()];
        pages[2].text(40.0, 700.0, "Außenwand", &style, Color::BLACK);
        let bytes = PdfWriter::new().write(&pages, &Metadata::default()).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }
}
