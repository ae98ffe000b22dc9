//! Inspection protocol: flowed layout and template overlay.

use crate::error::RenderError;
use crate::format;
use crate::layout::card::{Card, CardRenderer, CardRow};
use crate::layout::flow::{Chrome, PageFlow, PageGeometry};
use crate::layout::image_block::{ImageBlock, ImageBlockRenderer, ImageSlot};
use crate::layout::table::{Column, Table, TableRenderer};
use crate::model::{CheckKey, Metadata, ReportInput};
use crate::overlay::{Calibration, OverlayLayout, OverlayMapper, TemplateDocument, TemplateSource};
use crate::pdf::PdfWriter;

use super::DocumentRenderer;

pub const PROTOCOL_TITLE: &str = "Prüfprotokoll Einblasdämmung";

const PHOTO_FRAME_HEIGHT: f64 = 170.0;
const SIGNATURE_FRAME_HEIGHT: f64 = 70.0;

fn metadata(input: &ReportInput) -> Metadata {
    Metadata {
        title: Some(format!("{} {}", PROTOCOL_TITLE, input.order_id.trim()).trim().to_string()),
        author: Some(input.installer_name.clone()).filter(|a| !a.trim().is_empty()),
        subject: Some(input.address.single_line()).filter(|s| !s.is_empty()),
        creator: Some("bogen".to_string()),
        lang: Some("de-DE".to_string()),
    }
}

/// Cards, tables and image blocks flowed onto A4 pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlowedProtocolRenderer;

impl FlowedProtocolRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn project_card(input: &ReportInput) -> Card {
        Card::double(
            "Projekt",
            vec![
                CardRow::new("Auftragsnummer", input.order_id.as_str()),
                CardRow::new("Projektnummer", input.project_number.as_str()),
                CardRow::new("Prüfdatum", input.inspection_date.as_str()),
            ],
            vec![
                CardRow::new("Kunde", input.customer_name.as_str()),
                CardRow::new("Verarbeiter", input.installer_name.as_str()),
                CardRow::new("Adresse", input.address.single_line()),
            ],
        )
    }

    pub fn open_table(input: &ReportInput) -> Table {
        Table {
            title: "Offene Bauteile".to_string(),
            columns: vec![
                Column::left("Bauteil", 28.0),
                Column::right("Fläche (m²)", 12.0),
                Column::right("Dicke (mm)", 12.0),
                Column::right("Rohdichte (kg/m³)", 14.0),
                Column::right("Säcke", 10.0),
                Column::right("Lambda (W/mK)", 12.0),
            ],
            rows: input
                .open_stages()
                .map(|s| s.cells().iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    pub fn closed_table(input: &ReportInput) -> Table {
        Table {
            title: "Geschlossene Bauteile".to_string(),
            columns: vec![
                Column::left("Bauteil", 24.0),
                Column::right("Fläche (m²)", 11.0),
                Column::right("Dicke (mm)", 11.0),
                Column::right("Volumen (m³)", 12.0),
                Column::right("Rohdichte (kg/m³)", 13.0),
                Column::right("Säcke", 9.0),
                Column::right("Lambda (W/mK)", 12.0),
            ],
            rows: input
                .closed_stages()
                .map(|s| s.cells().iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    pub fn checks_card(input: &ReportInput) -> Card {
        let rows = CheckKey::ALL
            .iter()
            .map(|key| {
                let value = match input.checks.get(key) {
                    Some(item) => match item.comment() {
                        Some(comment) => format!("{} · {}", item.status_label(), comment),
                        None => item.status_label().to_string(),
                    },
                    None => String::new(),
                };
                CardRow::new(key.label(), value)
            })
            .collect();
        Card::single("Prüfpunkte", rows)
    }

    fn layout(&self, input: &ReportInput) -> PageFlow {
        let chrome = Chrome {
            title: PROTOCOL_TITLE.to_string(),
            subtitle: [input.customer_name.trim(), input.order_id.trim()]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join("  |  "),
            footer: input.installer_name.trim().to_string(),
        };
        let mut flow = PageFlow::new(PageGeometry::a4(), chrome);
        let text = *flow.text();
        let cards = CardRenderer::new(&text);
        let tables = TableRenderer::new(&text);
        let images = ImageBlockRenderer::new(&text);

        cards.render(&mut flow, &Self::project_card(input));
        cards.render(
            &mut flow,
            &Card::single("Material", vec![CardRow::new("Dämmstoff", input.material.as_str())]),
        );
        tables.render(&mut flow, &Self::open_table(input));
        tables.render(&mut flow, &Self::closed_table(input));
        cards.render(&mut flow, &Self::checks_card(input));

        if let Some(remarks) = input.remarks.as_deref().filter(|r| !r.trim().is_empty()) {
            cards.render(
                &mut flow,
                &Card::single("Bemerkungen", vec![CardRow::new("Bemerkung", remarks)]),
            );
        }

        let photos = ImageBlock::new(
            "Fotodokumentation",
            vec![
                ImageSlot::new("Vorher", input.photo_before.load_or_skip("before photo")),
                ImageSlot::new("Nachher", input.photo_after.load_or_skip("after photo")),
            ],
            PHOTO_FRAME_HEIGHT,
        );
        images.render(&mut flow, &photos);

        let caption = format::signed_at(input.signed_at.as_deref(), input.signed_timezone.as_deref())
            .map(|at| format!("Kunde, {}", at))
            .unwrap_or_else(|| "Kunde".to_string());
        let signature = ImageBlock::new(
            "Unterschrift",
            vec![ImageSlot::new(caption, input.signature.load_or_skip("signature"))],
            SIGNATURE_FRAME_HEIGHT,
        );
        images.render(&mut flow, &signature);

        flow
    }
}

impl DocumentRenderer<ReportInput> for FlowedProtocolRenderer {
    fn name(&self) -> &'static str {
        "flowed protocol"
    }

    fn render(&self, input: &ReportInput) -> Result<Vec<u8>, RenderError> {
        let pages = self.layout(input).into_pages();
        log::debug!("flowed protocol laid out on {} page(s)", pages.len());
        PdfWriter::new().write(&pages, &metadata(input))
    }
}

/// Values stamped onto the pre-printed protocol form.
pub struct OverlayProtocolRenderer {
    source: Box<dyn TemplateSource + Send>,
    layout: OverlayLayout,
    calibration: Calibration,
    debug: Option<bool>,
}

impl OverlayProtocolRenderer {
    pub fn new(source: Box<dyn TemplateSource + Send>, calibration: Calibration) -> Self {
        Self {
            source,
            layout: OverlayLayout::protocol(),
            calibration,
            debug: None,
        }
    }

    /// Overrides the calibration document's `debug` flag.
    pub fn with_debug(mut self, debug: Option<bool>) -> Self {
        self.debug = debug;
        self
    }
}

impl DocumentRenderer<ReportInput> for OverlayProtocolRenderer {
    fn name(&self) -> &'static str {
        "overlay protocol"
    }

    fn render(&self, input: &ReportInput) -> Result<Vec<u8>, RenderError> {
        log::debug!("loading protocol template from {}", self.source.describe());
        let bytes = self.source.load()?;
        let template = TemplateDocument::parse(&bytes)?;
        let (width, height) = template.page_size();

        let mut mapper = OverlayMapper::new(
            &self.layout,
            &self.calibration,
            width,
            height,
            template.page_count(),
        );
        if let Some(debug) = self.debug {
            mapper = mapper.with_debug(debug);
        }
        mapper.map_report(input);
        log::debug!("overlay mapped {} placement(s)", mapper.placements().len());

        let overlay = PdfWriter::new().write(&mapper.into_pages(), &metadata(input))?;
        template.stamp(&overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CheckItem, OpenStage, StageRow};
    use crate::overlay::template::tests::template_pdf;
    use crate::overlay::InMemoryTemplate;

    fn report() -> ReportInput {
        let mut input = ReportInput {
            order_id: "A-2024-0815".to_string(),
            customer_name: "Familie Musterfrau".to_string(),
            installer_name: "Dämmtechnik Nord".to_string(),
            material: "Zellulose".to_string(),
            ..Default::default()
        };
        input.stages.push(StageRow::Open(OpenStage {
            component: "Dach".to_string(),
            area: "42,5".to_string(),
            ..Default::default()
        }));
        input.checks.insert(
            CheckKey::SiteCleaned,
            CheckItem {
                passed: false,
                comment: Some("Reste im Keller".to_string()),
            },
        );
        input
    }

    #[test]
    fn flowed_protocol_contains_sections() {
        let pages = FlowedProtocolRenderer::new().layout(&report()).into_pages();
        let texts: Vec<String> = pages.iter().flat_map(|p| p.texts().map(str::to_string)).collect();
        for needle in [
            PROTOCOL_TITLE,
            "Projekt",
            "Offene Bauteile",
            "Geschlossene Bauteile",
            "Prüfpunkte",
            "Fotodokumentation",
            "Unterschrift",
        ] {
            assert!(texts.iter().any(|t| t == needle), "missing {}", needle);
        }
        assert!(texts.iter().any(|t| t == "nicht i. O. · Reste im Keller"));
        assert!(!texts.iter().any(|t| t == "Bemerkungen"));
    }

    #[test]
    fn flowed_protocol_spills_onto_second_page() {
        let pages = FlowedProtocolRenderer::new().layout(&report()).into_pages();
        assert!(pages.len() >= 2);
    }

    #[test]
    fn missing_checks_show_dash() {
        let card = FlowedProtocolRenderer::checks_card(&ReportInput::default());
        match card.body {
            crate::layout::card::CardBody::Single(rows) => {
                assert_eq!(rows.len(), CheckKey::ALL.len());
                assert!(rows.iter().all(|r| r.display_value() == "-"));
            }
            _ => panic!("checks card is single column"),
        }
    }

    #[test]
    fn overlay_renders_onto_template() {
        let renderer = OverlayProtocolRenderer::new(
            Box::new(InMemoryTemplate(template_pdf(2, "Formular"))),
            Calibration::default(),
        );
        let bytes = renderer.render(&report()).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn overlay_surfaces_template_errors() {
        let renderer = OverlayProtocolRenderer::new(
            Box::new(InMemoryTemplate(b"%PDF-1.7 broken".to_vec())),
            Calibration::default(),
        );
        assert!(matches!(renderer.render(&report()), Err(RenderError::Template(_))));
    }
}
