//! Price quotation, always flowed.

use crate::error::RenderError;
use crate::format;
use crate::layout::card::{Card, CardRenderer, CardRow};
use crate::layout::flow::{Chrome, PageFlow, PageGeometry};
use crate::layout::table::{Column, Table, TableRenderer};
use crate::model::{LineItem, Metadata, QuoteInput, QuoteTotals};
use crate::pdf::PdfWriter;

use super::DocumentRenderer;

pub const QUOTE_TITLE: &str = "Angebot";

#[derive(Debug, Default, Clone, Copy)]
pub struct FlowedQuoteRenderer;

impl FlowedQuoteRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn customer_card(input: &QuoteInput) -> Card {
        Card::double(
            "Kunde",
            vec![
                CardRow::new("Kunde", input.customer_name.as_str()),
                CardRow::new("Ansprechpartner", input.contact_person.as_str()),
                CardRow::new("Adresse", input.address.single_line()),
            ],
            vec![
                CardRow::new("Angebotsnummer", input.quote_number.as_str()),
                CardRow::new("Projektnummer", input.project_number.as_str()),
                CardRow::new("Gültig bis", input.valid_until.as_str()),
                CardRow::new(
                    "Kontakt",
                    [input.contact_email.trim(), input.contact_phone.trim()]
                        .iter()
                        .filter(|s| !s.is_empty())
                        .copied()
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
            ],
        )
    }

    pub fn items_table(input: &QuoteInput) -> Table {
        Table {
            title: "Positionen".to_string(),
            columns: vec![
                Column::right("Pos.", 5.0),
                Column::left("Beschreibung", 34.0),
                Column::right("Menge", 9.0),
                Column::left("Einheit", 7.0),
                Column::right("Einzelpreis", 13.0),
                Column::right("Rabatt", 8.0),
                Column::right("Gesamt", 14.0),
            ],
            rows: input
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| item_row(i + 1, item))
                .collect(),
        }
    }

    pub fn totals_card(input: &QuoteInput) -> Card {
        let totals = QuoteTotals::derive(input);
        Card::single(
            "Summe",
            vec![
                CardRow::new("Zwischensumme netto", format::euro(totals.subtotal)),
                CardRow::new(
                    format!("MwSt. {}", format::percent(input.vat_percent)),
                    format::euro(totals.vat),
                ),
                CardRow::new("Gesamtbetrag brutto", format::euro(totals.total)),
            ],
        )
    }

    fn layout(&self, input: &QuoteInput) -> PageFlow {
        let chrome = Chrome {
            title: QUOTE_TITLE.to_string(),
            subtitle: [input.customer_name.trim(), input.quote_number.trim()]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join("  |  "),
            footer: format!("Gültig bis {}", format::or_dash(&input.valid_until)),
        };
        let mut flow = PageFlow::new(PageGeometry::a4(), chrome);
        let text = *flow.text();
        let cards = CardRenderer::new(&text);
        let tables = TableRenderer::new(&text);

        cards.render(&mut flow, &Self::customer_card(input));
        let items = Self::items_table(input);
        let per_page = tables.rows_per_page(&items, flow.geometry());
        let mut rest = &items.rows[..];
        let mut first = true;
        while first || !rest.is_empty() {
            let fitting = tables.rows_fitting(&items, flow.geometry(), flow.cursor().remaining());
            let take = if fitting == 0 { per_page } else { fitting }.min(rest.len());
            let (rows, tail) = rest.split_at(take);
            let title = if first {
                items.title.clone()
            } else {
                format!("{} (Fortsetzung)", items.title)
            };
            let block = Table {
                title,
                columns: items.columns.clone(),
                rows: rows.to_vec(),
            };
            tables.render(&mut flow, &block);
            rest = tail;
            first = false;
        }
        cards.render(&mut flow, &Self::totals_card(input));
        if let Some(notes) = input.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            cards.render(&mut flow, &Card::single("Hinweise", vec![CardRow::new("Hinweis", notes)]));
        }
        flow
    }
}

fn item_row(position: usize, item: &LineItem) -> Vec<String> {
    let discount = item
        .discount_percent
        .filter(|d| *d > 0.0)
        .map(format::percent)
        .unwrap_or_default();
    vec![
        position.to_string(),
        item.description.clone(),
        format::decimal(item.quantity, 2),
        item.pricing.unit_label().to_string(),
        format::euro(item.unit_price),
        discount,
        format::euro(item.net()),
    ]
}

impl DocumentRenderer<QuoteInput> for FlowedQuoteRenderer {
    fn name(&self) -> &'static str {
        "flowed quote"
    }

    fn render(&self, input: &QuoteInput) -> Result<Vec<u8>, RenderError> {
        let pages = self.layout(input).into_pages();
        log::debug!("quote laid out on {} page(s)", pages.len());
        let metadata = Metadata {
            title: Some(format!("{} {}", QUOTE_TITLE, input.quote_number.trim()).trim().to_string()),
            author: None,
            subject: Some(input.customer_name.clone()).filter(|c| !c.trim().is_empty()),
            creator: Some("bogen".to_string()),
            lang: Some("de-DE".to_string()),
        };
        PdfWriter::new().write(&pages, &metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pricing;

    fn quote(items: usize) -> QuoteInput {
        QuoteInput {
            quote_number: "Q-2024-031".to_string(),
            customer_name: "Wohnbau Elbe eG".to_string(),
            vat_percent: 19.0,
            items: (0..items)
                .map(|i| LineItem {
                    description: format!("Einblasdämmung Abschnitt {}", i + 1),
                    quantity: 12.5,
                    unit_price: 48.0,
                    discount_percent: if i == 0 { Some(10.0) } else { None },
                    pricing: Pricing::PerVolume,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn item_rows_format_german_amounts() {
        let table = FlowedQuoteRenderer::items_table(&quote(2));
        assert_eq!(
            table.rows[0],
            vec!["1", "Einblasdämmung Abschnitt 1", "12,5", "m³", "48,00 €", "10 %", "540,00 €"]
        );
        assert_eq!(table.rows[1][5], "");
        assert_eq!(table.rows[1][6], "600,00 €");
    }

    #[test]
    fn totals_card_uses_derived_totals() {
        let card = FlowedQuoteRenderer::totals_card(&quote(2));
        let rows = match card.body {
            crate::layout::card::CardBody::Single(rows) => rows,
            _ => panic!("totals card is single column"),
        };
        assert_eq!(rows[0].value, "1.140,00 €");
        assert_eq!(rows[1].label, "MwSt. 19 %");
        assert_eq!(rows[1].value, "216,60 €");
        assert_eq!(rows[2].value, "1.356,60 €");
    }

    #[test]
    fn long_quote_splits_items_without_overflow() {
        use crate::layout::flow::BOTTOM_SAFE;
        use crate::layout::DrawCommand;

        let pages = FlowedQuoteRenderer::new().layout(&quote(60)).into_pages();
        assert!(pages.len() >= 2);
        let continued = pages
            .iter()
            .flat_map(|p| p.texts())
            .filter(|t| *t == "Positionen (Fortsetzung)")
            .count();
        assert!(continued >= 1);
        for page in &pages {
            for cmd in &page.commands {
                if let DrawCommand::Rect { y, stroke: Some(_), .. } = cmd {
                    assert!(*y >= BOTTOM_SAFE - 1e-6, "block reaches below the safe margin");
                }
            }
        }

        let small = FlowedQuoteRenderer::new().layout(&quote(3)).into_pages();
        assert_eq!(small.len(), 1);
    }

    #[test]
    fn items_start_below_the_customer_card() {
        let pages = FlowedQuoteRenderer::new().layout(&quote(32)).into_pages();
        assert!(pages[0].texts().any(|t| t == "Positionen"));
        assert!(pages[0].texts().any(|t| t == "Einblasdämmung Abschnitt 1"));
        let continued = pages.iter().skip(1).flat_map(|p| p.texts()).any(|t| t == "Positionen (Fortsetzung)");
        assert!(continued);
        let listed = pages
            .iter()
            .flat_map(|p| p.texts())
            .filter(|t| t.starts_with("Einblasdämmung Abschnitt "))
            .count();
        assert_eq!(listed, 32);
    }

    #[test]
    fn empty_item_list_renders_one_table() {
        let pages = FlowedQuoteRenderer::new().layout(&quote(0)).into_pages();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].texts().filter(|t| *t == "Positionen").count(), 1);
    }

    #[test]
    fn render_produces_pdf() {
        let bytes = FlowedQuoteRenderer::new().render(&quote(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
