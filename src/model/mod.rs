//! # Document Input Model
//!
//! The payloads the engine renders, deserialized from camelCase JSON. Input
//! is validated upstream, so nearly every field defaults: a missing value
//! renders as a dash rather than failing the document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::image_loader::ImageAsset;

/// Site-inspection protocol for a blown-in insulation job.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportInput {
    pub order_id: String,
    pub project_number: String,
    pub customer_name: String,
    pub installer_name: String,
    pub address: Address,
    pub material: String,
    pub inspection_date: String,
    pub stages: Vec<StageRow>,
    pub checks: BTreeMap<CheckKey, CheckItem>,
    pub photo_before: ImageAsset,
    pub photo_after: ImageAsset,
    pub signature: ImageAsset,
    /// RFC 3339 timestamp of the customer signature.
    pub signed_at: Option<String>,
    /// Display label for the signer's timezone, e.g. `Europe/Berlin`.
    pub signed_timezone: Option<String>,
    pub remarks: Option<String>,
}

impl ReportInput {
    pub fn open_stages(&self) -> impl Iterator<Item = &OpenStage> {
        self.stages.iter().filter_map(|s| match s {
            StageRow::Open(o) => Some(o),
            StageRow::Closed(_) => None,
        })
    }

    pub fn closed_stages(&self) -> impl Iterator<Item = &ClosedStage> {
        self.stages.iter().filter_map(|s| match s {
            StageRow::Closed(c) => Some(c),
            StageRow::Open(_) => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

impl Address {
    /// `21335 Lüneburg`
    pub fn city_line(&self) -> String {
        join_nonempty(&[&self.postal_code, &self.city], " ")
    }

    /// `Am Lindenhof 12, 21335 Lüneburg`
    pub fn single_line(&self) -> String {
        join_nonempty(&[&self.street, &self.city_line()], ", ")
    }
}

fn join_nonempty(parts: &[&str], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// One measured section of the job. Open cavities are filled before the
/// cladding goes on; closed cavities are blown through drilled openings and
/// additionally record the cavity volume.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cavity", rename_all = "camelCase")]
pub enum StageRow {
    Open(OpenStage),
    Closed(ClosedStage),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenStage {
    pub component: String,
    pub area: String,
    pub thickness: String,
    pub density: String,
    pub bags: String,
    pub lambda: String,
}

impl OpenStage {
    /// Cells in table column order.
    pub fn cells(&self) -> [&str; 6] {
        [
            &self.component,
            &self.area,
            &self.thickness,
            &self.density,
            &self.bags,
            &self.lambda,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClosedStage {
    pub component: String,
    pub area: String,
    pub thickness: String,
    pub volume: String,
    pub density: String,
    pub bags: String,
    pub lambda: String,
}

impl ClosedStage {
    /// Cells in table column order.
    pub fn cells(&self) -> [&str; 7] {
        [
            &self.component,
            &self.area,
            &self.thickness,
            &self.volume,
            &self.density,
            &self.bags,
            &self.lambda,
        ]
    }
}

/// The fixed set of inspection checks on the protocol form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckKey {
    CavityFilled,
    DensityVerified,
    OpeningsSealed,
    VaporBarrierIntact,
    SiteCleaned,
    CustomerBriefed,
}

impl CheckKey {
    /// Form order.
    pub const ALL: [CheckKey; 6] = [
        CheckKey::CavityFilled,
        CheckKey::DensityVerified,
        CheckKey::OpeningsSealed,
        CheckKey::VaporBarrierIntact,
        CheckKey::SiteCleaned,
        CheckKey::CustomerBriefed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CheckKey::CavityFilled => "Hohlraum vollständig verfüllt",
            CheckKey::DensityVerified => "Rohdichte geprüft",
            CheckKey::OpeningsSealed => "Einblasöffnungen verschlossen",
            CheckKey::VaporBarrierIntact => "Dampfbremse unbeschädigt",
            CheckKey::SiteCleaned => "Baustelle gereinigt",
            CheckKey::CustomerBriefed => "Kunde eingewiesen",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckItem {
    pub passed: bool,
    pub comment: Option<String>,
}

impl CheckItem {
    pub fn status_label(&self) -> &'static str {
        if self.passed {
            "i. O."
        } else {
            "nicht i. O."
        }
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

/// Price quotation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteInput {
    pub quote_number: String,
    pub project_number: String,
    pub customer_name: String,
    pub contact_person: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub address: Address,
    pub items: Vec<LineItem>,
    #[serde(default = "default_vat_percent")]
    pub vat_percent: f64,
    pub valid_until: String,
    pub notes: Option<String>,
    pub subtotal: Option<f64>,
    pub vat: Option<f64>,
    pub total: Option<f64>,
}

fn default_vat_percent() -> f64 {
    19.0
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub discount_percent: Option<f64>,
    pub pricing: Pricing,
}

impl LineItem {
    /// `quantity × unit price × (1 − discount / 100)`
    pub fn net(&self) -> f64 {
        let discount = self.discount_percent.unwrap_or(0.0).clamp(0.0, 100.0);
        self.quantity * self.unit_price * (1.0 - discount / 100.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Pricing {
    #[default]
    PerUnit,
    /// Priced per cubic meter of blown material.
    PerVolume,
}

impl Pricing {
    pub fn unit_label(&self) -> &'static str {
        match self {
            Pricing::PerUnit => "Stk.",
            Pricing::PerVolume => "m³",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteTotals {
    pub subtotal: f64,
    pub vat: f64,
    pub total: f64,
}

impl QuoteTotals {
    /// Totals from the line items. Each value supplied in the input wins
    /// over its derived counterpart.
    pub fn derive(input: &QuoteInput) -> Self {
        let subtotal = input
            .subtotal
            .unwrap_or_else(|| input.items.iter().map(LineItem::net).sum());
        let vat = input.vat.unwrap_or(subtotal * input.vat_percent / 100.0);
        let total = input.total.unwrap_or(subtotal + vat);
        Self {
            subtotal,
            vat,
            total,
        }
    }
}

/// Document metadata embedded in the PDF info dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    /// BCP 47 tag emitted as /Lang in the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_parses_tagged_stages_and_checks() {
        let json = r#"{
            "orderId": "A-17",
            "customerName": "Familie Meier",
            "address": {"street": "Hauptstr. 1", "postalCode": "12345", "city": "Celle"},
            "stages": [
                {"cavity": "open", "component": "Dach", "area": "40", "thickness": "200",
                 "density": "45", "bags": "30", "lambda": "0,040"},
                {"cavity": "closed", "component": "Wand", "area": "12", "thickness": "80",
                 "volume": "0,96", "density": "60", "bags": "5", "lambda": "0,039"}
            ],
            "checks": {"cavityFilled": {"passed": true}, "siteCleaned": {"passed": false, "comment": " Reste "}}
        }"#;
        let r: ReportInput = serde_json::from_str(json).unwrap();
        assert_eq!(r.order_id, "A-17");
        assert_eq!(r.open_stages().count(), 1);
        let closed: Vec<_> = r.closed_stages().collect();
        assert_eq!(closed[0].cells()[3], "0,96");
        assert_eq!(r.checks[&CheckKey::SiteCleaned].comment(), Some("Reste"));
        assert!(r.checks[&CheckKey::CavityFilled].passed);
        assert!(r.signature.is_none());
        assert_eq!(r.address.single_line(), "Hauptstr. 1, 12345 Celle");
    }

    #[test]
    fn unknown_cavity_is_a_data_error() {
        let err = serde_json::from_str::<ReportInput>(r#"{"stages": [{"cavity": "half"}]}"#)
            .unwrap_err();
        assert_eq!(err.classify(), serde_json::error::Category::Data);
    }

    #[test]
    fn address_lines_skip_blanks() {
        let a = Address {
            street: String::new(),
            postal_code: "21335".into(),
            city: " Lüneburg ".into(),
        };
        assert_eq!(a.city_line(), "21335 Lüneburg");
        assert_eq!(a.single_line(), "21335 Lüneburg");
        assert_eq!(Address::default().single_line(), "");
    }

    #[test]
    fn totals_are_derived() {
        let q: QuoteInput = serde_json::from_str(
            r#"{"items": [
                {"description": "Einblasen", "quantity": 10, "unitPrice": 50, "discountPercent": 10},
                {"description": "Anfahrt", "quantity": 1, "unitPrice": 80}
            ]}"#,
        )
        .unwrap();
        assert_eq!(q.vat_percent, 19.0);
        let t = QuoteTotals::derive(&q);
        assert!((t.subtotal - 530.0).abs() < 1e-9);
        assert!((t.vat - 100.7).abs() < 1e-9);
        assert!((t.total - 630.7).abs() < 1e-9);
    }

    #[test]
    fn supplied_totals_win() {
        let q: QuoteInput = serde_json::from_str(
            r#"{"vatPercent": 7, "subtotal": 100, "total": 200,
                "items": [{"quantity": 3, "unitPrice": 9, "pricing": "perVolume"}]}"#,
        )
        .unwrap();
        assert_eq!(q.items[0].pricing, Pricing::PerVolume);
        let t = QuoteTotals::derive(&q);
        assert_eq!(t.subtotal, 100.0);
        assert!((t.vat - 7.0).abs() < 1e-9);
        assert_eq!(t.total, 200.0);
    }

    #[test]
    fn check_keys_roundtrip_names() {
        for key in CheckKey::ALL {
            let name = serde_json::to_string(&key).unwrap();
            let back: CheckKey = serde_json::from_str(&name).unwrap();
            assert_eq!(back, key);
            assert!(!key.label().is_empty());
        }
        assert_eq!(serde_json::to_string(&CheckKey::VaporBarrierIntact).unwrap(), "\"vaporBarrierIntact\"");
    }
}
