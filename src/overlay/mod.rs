//! # Template Overlay
//!
//! Instead of flowing content, overlay mode draws computed values at fixed
//! millimeter positions on top of a pre-printed form. The form supplies all
//! borders, labels and backgrounds; the overlay supplies only the values.
//!
//! Positions are a nominal [`OverlayLayout`] plus a per-deployment
//! [`Calibration`], so a form printed slightly differently can be matched
//! without code changes. Debug mode marks every draw position with a
//! crosshair and the field's key.

pub mod layout;
pub mod mapper;
pub mod template;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::model::CheckKey;
use crate::units::MmPoint;

pub use layout::{CheckColumns, FieldPosition, ImageBox, OverlayColumn, OverlayLayout, OverlayTable};
pub use mapper::{OverlayMapper, Placement};
pub use template::{InMemoryTemplate, LocalOrRemoteTemplate, TemplateDocument, TemplateSource};

/// Every position the overlay draws at. The serde names are the keys of the
/// calibration document and the labels drawn in debug mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    OrderId,
    ProjectNumber,
    InspectionDate,
    CustomerName,
    InstallerName,
    Street,
    PostalCity,
    Material,
    Remarks,
    CheckCavityFilled,
    CheckDensityVerified,
    CheckOpeningsSealed,
    CheckVaporBarrierIntact,
    CheckSiteCleaned,
    CheckCustomerBriefed,
    OpenComponent,
    OpenArea,
    OpenThickness,
    OpenDensity,
    OpenBags,
    OpenLambda,
    ClosedComponent,
    ClosedArea,
    ClosedThickness,
    ClosedVolume,
    ClosedDensity,
    ClosedBags,
    ClosedLambda,
    Signature,
    SignedAt,
    PhotoBefore,
    PhotoAfter,
}

impl FieldKey {
    pub const ALL: [FieldKey; 32] = [
        FieldKey::OrderId,
        FieldKey::ProjectNumber,
        FieldKey::InspectionDate,
        FieldKey::CustomerName,
        FieldKey::InstallerName,
        FieldKey::Street,
        FieldKey::PostalCity,
        FieldKey::Material,
        FieldKey::Remarks,
        FieldKey::CheckCavityFilled,
        FieldKey::CheckDensityVerified,
        FieldKey::CheckOpeningsSealed,
        FieldKey::CheckVaporBarrierIntact,
        FieldKey::CheckSiteCleaned,
        FieldKey::CheckCustomerBriefed,
        FieldKey::OpenComponent,
        FieldKey::OpenArea,
        FieldKey::OpenThickness,
        FieldKey::OpenDensity,
        FieldKey::OpenBags,
        FieldKey::OpenLambda,
        FieldKey::ClosedComponent,
        FieldKey::ClosedArea,
        FieldKey::ClosedThickness,
        FieldKey::ClosedVolume,
        FieldKey::ClosedDensity,
        FieldKey::ClosedBags,
        FieldKey::ClosedLambda,
        FieldKey::Signature,
        FieldKey::SignedAt,
        FieldKey::PhotoBefore,
        FieldKey::PhotoAfter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::OrderId => "orderId",
            FieldKey::ProjectNumber => "projectNumber",
            FieldKey::InspectionDate => "inspectionDate",
            FieldKey::CustomerName => "customerName",
            FieldKey::InstallerName => "installerName",
            FieldKey::Street => "street",
            FieldKey::PostalCity => "postalCity",
            FieldKey::Material => "material",
            FieldKey::Remarks => "remarks",
            FieldKey::CheckCavityFilled => "checkCavityFilled",
            FieldKey::CheckDensityVerified => "checkDensityVerified",
            FieldKey::CheckOpeningsSealed => "checkOpeningsSealed",
            FieldKey::CheckVaporBarrierIntact => "checkVaporBarrierIntact",
            FieldKey::CheckSiteCleaned => "checkSiteCleaned",
            FieldKey::CheckCustomerBriefed => "checkCustomerBriefed",
            FieldKey::OpenComponent => "openComponent",
            FieldKey::OpenArea => "openArea",
            FieldKey::OpenThickness => "openThickness",
            FieldKey::OpenDensity => "openDensity",
            FieldKey::OpenBags => "openBags",
            FieldKey::OpenLambda => "openLambda",
            FieldKey::ClosedComponent => "closedComponent",
            FieldKey::ClosedArea => "closedArea",
            FieldKey::ClosedThickness => "closedThickness",
            FieldKey::ClosedVolume => "closedVolume",
            FieldKey::ClosedDensity => "closedDensity",
            FieldKey::ClosedBags => "closedBags",
            FieldKey::ClosedLambda => "closedLambda",
            FieldKey::Signature => "signature",
            FieldKey::SignedAt => "signedAt",
            FieldKey::PhotoBefore => "photoBefore",
            FieldKey::PhotoAfter => "photoAfter",
        }
    }

    /// The key a check's marks and comment are calibrated by.
    pub fn for_check(check: CheckKey) -> FieldKey {
        match check {
            CheckKey::CavityFilled => FieldKey::CheckCavityFilled,
            CheckKey::DensityVerified => FieldKey::CheckDensityVerified,
            CheckKey::OpeningsSealed => FieldKey::CheckOpeningsSealed,
            CheckKey::VaporBarrierIntact => FieldKey::CheckVaporBarrierIntact,
            CheckKey::SiteCleaned => FieldKey::CheckSiteCleaned,
            CheckKey::CustomerBriefed => FieldKey::CheckCustomerBriefed,
        }
    }
}

/// A nudge for one field in millimeters. Positive `dy_mm` moves down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalibrationOffset {
    pub dx_mm: f64,
    pub dy_mm: f64,
}

/// Per-deployment fine-tuning of overlay positions.
///
/// ```json
/// { "debug": false, "offsets": { "customerName": { "dxMm": 2, "dyMm": -1 } } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Calibration {
    pub debug: bool,
    pub offsets: BTreeMap<FieldKey, CalibrationOffset>,
}

impl Calibration {
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        serde_json::from_str(json)
            .map_err(|e| RenderError::Config(format!("invalid calibration document: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            RenderError::Config(format!("cannot read calibration {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn with_offset(mut self, key: FieldKey, dx_mm: f64, dy_mm: f64) -> Self {
        self.offsets.insert(key, CalibrationOffset { dx_mm, dy_mm });
        self
    }

    pub fn offset(&self, key: FieldKey) -> CalibrationOffset {
        self.offsets.get(&key).copied().unwrap_or_default()
    }

    /// Nominal position plus the key's offset.
    pub fn resolve(&self, key: FieldKey, nominal: MmPoint) -> MmPoint {
        let o = self.offset(key);
        nominal.offset(o.dx_mm, o.dy_mm)
    }
}
