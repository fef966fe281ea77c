//! Core data models for the inventory catalog.
//!
//! These types describe a vehicle as it flows from a raw source row to a
//! snapshot entry. They carry no I/O.
//!
//! # Lifecycle
//!
//! ```text
//! RawRow ──from_row──▶ VehicleRecord ──project──▶ LiteVehicle
//!                          │
//!                          └── Canonical (derived, read-only)
//! ```
//!
//! Canonical values are computed once, inside [`VehicleRecord::from_row`],
//! from the raw columns. They have no setters: the only way to change a
//! canonical value is to rebuild the record from its row.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::error::Diagnostic;
use crate::normalize::{normalize, NormalizeContext};

/// One source row: column name to textual value. NULL columns are absent.
pub type RawRow = BTreeMap<String, String>;

/// A filterable attribute axis.
///
/// Every dimension has a stable wire name (`as_str`) used in query
/// parameters, facet maps, and snapshot files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Model,
    Year,
    Trim,
    Series,
    Package,
    Engine,
    Drivetrain,
    BodyStyle,
    Color,
    Interior,
    Equipment,
    Status,
    Fuel,
    Transmission,
}

impl Dimension {
    pub const ALL: [Dimension; 14] = [
        Dimension::Model,
        Dimension::Year,
        Dimension::Trim,
        Dimension::Series,
        Dimension::Package,
        Dimension::Engine,
        Dimension::Drivetrain,
        Dimension::BodyStyle,
        Dimension::Color,
        Dimension::Interior,
        Dimension::Equipment,
        Dimension::Status,
        Dimension::Fuel,
        Dimension::Transmission,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Model => "model",
            Dimension::Year => "year",
            Dimension::Trim => "trim",
            Dimension::Series => "series",
            Dimension::Package => "package",
            Dimension::Engine => "engine",
            Dimension::Drivetrain => "drivetrain",
            Dimension::BodyStyle => "body_style",
            Dimension::Color => "color",
            Dimension::Interior => "interior",
            Dimension::Equipment => "equipment",
            Dimension::Status => "status",
            Dimension::Fuel => "fuel",
            Dimension::Transmission => "transmission",
        }
    }

    /// Bit used in per-record failure masks.
    pub(crate) fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown dimension: '{}'", s))
    }
}

/// Model families with a configured catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    F150,
    SuperDuty,
    Explorer,
    Maverick,
    MustangMachE,
    Bronco,
    BroncoSport,
    Mustang,
    Expedition,
    Ranger,
    Escape,
    F150Lightning,
    Transit,
}

/// Truck platform class, used to disambiguate shared vendor codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    LightTruck,
    HeavyTruck,
    Other,
}

impl Family {
    /// Homepage order.
    pub const ALL: [Family; 13] = [
        Family::F150,
        Family::SuperDuty,
        Family::Explorer,
        Family::Maverick,
        Family::MustangMachE,
        Family::Bronco,
        Family::BroncoSport,
        Family::Mustang,
        Family::Expedition,
        Family::Ranger,
        Family::Escape,
        Family::F150Lightning,
        Family::Transit,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Family::F150 => "f150",
            Family::SuperDuty => "super-duty",
            Family::Explorer => "explorer",
            Family::Maverick => "maverick",
            Family::MustangMachE => "mustang-mach-e",
            Family::Bronco => "bronco",
            Family::BroncoSport => "bronco-sport",
            Family::Mustang => "mustang",
            Family::Expedition => "expedition",
            Family::Ranger => "ranger",
            Family::Escape => "escape",
            Family::F150Lightning => "f150-lightning",
            Family::Transit => "transit",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Family::F150 => "F-150",
            Family::SuperDuty => "Super Duty",
            Family::Explorer => "Explorer",
            Family::Maverick => "Maverick",
            Family::MustangMachE => "Mustang Mach-E",
            Family::Bronco => "Bronco",
            Family::BroncoSport => "Bronco Sport",
            Family::Mustang => "Mustang",
            Family::Expedition => "Expedition",
            Family::Ranger => "Ranger",
            Family::Escape => "Escape",
            Family::F150Lightning => "F-150 Lightning",
            Family::Transit => "Transit",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Family> {
        Family::ALL.iter().copied().find(|f| f.slug() == slug)
    }

    pub fn platform(self) -> Platform {
        match self {
            Family::F150 | Family::F150Lightning | Family::Ranger | Family::Maverick => {
                Platform::LightTruck
            }
            Family::SuperDuty => Platform::HeavyTruck,
            _ => Platform::Other,
        }
    }
}

/// One optional or standard equipment line from a window sticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msrp: Option<f64>,
}

/// Accepted shapes for an embedded equipment entry.
#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddedEquipment {
    Text(String),
    Item {
        #[serde(alias = "name")]
        description: String,
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        msrp: Option<serde_json::Value>,
    },
}

/// Parse an embedded equipment list (JSON array of strings or objects).
pub fn parse_equipment(text: &str) -> Result<Vec<EquipmentItem>, serde_json::Error> {
    let entries: Vec<EmbeddedEquipment> = serde_json::from_str(text)?;
    Ok(entries
        .into_iter()
        .map(|e| match e {
            EmbeddedEquipment::Text(description) => EquipmentItem {
                description,
                code: None,
                msrp: None,
            },
            EmbeddedEquipment::Item {
                description,
                code,
                msrp,
            } => EquipmentItem {
                description,
                code: code.filter(|c| !c.trim().is_empty()),
                msrp: msrp.as_ref().and_then(money_from_json),
            },
        })
        .filter(|item| !item.description.trim().is_empty())
        .collect())
}

/// Parse a money string such as `"$52,345"` or `"-1,000.00"`.
///
/// Non-numeric decoration is ignored. Returns `None` when no digits remain.
pub fn parse_money(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

fn money_from_json(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => parse_money(s),
        _ => None,
    }
}

/// Price breakdown. All parts are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msrp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealer_discount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_rebate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retail_price: Option<f64>,
}

#[derive(Deserialize)]
struct EmbeddedPricing {
    #[serde(default)]
    msrp: Option<serde_json::Value>,
    #[serde(default, alias = "discount")]
    dealer_discount: Option<serde_json::Value>,
    #[serde(default, alias = "rebate")]
    factory_rebate: Option<serde_json::Value>,
    #[serde(default, alias = "retail")]
    retail_price: Option<serde_json::Value>,
}

impl Pricing {
    /// Build a breakdown, deriving retail from MSRP and adjustments when no
    /// retail price was supplied.
    ///
    /// Non-positive MSRP or retail values count as absent. Discounts and
    /// rebates are treated as magnitudes regardless of their sign.
    pub fn resolve(
        msrp: Option<f64>,
        dealer_discount: Option<f64>,
        factory_rebate: Option<f64>,
        retail_price: Option<f64>,
    ) -> Self {
        let msrp = msrp.filter(|v| *v > 0.0);
        let dealer_discount = dealer_discount.map(f64::abs).filter(|v| *v > 0.0);
        let factory_rebate = factory_rebate.map(f64::abs).filter(|v| *v > 0.0);
        let retail_price = retail_price.filter(|v| *v > 0.0).or_else(|| {
            let msrp = msrp?;
            if dealer_discount.is_none() && factory_rebate.is_none() {
                return None;
            }
            let derived = msrp - dealer_discount.unwrap_or(0.0) - factory_rebate.unwrap_or(0.0);
            (derived > 0.0).then_some(derived)
        });
        Self {
            msrp,
            dealer_discount,
            factory_rebate,
            retail_price,
        }
    }

    /// Parse an embedded pricing object.
    pub fn from_embedded(text: &str) -> Result<Self, serde_json::Error> {
        let p: EmbeddedPricing = serde_json::from_str(text)?;
        Ok(Self::resolve(
            p.msrp.as_ref().and_then(money_from_json),
            p.dealer_discount.as_ref().and_then(money_from_json),
            p.factory_rebate.as_ref().and_then(money_from_json),
            p.retail_price.as_ref().and_then(money_from_json),
        ))
    }

    /// The authoritative display price: retail, falling back to MSRP.
    pub fn display_price(&self) -> Option<f64> {
        self.retail_price.or(self.msrp)
    }
}

/// Model-specific physical attributes. Only populated where the source has them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSpecs {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub wheelbase: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bed_length: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub towing_capacity: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payload_capacity: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cargo_volume: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ground_clearance: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub horsepower: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub torque: String,
}

/// Canonical attribute values derived from a record's raw columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canonical {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    family: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    series: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    trim: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    package: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    engine: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    drivetrain: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    body_style: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    color: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    interior: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    fuel: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    transmission: String,
}

pub const STATUS_IN_STOCK: &str = "in-stock";
pub const STATUS_IN_TRANSIT: &str = "in-transit";

/// One inventory item.
///
/// Identity is `vin`; `stock` is empty while the vehicle is in transit.
/// Raw fields keep the source spelling for display; [`Canonical`] holds
/// the normalized values used for filtering and facets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub vin: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stock: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vehicle_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub year: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub make: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trim: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub exterior: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interior_color: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interior_material: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub engine: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub transmission: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub drive_line: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body_style: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fuel_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rear_axle_config: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fuel_economy: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vehicle_link: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub photo: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub photo_interior: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photo_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub equipment_pkg: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_equipment: Vec<EquipmentItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub standard_equipment: Vec<EquipmentItem>,
    #[serde(flatten)]
    pub pricing: Pricing,
    #[serde(flatten)]
    pub specs: PhysicalSpecs,
    #[serde(default)]
    canonical: Canonical,
}

/// Index of the conventional primary interior photo.
const INTERIOR_PHOTO_INDEX: usize = 9;

fn column<'a>(row: &'a RawRow, key: &str) -> &'a str {
    row.get(key).map(|v| v.trim()).unwrap_or("")
}

impl VehicleRecord {
    /// Build a record from a source row, deriving every canonical value.
    ///
    /// Returns `None` when the row has no VIN. Malformed embedded JSON in
    /// `optional`, `standard`, or `pricing` degrades that field to its
    /// default and adds a diagnostic.
    pub fn from_row(row: &RawRow) -> Option<(VehicleRecord, Vec<Diagnostic>)> {
        let vin = column(row, "vin");
        if vin.is_empty() {
            return None;
        }
        let mut diagnostics = Vec::new();

        let photo_urls: Vec<String> = column(row, "photo_urls")
            .split(',')
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from)
            .collect();
        let photo = photo_urls.first().cloned().unwrap_or_default();
        let photo_interior = photo_urls
            .get(INTERIOR_PHOTO_INDEX)
            .or_else(|| photo_urls.get(1))
            .cloned()
            .unwrap_or_default();

        let body_style = match column(row, "truck_body_style") {
            "" => column(row, "body_style"),
            truck => truck,
        };

        let mut embedded_list = |field: &str| -> Vec<EquipmentItem> {
            let text = column(row, field);
            if text.is_empty() {
                return Vec::new();
            }
            parse_equipment(text).unwrap_or_else(|_| {
                diagnostics.push(Diagnostic::MalformedEmbeddedData {
                    vin: vin.to_string(),
                    field: field.to_string(),
                });
                Vec::new()
            })
        };
        let optional_equipment = embedded_list("optional");
        let standard_equipment = embedded_list("standard");

        let column_pricing = Pricing::resolve(
            parse_money(column(row, "msrp")),
            parse_money(column(row, "dealer_discount")),
            parse_money(column(row, "factory_rebate")),
            parse_money(column(row, "total_vehicle")),
        );
        let pricing = match column(row, "pricing") {
            "" => column_pricing,
            text => Pricing::from_embedded(text).unwrap_or_else(|_| {
                diagnostics.push(Diagnostic::MalformedEmbeddedData {
                    vin: vin.to_string(),
                    field: "pricing".to_string(),
                });
                column_pricing
            }),
        };

        let mut record = VehicleRecord {
            vin: vin.to_string(),
            stock: column(row, "stock").to_string(),
            vehicle_type: column(row, "vehicle_type").to_string(),
            year: column(row, "year").to_string(),
            make: column(row, "make").to_string(),
            model: column(row, "model").to_string(),
            trim: column(row, "trim").to_string(),
            exterior: column(row, "paint").to_string(),
            interior_color: column(row, "interior_color").to_string(),
            interior_material: column(row, "interior_material").to_string(),
            engine: column(row, "engine").to_string(),
            transmission: column(row, "transmission_type").to_string(),
            drive_line: column(row, "drivetrain").to_string(),
            body_style: body_style.to_string(),
            fuel_type: column(row, "fuel").to_string(),
            rear_axle_config: column(row, "rear_axle_config").to_string(),
            condition: "New".to_string(),
            fuel_economy: column(row, "mpg").to_string(),
            vehicle_link: column(row, "vehicle_link").to_string(),
            photo,
            photo_interior,
            photo_urls,
            equipment_pkg: column(row, "equipment_group").to_string(),
            optional_equipment,
            standard_equipment,
            pricing,
            specs: PhysicalSpecs {
                wheelbase: column(row, "wheelbase").to_string(),
                bed_length: column(row, "bed_length").to_string(),
                towing_capacity: column(row, "towing_capacity").to_string(),
                payload_capacity: column(row, "payload_capacity").to_string(),
                cargo_volume: column(row, "cargo_volume").to_string(),
                ground_clearance: column(row, "ground_clearance").to_string(),
                horsepower: column(row, "horsepower").to_string(),
                torque: column(row, "torque").to_string(),
            },
            canonical: Canonical::default(),
        };
        record.canonical = record.derive_canonical();
        Some((record, diagnostics))
    }

    fn derive_canonical(&self) -> Canonical {
        let family_value = normalize(Dimension::Model, &self.model, &NormalizeContext::none());
        let family = Family::from_slug(&family_value);
        let ctx = NormalizeContext { family };

        let series = match family {
            Some(f) => {
                let s = normalize(Dimension::Series, &self.model, &ctx);
                if catalog::family_config(f).series.contains(&s.as_str()) {
                    s
                } else {
                    String::new()
                }
            }
            None => String::new(),
        };
        let status = if self.stock.is_empty() {
            STATUS_IN_TRANSIT
        } else {
            STATUS_IN_STOCK
        };

        Canonical {
            family: family_value,
            series,
            trim: normalize(Dimension::Trim, &self.trim, &ctx),
            package: normalize(Dimension::Package, &self.equipment_pkg, &ctx),
            engine: normalize(Dimension::Engine, &self.engine, &ctx),
            drivetrain: normalize(Dimension::Drivetrain, &self.drive_line, &ctx),
            body_style: normalize(Dimension::BodyStyle, &self.body_style, &ctx),
            color: normalize(Dimension::Color, &self.exterior, &ctx),
            interior: normalize(Dimension::Interior, &self.interior_color, &ctx),
            status: status.to_string(),
            fuel: normalize(Dimension::Fuel, &self.fuel_type, &ctx),
            transmission: normalize(Dimension::Transmission, &self.transmission, &ctx),
        }
    }

    /// Canonical family slug (or the trimmed raw model for unknown models).
    pub fn family_slug(&self) -> &str {
        &self.canonical.family
    }

    pub fn family(&self) -> Option<Family> {
        Family::from_slug(&self.canonical.family)
    }

    pub fn context(&self) -> NormalizeContext {
        NormalizeContext {
            family: self.family(),
        }
    }

    pub fn in_transit(&self) -> bool {
        self.stock.is_empty()
    }

    pub fn has_photo(&self) -> bool {
        !self.photo.is_empty()
    }

    /// The canonical value of a single-valued dimension.
    ///
    /// `Year` has no separate canonical form and returns the raw year.
    /// `Equipment` is multi-valued and always returns `""`.
    pub fn value(&self, dim: Dimension) -> &str {
        let c = &self.canonical;
        match dim {
            Dimension::Model => &c.family,
            Dimension::Year => &self.year,
            Dimension::Trim => &c.trim,
            Dimension::Series => &c.series,
            Dimension::Package => &c.package,
            Dimension::Engine => &c.engine,
            Dimension::Drivetrain => &c.drivetrain,
            Dimension::BodyStyle => &c.body_style,
            Dimension::Color => &c.color,
            Dimension::Interior => &c.interior,
            Dimension::Equipment => "",
            Dimension::Status => &c.status,
            Dimension::Fuel => &c.fuel,
            Dimension::Transmission => &c.transmission,
        }
    }

    /// The raw source spelling behind a dimension, for exact matching.
    pub fn raw_value(&self, dim: Dimension) -> &str {
        match dim {
            Dimension::Model | Dimension::Series => &self.model,
            Dimension::Year => &self.year,
            Dimension::Trim => &self.trim,
            Dimension::Package => &self.equipment_pkg,
            Dimension::Engine => &self.engine,
            Dimension::Drivetrain => &self.drive_line,
            Dimension::BodyStyle => &self.body_style,
            Dimension::Color => &self.exterior,
            Dimension::Interior => &self.interior_color,
            Dimension::Equipment => "",
            Dimension::Status => &self.canonical.status,
            Dimension::Fuel => &self.fuel_type,
            Dimension::Transmission => &self.transmission,
        }
    }

    pub fn display_price(&self) -> Option<f64> {
        self.pricing.display_price()
    }
}

/// Display-critical subset of a [`VehicleRecord`] for list views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteVehicle {
    pub vin: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stock: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub year: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub make: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trim: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub exterior: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interior_color: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interior_material: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub engine: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub drive_line: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body_style: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub photo: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub photo_interior: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub equipment_pkg: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_equipment: Vec<EquipmentItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msrp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retail_price: Option<f64>,
    #[serde(default)]
    pub canonical: Canonical,
}

impl From<&VehicleRecord> for LiteVehicle {
    fn from(v: &VehicleRecord) -> Self {
        Self {
            vin: v.vin.clone(),
            stock: v.stock.clone(),
            year: v.year.clone(),
            make: v.make.clone(),
            model: v.model.clone(),
            trim: v.trim.clone(),
            exterior: v.exterior.clone(),
            interior_color: v.interior_color.clone(),
            interior_material: v.interior_material.clone(),
            engine: v.engine.clone(),
            drive_line: v.drive_line.clone(),
            body_style: v.body_style.clone(),
            condition: v.condition.clone(),
            photo: v.photo.clone(),
            photo_interior: v.photo_interior.clone(),
            equipment_pkg: v.equipment_pkg.clone(),
            optional_equipment: v.optional_equipment.clone(),
            msrp: v.pricing.msrp,
            retail_price: v.pricing.retail_price,
            canonical: v.canonical.clone(),
        }
    }
}

/// Convenience for tests and in-memory sources.
pub fn row(pairs: &[(&str, &str)]) -> RawRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row_requires_vin() {
        assert!(VehicleRecord::from_row(&row(&[("stock", "A1")])).is_none());
        assert!(VehicleRecord::from_row(&row(&[("vin", "  ")])).is_none());
    }

    #[test]
    fn test_photo_positions() {
        let urls: Vec<String> = (0..12).map(|i| format!("https://img/{}.jpg", i)).collect();
        let joined = urls.join(", ");
        let (v, _) =
            VehicleRecord::from_row(&row(&[("vin", "V1"), ("photo_urls", joined.as_str())])).unwrap();
        assert_eq!(v.photo, "https://img/0.jpg");
        assert_eq!(v.photo_interior, "https://img/9.jpg");
        assert_eq!(v.photo_urls.len(), 12);

        let (v, _) = VehicleRecord::from_row(&row(&[
            ("vin", "V2"),
            ("photo_urls", "https://a.jpg, ,https://b.jpg"),
        ]))
        .unwrap();
        assert_eq!(v.photo_urls, vec!["https://a.jpg", "https://b.jpg"]);
        assert_eq!(v.photo_interior, "https://b.jpg");
    }

    #[test]
    fn test_truck_body_style_wins() {
        let (v, _) = VehicleRecord::from_row(&row(&[
            ("vin", "V1"),
            ("model", "F-150"),
            ("body_style", "Pickup"),
            ("truck_body_style", "SuperCrew Cab"),
        ]))
        .unwrap();
        assert_eq!(v.body_style, "SuperCrew Cab");
        assert_eq!(v.value(Dimension::BodyStyle), "SuperCrew");
    }

    #[test]
    fn test_malformed_equipment_degrades_field() {
        let (v, diags) = VehicleRecord::from_row(&row(&[
            ("vin", "V1"),
            ("optional", "{not json"),
            ("standard", r#"["Cruise Control"]"#),
        ]))
        .unwrap();
        assert!(v.optional_equipment.is_empty());
        assert_eq!(v.standard_equipment.len(), 1);
        assert_eq!(
            diags,
            vec![Diagnostic::MalformedEmbeddedData {
                vin: "V1".into(),
                field: "optional".into()
            }]
        );
    }

    #[test]
    fn test_equipment_object_shapes() {
        let items = parse_equipment(
            r#"[{"description":"Spray-In Bedliner","code":"85S","msrp":"$595"},{"name":"Tonneau Cover"},"Running Boards"]"#,
        )
        .unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].msrp, Some(595.0));
        assert_eq!(items[1].description, "Tonneau Cover");
        assert_eq!(items[2].code, None);
    }

    #[test]
    fn test_pricing_fallbacks() {
        let p = Pricing::resolve(Some(50000.0), Some(-2000.0), Some(1000.0), None);
        assert_eq!(p.retail_price, Some(47000.0));
        assert_eq!(p.display_price(), Some(47000.0));

        let p = Pricing::resolve(Some(50000.0), None, None, None);
        assert_eq!(p.retail_price, None);
        assert_eq!(p.display_price(), Some(50000.0));

        let p = Pricing::resolve(None, None, None, Some(0.0));
        assert_eq!(p.display_price(), None);
    }

    #[test]
    fn test_embedded_pricing_overrides_columns() {
        let (v, diags) = VehicleRecord::from_row(&row(&[
            ("vin", "V1"),
            ("msrp", "$60,000"),
            ("pricing", r#"{"msrp": 61000, "discount": "$1,500"}"#),
        ]))
        .unwrap();
        assert!(diags.is_empty());
        assert_eq!(v.pricing.msrp, Some(61000.0));
        assert_eq!(v.pricing.retail_price, Some(59500.0));

        let (v, diags) = VehicleRecord::from_row(&row(&[
            ("vin", "V2"),
            ("msrp", "$60,000"),
            ("pricing", "oops"),
        ]))
        .unwrap();
        assert_eq!(diags.len(), 1);
        assert_eq!(v.display_price(), Some(60000.0));
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("$52,345"), Some(52345.0));
        assert_eq!(parse_money("52,345.50"), Some(52345.5));
        assert_eq!(parse_money("Call"), None);
        assert_eq!(parse_money(""), None);
    }

    #[test]
    fn test_canonical_derivation() {
        let (v, _) = VehicleRecord::from_row(&row(&[
            ("vin", "V1"),
            ("model", "F-350 Super Duty"),
            ("trim", "LARIAT"),
            ("paint", "Gray Metallic"),
            ("engine", "6.7L Power Stroke V-8 Diesel"),
            ("drivetrain", "4WD"),
            ("truck_body_style", "Crew Cab"),
            ("equipment_group", "Equipment Group 618A"),
        ]))
        .unwrap();
        assert_eq!(v.family(), Some(Family::SuperDuty));
        assert_eq!(v.value(Dimension::Series), "F-350");
        assert_eq!(v.value(Dimension::Trim), "Lariat");
        assert_eq!(v.value(Dimension::Color), "Stone Gray");
        assert_eq!(v.value(Dimension::Engine), "6.7L Power Stroke V8");
        assert_eq!(v.value(Dimension::Drivetrain), "4x4");
        assert_eq!(v.value(Dimension::BodyStyle), "Crew Cab");
        assert_eq!(v.value(Dimension::Package), "618A");
        assert_eq!(v.value(Dimension::Status), STATUS_IN_TRANSIT);
    }

    #[test]
    fn test_serialization_strips_empty_fields() {
        let (v, _) = VehicleRecord::from_row(&row(&[("vin", "V1"), ("stock", "A1")])).unwrap();
        let json = serde_json::to_value(&v).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("vin"));
        assert!(obj.contains_key("stock"));
        assert!(!obj.contains_key("trim"));
        assert!(!obj.contains_key("msrp"));
        assert!(!obj.contains_key("photo_urls"));

        let back: VehicleRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }
}
