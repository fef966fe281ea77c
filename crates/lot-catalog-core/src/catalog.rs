//! Canonical per-model catalog.
//!
//! Static enumeration of the trims, packages, engines, drivetrains, body
//! styles, colors, series, and equipment options offered for each model
//! family. Every enumerated value is already in canonical form, so it
//! normalizes to itself.
//!
//! The catalog also owns the equipment exception table: named rules that
//! grant an equipment option to records whose sticker text omits it (for
//! example, running boards that ship standard on upper F-150 trims). The
//! built-in table can be extended from configuration without code changes.

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::models::{Dimension, Family, VehicleRecord};

/// A selectable equipment option and the sticker keywords that imply it.
#[derive(Debug)]
pub struct EquipmentOption {
    pub key: &'static str,
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

/// Static configuration for one model family.
#[derive(Debug)]
pub struct FamilyConfig {
    pub family: Family,
    pub trims: &'static [&'static str],
    /// Trim name to the package codes offered on it.
    pub packages: &'static [(&'static str, &'static [&'static str])],
    pub engines: &'static [&'static str],
    pub drivetrains: &'static [&'static str],
    pub body_styles: &'static [&'static str],
    pub colors: &'static [&'static str],
    /// Sub-model designations. Empty for families without series.
    pub series: &'static [&'static str],
    pub equipment: &'static [EquipmentOption],
}

impl FamilyConfig {
    /// Configured option values for a dimension, in display order.
    pub fn values(&self, dim: Dimension) -> Vec<&'static str> {
        match dim {
            Dimension::Trim => self.trims.to_vec(),
            Dimension::Package => self
                .packages
                .iter()
                .flat_map(|(_, codes)| codes.iter().copied())
                .collect(),
            Dimension::Engine => self.engines.to_vec(),
            Dimension::Drivetrain => self.drivetrains.to_vec(),
            Dimension::BodyStyle => self.body_styles.to_vec(),
            Dimension::Color => self.colors.to_vec(),
            Dimension::Series => self.series.to_vec(),
            Dimension::Equipment => self.equipment.iter().map(|e| e.key).collect(),
            Dimension::Status => vec![
                crate::models::STATUS_IN_STOCK,
                crate::models::STATUS_IN_TRANSIT,
            ],
            _ => Vec::new(),
        }
    }

    pub fn has_series(&self) -> bool {
        !self.series.is_empty()
    }

    pub fn equipment_option(&self, key_or_label: &str) -> Option<&'static EquipmentOption> {
        self.equipment.iter().find(|e| {
            e.key.eq_ignore_ascii_case(key_or_label) || e.label.eq_ignore_ascii_case(key_or_label)
        })
    }
}

// ============ Equipment option sets ============

const BEDLINER: EquipmentOption = EquipmentOption {
    key: "bedliner",
    label: "Spray-In Bedliner",
    keywords: &["bedliner", "tough bed", "spray-in"],
};
const RUNNING_BOARDS: EquipmentOption = EquipmentOption {
    key: "running_boards",
    label: "Running Boards",
    keywords: &["running board", "step bar"],
};
const MOONROOF: EquipmentOption = EquipmentOption {
    key: "moonroof",
    label: "Moonroof",
    keywords: &["moonroof", "sunroof", "twin panel"],
};
const BLACK_APPEARANCE: EquipmentOption = EquipmentOption {
    key: "black_appearance",
    label: "Black Appearance Pkg",
    keywords: &["black appearance"],
};
const FX4: EquipmentOption = EquipmentOption {
    key: "fx4",
    label: "FX4 Off-Road Pkg",
    keywords: &["fx4", "off-road"],
};
const TOW_PKG: EquipmentOption = EquipmentOption {
    key: "tow_pkg",
    label: "Trailer Tow Pkg",
    keywords: &["trailer tow", "max tow"],
};
const CAMERA_360: EquipmentOption = EquipmentOption {
    key: "360_camera",
    label: "360 Camera",
    keywords: &["360", "camera"],
};
const BLUECRUISE: EquipmentOption = EquipmentOption {
    key: "bluecruise",
    label: "BlueCruise",
    keywords: &["bluecruise"],
};
const TONNEAU: EquipmentOption = EquipmentOption {
    key: "tonneau",
    label: "Tonneau Cover",
    keywords: &["tonneau"],
};
const PRO_POWER: EquipmentOption = EquipmentOption {
    key: "pro_power",
    label: "Pro Power Onboard",
    keywords: &["pro power"],
};
const FIFTH_WHEEL: EquipmentOption = EquipmentOption {
    key: "fifth_wheel",
    label: "5th Wheel/Gooseneck Prep",
    keywords: &["5th wheel", "fifth wheel", "gooseneck"],
};
const SASQUATCH: EquipmentOption = EquipmentOption {
    key: "sasquatch",
    label: "Sasquatch Pkg",
    keywords: &["sasquatch"],
};

const TRUCK_EQUIPMENT: &[EquipmentOption] = &[
    BEDLINER,
    RUNNING_BOARDS,
    MOONROOF,
    BLACK_APPEARANCE,
    FX4,
    TOW_PKG,
    CAMERA_360,
    BLUECRUISE,
    TONNEAU,
    PRO_POWER,
];
const HEAVY_TRUCK_EQUIPMENT: &[EquipmentOption] = &[
    BEDLINER,
    RUNNING_BOARDS,
    MOONROOF,
    FX4,
    TOW_PKG,
    FIFTH_WHEEL,
    CAMERA_360,
    BLUECRUISE,
    PRO_POWER,
];
const SUV_EQUIPMENT: &[EquipmentOption] = &[MOONROOF, TOW_PKG, CAMERA_360, BLUECRUISE, BLACK_APPEARANCE];
const BRONCO_EQUIPMENT: &[EquipmentOption] = &[SASQUATCH, TOW_PKG, CAMERA_360, BLACK_APPEARANCE];
const VAN_EQUIPMENT: &[EquipmentOption] = &[CAMERA_360, TOW_PKG];

// ============ Family tables ============

const F150_COLORS: &[&str] = &[
    "Agate Black",
    "Antimatter Blue",
    "Carbonized Gray",
    "Iconic Silver",
    "Oxford White",
    "Rapid Red",
    "Star White",
    "Space White",
    "Marsh Gray",
    "Atlas Blue",
];
const SUPER_DUTY_COLORS: &[&str] = &[
    "Agate Black",
    "Antimatter Blue",
    "Atlas Blue",
    "Carbonized Gray",
    "Glacier Gray",
    "Iconic Silver",
    "Oxford White",
    "Rapid Red",
    "Star White",
    "Stone Gray",
];
const SUV_COLORS: &[&str] = &[
    "Agate Black",
    "Atlas Blue",
    "Carbonized Gray",
    "Iconic Silver",
    "Oxford White",
    "Rapid Red",
    "Space White",
    "Star White",
    "Vapor Blue",
];
const BRONCO_COLORS: &[&str] = &[
    "Area 51",
    "Azure Gray",
    "Cactus Gray",
    "Carbonized Gray",
    "Desert Sand",
    "Eruption Green",
    "Oxford White",
    "Race Red",
    "Shadow Black",
    "Velocity Blue",
];
const MUSTANG_COLORS: &[&str] = &[
    "Absolute Black",
    "Atlas Blue",
    "Carbonized Gray",
    "Grabber Blue",
    "Iconic Silver",
    "Oxford White",
    "Race Red",
    "Shadow Black",
    "Vapor Blue",
];
const VAN_COLORS: &[&str] = &["Agate Black", "Carbonized Gray", "Oxford White", "Race Red"];

static F150: FamilyConfig = FamilyConfig {
    family: Family::F150,
    trims: &["XL", "STX", "XLT", "Lariat", "King Ranch", "Platinum", "Tremor", "Raptor"],
    packages: &[
        ("XL", &["101A", "103A"]),
        ("STX", &["200A", "200B", "201A"]),
        ("XLT", &["300A", "301A", "302A", "303A"]),
        ("Lariat", &["500A", "501A", "502A"]),
        ("King Ranch", &["601A"]),
        ("Platinum", &["701A", "702A", "703A"]),
        ("Tremor", &["401A", "402A"]),
        ("Raptor", &["801A", "802A", "803A"]),
    ],
    engines: &[
        "2.7L EcoBoost V6",
        "3.5L EcoBoost V6",
        "3.5L PowerBoost Hybrid V6",
        "5.0L V8",
        "3.5L High Output EcoBoost V6",
    ],
    drivetrains: &["4x2", "4x4"],
    body_styles: &["Regular Cab", "Super Cab", "SuperCrew"],
    colors: F150_COLORS,
    series: &[],
    equipment: TRUCK_EQUIPMENT,
};

static SUPER_DUTY: FamilyConfig = FamilyConfig {
    family: Family::SuperDuty,
    trims: &["XL", "XLT", "Lariat", "King Ranch", "Platinum", "Limited"],
    packages: &[
        ("XL", &["600A"]),
        ("XLT", &["603A", "604A"]),
        ("Lariat", &["608A", "618A"]),
        ("King Ranch", &["700A"]),
        ("Platinum", &["710A"]),
        ("Limited", &["720A"]),
    ],
    engines: &[
        "6.8L V8 Gas",
        "7.3L V8 Gas",
        "6.7L Power Stroke V8",
        "6.7L High Output Power Stroke V8",
    ],
    drivetrains: &["4x2", "4x4"],
    body_styles: &["Regular Cab", "Super Cab", "Crew Cab", "Chassis Cab"],
    colors: SUPER_DUTY_COLORS,
    series: &["F-250", "F-350", "F-450", "F-550", "F-600"],
    equipment: HEAVY_TRUCK_EQUIPMENT,
};

static EXPLORER: FamilyConfig = FamilyConfig {
    family: Family::Explorer,
    trims: &["Active", "ST-Line", "Platinum", "ST", "Tremor"],
    packages: &[],
    engines: &["2.3L EcoBoost I4", "3.0L EcoBoost V6"],
    drivetrains: &["RWD", "4x4"],
    body_styles: &["SUV"],
    colors: SUV_COLORS,
    series: &[],
    equipment: SUV_EQUIPMENT,
};

static MAVERICK: FamilyConfig = FamilyConfig {
    family: Family::Maverick,
    trims: &["XL", "XLT", "Lariat", "Tremor"],
    packages: &[],
    engines: &["2.0L EcoBoost I4", "2.5L Hybrid I4"],
    drivetrains: &["FWD", "AWD"],
    body_styles: &["SuperCrew"],
    colors: SUV_COLORS,
    series: &[],
    equipment: TRUCK_EQUIPMENT,
};

static MUSTANG_MACH_E: FamilyConfig = FamilyConfig {
    family: Family::MustangMachE,
    trims: &["Select", "Premium", "GT", "Rally"],
    packages: &[],
    engines: &["Standard Range Battery", "Extended Range Battery"],
    drivetrains: &["RWD", "AWD"],
    body_styles: &["SUV"],
    colors: SUV_COLORS,
    series: &[],
    equipment: SUV_EQUIPMENT,
};

static BRONCO: FamilyConfig = FamilyConfig {
    family: Family::Bronco,
    trims: &[
        "Base",
        "Big Bend",
        "Black Diamond",
        "Outer Banks",
        "Badlands",
        "Everglades",
        "Heritage Edition",
        "Wildtrak",
        "Raptor",
    ],
    packages: &[],
    engines: &["2.3L EcoBoost I4", "2.7L EcoBoost V6", "3.0L EcoBoost V6"],
    drivetrains: &["4x4"],
    body_styles: &["2-Door", "4-Door"],
    colors: BRONCO_COLORS,
    series: &[],
    equipment: BRONCO_EQUIPMENT,
};

static BRONCO_SPORT: FamilyConfig = FamilyConfig {
    family: Family::BroncoSport,
    trims: &["Big Bend", "Heritage", "Outer Banks", "Badlands"],
    packages: &[],
    engines: &["1.5L EcoBoost I3", "2.0L EcoBoost I4"],
    drivetrains: &["AWD"],
    body_styles: &["SUV"],
    colors: BRONCO_COLORS,
    series: &[],
    equipment: BRONCO_EQUIPMENT,
};

static MUSTANG: FamilyConfig = FamilyConfig {
    family: Family::Mustang,
    trims: &["EcoBoost", "EcoBoost Premium", "GT", "GT Premium", "Dark Horse"],
    packages: &[],
    engines: &["2.3L EcoBoost I4", "5.0L V8", "5.2L Supercharged V8"],
    drivetrains: &["RWD"],
    body_styles: &["Fastback", "Convertible"],
    colors: MUSTANG_COLORS,
    series: &[],
    equipment: &[],
};

static EXPEDITION: FamilyConfig = FamilyConfig {
    family: Family::Expedition,
    trims: &["Active", "Platinum", "King Ranch", "Tremor"],
    packages: &[],
    engines: &["3.5L EcoBoost V6", "3.5L High Output EcoBoost V6"],
    drivetrains: &["RWD", "4x4"],
    body_styles: &["SUV"],
    colors: SUV_COLORS,
    series: &[],
    equipment: SUV_EQUIPMENT,
};

static RANGER: FamilyConfig = FamilyConfig {
    family: Family::Ranger,
    trims: &["XL", "XLT", "Lariat", "Raptor"],
    packages: &[],
    engines: &["2.3L EcoBoost I4", "2.7L EcoBoost V6", "3.0L EcoBoost V6"],
    drivetrains: &["4x2", "4x4"],
    body_styles: &["Super Cab", "SuperCrew"],
    colors: F150_COLORS,
    series: &[],
    equipment: TRUCK_EQUIPMENT,
};

static ESCAPE: FamilyConfig = FamilyConfig {
    family: Family::Escape,
    trims: &["Active", "ST-Line", "ST-Line Select", "Platinum", "PHEV"],
    packages: &[],
    engines: &["1.5L EcoBoost I3", "2.0L EcoBoost I4", "2.5L Hybrid I4"],
    drivetrains: &["FWD", "AWD"],
    body_styles: &["SUV"],
    colors: SUV_COLORS,
    series: &[],
    equipment: SUV_EQUIPMENT,
};

static F150_LIGHTNING: FamilyConfig = FamilyConfig {
    family: Family::F150Lightning,
    trims: &["Pro", "XLT", "Flash", "Lariat", "Platinum"],
    packages: &[],
    engines: &["Standard Range Battery", "Extended Range Battery", "Dual eMotor"],
    drivetrains: &["4x4"],
    body_styles: &["SuperCrew"],
    colors: F150_COLORS,
    series: &[],
    equipment: TRUCK_EQUIPMENT,
};

static TRANSIT: FamilyConfig = FamilyConfig {
    family: Family::Transit,
    trims: &[
        "Cargo Van",
        "Crew Van",
        "Passenger Van XL",
        "Passenger Van XLT",
        "Trail",
    ],
    packages: &[],
    engines: &["3.5L PFDi V6", "3.5L EcoBoost V6", "3.5L V6"],
    drivetrains: &["RWD", "AWD"],
    body_styles: &["Cargo Van", "Passenger Van", "Crew Van", "Cutaway"],
    colors: VAN_COLORS,
    series: &[],
    equipment: VAN_EQUIPMENT,
};

/// Static configuration for a family.
pub fn family_config(family: Family) -> &'static FamilyConfig {
    match family {
        Family::F150 => &F150,
        Family::SuperDuty => &SUPER_DUTY,
        Family::Explorer => &EXPLORER,
        Family::Maverick => &MAVERICK,
        Family::MustangMachE => &MUSTANG_MACH_E,
        Family::Bronco => &BRONCO,
        Family::BroncoSport => &BRONCO_SPORT,
        Family::Mustang => &MUSTANG,
        Family::Expedition => &EXPEDITION,
        Family::Ranger => &RANGER,
        Family::Escape => &ESCAPE,
        Family::F150Lightning => &F150_LIGHTNING,
        Family::Transit => &TRANSIT,
    }
}

// ============ Equipment exceptions ============

/// Grants an equipment option to records the sticker text does not cover.
///
/// A record qualifies when its family matches and its canonical trim is in
/// `trims` or its canonical package is in `packages`. A non-empty `years`
/// further restricts the rule to those model years.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EquipmentException {
    pub family: String,
    pub option: String,
    #[serde(default)]
    pub trims: Vec<String>,
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub years: Vec<String>,
}

impl EquipmentException {
    fn applies(&self, record: &VehicleRecord, option_key: &str) -> bool {
        if self.family != record.family_slug() || !self.option.eq_ignore_ascii_case(option_key) {
            return false;
        }
        if !self.years.is_empty() && !self.years.iter().any(|y| y == &record.year) {
            return false;
        }
        let trim = record.value(Dimension::Trim);
        let package = record.value(Dimension::Package);
        self.trims.iter().any(|t| t.eq_ignore_ascii_case(trim))
            || self.packages.iter().any(|p| p.eq_ignore_ascii_case(package))
    }
}

fn builtin_exceptions() -> Vec<EquipmentException> {
    vec![
        // Running boards ship standard on upper F-150 trims and XLT high packages,
        // but stickers list them under standard equipment only.
        EquipmentException {
            family: "f150".to_string(),
            option: "running_boards".to_string(),
            trims: vec![
                "Lariat".to_string(),
                "King Ranch".to_string(),
                "Platinum".to_string(),
            ],
            packages: vec!["302A".to_string(), "303A".to_string()],
            years: Vec::new(),
        },
        EquipmentException {
            family: "super-duty".to_string(),
            option: "running_boards".to_string(),
            trims: vec![
                "King Ranch".to_string(),
                "Platinum".to_string(),
                "Limited".to_string(),
            ],
            packages: Vec::new(),
            years: Vec::new(),
        },
    ]
}

/// The canonical catalog: static family tables plus the equipment exception table.
#[derive(Debug, Clone)]
pub struct Catalog {
    exceptions: Vec<EquipmentException>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            exceptions: builtin_exceptions(),
        }
    }

    /// Append exceptions, validating that each names a known family and option.
    pub fn with_exceptions(mut self, extra: Vec<EquipmentException>) -> Result<Self> {
        for e in &extra {
            let Some(family) = Family::from_slug(&e.family) else {
                bail!("equipment exception names unknown family '{}'", e.family);
            };
            if family_config(family).equipment_option(&e.option).is_none() {
                bail!(
                    "equipment exception names unknown option '{}' for family '{}'",
                    e.option,
                    e.family
                );
            }
            if e.trims.is_empty() && e.packages.is_empty() {
                bail!(
                    "equipment exception for '{}'/'{}' must list trims or packages",
                    e.family,
                    e.option
                );
            }
        }
        self.exceptions.extend(extra);
        Ok(self)
    }

    pub fn exceptions(&self) -> &[EquipmentException] {
        &self.exceptions
    }

    pub fn family(&self, family: Family) -> &'static FamilyConfig {
        family_config(family)
    }

    /// Whether `value` is an enumerated option for the record's family.
    pub fn is_known_option(&self, family: Option<Family>, dim: Dimension, value: &str) -> bool {
        match family {
            Some(f) => family_config(f)
                .values(dim)
                .iter()
                .any(|v| v.eq_ignore_ascii_case(value)),
            None => false,
        }
    }

    /// Whether a record carries an equipment option, by sticker keyword or exception.
    pub fn has_equipment(&self, record: &VehicleRecord, option: &EquipmentOption) -> bool {
        let keyword_hit = record.optional_equipment.iter().any(|item| {
            let text = match &item.code {
                Some(code) => format!("{} {}", item.description, code).to_lowercase(),
                None => item.description.to_lowercase(),
            };
            option
                .keywords
                .iter()
                .any(|kw| text.contains(&kw.to_lowercase()))
        });
        keyword_hit || self.exceptions.iter().any(|e| e.applies(record, option.key))
    }

    /// Keys of every configured equipment option the record carries.
    pub fn equipment_of(&self, record: &VehicleRecord) -> Vec<&'static str> {
        match record.family() {
            Some(f) => family_config(f)
                .equipment
                .iter()
                .filter(|opt| self.has_equipment(record, opt))
                .map(|opt| opt.key)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Package codes offered on any of the given trims, in configuration order.
    ///
    /// An empty trim list yields every package for the family.
    pub fn packages_for_trims(&self, family: Family, trims: &[&str]) -> Vec<&'static str> {
        family_config(family)
            .packages
            .iter()
            .filter(|(trim, _)| trims.is_empty() || trims.iter().any(|t| t.eq_ignore_ascii_case(trim)))
            .flat_map(|(_, codes)| codes.iter().copied())
            .collect()
    }

    /// Position of a trim in the family's configured ladder.
    pub fn trim_rank(&self, family: Option<Family>, trim: &str) -> Option<usize> {
        family_config(family?)
            .trims
            .iter()
            .position(|t| t.eq_ignore_ascii_case(trim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::row;
    use crate::normalize::{normalize, NormalizeContext};

    fn record(pairs: &[(&str, &str)]) -> VehicleRecord {
        VehicleRecord::from_row(&row(pairs)).unwrap().0
    }

    #[test]
    fn test_configured_values_are_canonical() {
        let dims = [
            Dimension::Trim,
            Dimension::Engine,
            Dimension::Drivetrain,
            Dimension::BodyStyle,
            Dimension::Color,
            Dimension::Series,
            Dimension::Package,
        ];
        for family in Family::ALL {
            let ctx = NormalizeContext::for_family(family);
            let cfg = family_config(family);
            for dim in dims {
                for value in cfg.values(dim) {
                    assert_eq!(
                        normalize(dim, value, &ctx),
                        value,
                        "{} {} '{}' is not canonical",
                        family.slug(),
                        dim,
                        value
                    );
                }
            }
        }
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let v = record(&[
            ("vin", "V1"),
            ("model", "F-150"),
            ("optional", r#"["TOUGH BED Spray-In Bedliner", "Twin Panel Moonroof"]"#),
        ]);
        let catalog = Catalog::builtin();
        assert_eq!(catalog.equipment_of(&v), vec!["bedliner", "moonroof"]);
    }

    #[test]
    fn test_running_board_exception() {
        let catalog = Catalog::builtin();
        let boards = family_config(Family::F150)
            .equipment_option("running_boards")
            .unwrap();

        let lariat = record(&[("vin", "V1"), ("model", "F-150"), ("trim", "Lariat")]);
        assert!(catalog.has_equipment(&lariat, boards));

        let xlt_302 = record(&[
            ("vin", "V2"),
            ("model", "F-150"),
            ("trim", "XLT"),
            ("equipment_group", "302A"),
        ]);
        assert!(catalog.has_equipment(&xlt_302, boards));

        let xlt_301 = record(&[
            ("vin", "V3"),
            ("model", "F-150"),
            ("trim", "XLT"),
            ("equipment_group", "301A"),
        ]);
        assert!(!catalog.has_equipment(&xlt_301, boards));
    }

    #[test]
    fn test_configured_exception_with_years() {
        let catalog = Catalog::builtin()
            .with_exceptions(vec![EquipmentException {
                family: "f150".into(),
                option: "tonneau".into(),
                trims: vec!["Raptor".into()],
                packages: vec![],
                years: vec!["2025".into()],
            }])
            .unwrap();
        let tonneau = family_config(Family::F150).equipment_option("tonneau").unwrap();

        let r25 = record(&[("vin", "V1"), ("model", "F-150"), ("trim", "Raptor"), ("year", "2025")]);
        let r24 = record(&[("vin", "V2"), ("model", "F-150"), ("trim", "Raptor"), ("year", "2024")]);
        assert!(catalog.has_equipment(&r25, tonneau));
        assert!(!catalog.has_equipment(&r24, tonneau));
    }

    #[test]
    fn test_exception_validation() {
        let bad_family = Catalog::builtin().with_exceptions(vec![EquipmentException {
            family: "pinto".into(),
            option: "moonroof".into(),
            trims: vec!["Base".into()],
            packages: vec![],
            years: vec![],
        }]);
        assert!(bad_family.is_err());

        let bad_option = Catalog::builtin().with_exceptions(vec![EquipmentException {
            family: "f150".into(),
            option: "jetpack".into(),
            trims: vec!["XL".into()],
            packages: vec![],
            years: vec![],
        }]);
        assert!(bad_option.is_err());
    }

    #[test]
    fn test_packages_for_trims() {
        let catalog = Catalog::builtin();
        assert_eq!(
            catalog.packages_for_trims(Family::F150, &["Lariat", "King Ranch"]),
            vec!["500A", "501A", "502A", "601A"]
        );
        assert_eq!(catalog.packages_for_trims(Family::F150, &[]).len(), 21);
    }

    #[test]
    fn test_trim_rank() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.trim_rank(Some(Family::F150), "XL"), Some(0));
        assert_eq!(catalog.trim_rank(Some(Family::F150), "raptor"), Some(7));
        assert_eq!(catalog.trim_rank(None, "XL"), None);
    }
}
