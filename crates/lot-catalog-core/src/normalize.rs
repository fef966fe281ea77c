//! Attribute normalization.
//!
//! Maps vendor-supplied attribute strings to canonical values, one rule
//! table per dimension. This module is the only place normalization rules
//! live; the materializer, the query service, and the filter engine all
//! call [`normalize`].
//!
//! # Algorithm
//!
//! 1. Prepare the raw value for the dimension: lowercase, and for some
//!    dimensions strip hyphens and en/em dashes (so `V-6` equals `V6`)
//!    or all whitespace (so `Super Crew` equals `SuperCrew`).
//! 2. Walk the dimension's rules in order. A rule matches when every one
//!    of its patterns is a substring of the prepared value and its scope
//!    admits the record's family.
//! 3. Return the first matching rule's label, or the trimmed raw value
//!    when nothing matches.
//!
//! Every label normalizes to itself, so `normalize` is idempotent.
//! Empty input always yields an empty string.

use crate::catalog::family_config;
use crate::models::{Dimension, Family, Platform};

/// Disambiguation context for a single record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeContext {
    pub family: Option<Family>,
}

impl NormalizeContext {
    pub fn none() -> Self {
        Self { family: None }
    }

    pub fn for_family(family: Family) -> Self {
        Self {
            family: Some(family),
        }
    }
}

/// Which records a rule applies to.
#[derive(Debug, Clone, Copy)]
enum Scope {
    Any,
    LightTruck,
    HeavyTruck,
    Truck,
    NotTruck,
    Only(Family),
}

impl Scope {
    fn admits(self, ctx: &NormalizeContext) -> bool {
        let platform = ctx.family.map(Family::platform).unwrap_or(Platform::Other);
        match self {
            Scope::Any => true,
            Scope::LightTruck => platform == Platform::LightTruck,
            Scope::HeavyTruck => platform == Platform::HeavyTruck,
            Scope::Truck => platform != Platform::Other,
            Scope::NotTruck => platform == Platform::Other,
            Scope::Only(f) => ctx.family == Some(f),
        }
    }
}

struct Rule {
    all: &'static [&'static str],
    label: &'static str,
    scope: Scope,
}

const fn rule(all: &'static [&'static str], label: &'static str) -> Rule {
    Rule {
        all,
        label,
        scope: Scope::Any,
    }
}

const fn scoped(all: &'static [&'static str], label: &'static str, scope: Scope) -> Rule {
    Rule { all, label, scope }
}

/// How a raw value is prepared before pattern matching.
#[derive(Debug, Clone, Copy)]
enum Prep {
    /// Lowercase, internal whitespace collapsed.
    Plain,
    /// Lowercase, dashes removed, internal whitespace collapsed.
    Dashless,
    /// Lowercase, dashes and all whitespace removed.
    Compact,
}

fn is_dash(c: char) -> bool {
    matches!(c, '-' | '\u{2013}' | '\u{2014}')
}

fn prepare(raw: &str, prep: Prep) -> String {
    let lower = raw.trim().to_lowercase();
    match prep {
        Prep::Plain => lower.split_whitespace().collect::<Vec<_>>().join(" "),
        Prep::Dashless => lower
            .chars()
            .filter(|c| !is_dash(*c))
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
        Prep::Compact => lower
            .chars()
            .filter(|c| !is_dash(*c) && !c.is_whitespace())
            .collect(),
    }
}

// Engine uses dash removal only. Whitespace is left alone so that
// "high output" and "highoutput" stay distinguishable.
const ENGINE_RULES: &[Rule] = &[
    rule(&["6.7l", "high output"], "6.7L High Output Power Stroke V8"),
    rule(&["6.7l"], "6.7L Power Stroke V8"),
    rule(&["7.3l"], "7.3L V8 Gas"),
    rule(&["6.8l"], "6.8L V8 Gas"),
    rule(&["3.5l", "powerboost"], "3.5L PowerBoost Hybrid V6"),
    rule(&["3.5l", "high output"], "3.5L High Output EcoBoost V6"),
    rule(&["3.5l", "highoutput"], "3.5L High Output EcoBoost V6"),
    rule(&["3.5l", "pfdi"], "3.5L PFDi V6"),
    rule(&["3.5l", "ecoboost"], "3.5L EcoBoost V6"),
    rule(&["2.7l"], "2.7L EcoBoost V6"),
    rule(&["5.0l"], "5.0L V8"),
    rule(&["5.2l"], "5.2L Supercharged V8"),
    rule(&["3.0l", "ecoboost"], "3.0L EcoBoost V6"),
    rule(&["2.3l"], "2.3L EcoBoost I4"),
    rule(&["2.0l", "ecoboost"], "2.0L EcoBoost I4"),
    rule(&["2.5l", "hyb"], "2.5L Hybrid I4"),
    rule(&["1.5l"], "1.5L EcoBoost I3"),
    rule(&["dual emotor"], "Dual eMotor"),
    rule(&["extended range"], "Extended Range Battery"),
    rule(&["standard range"], "Standard Range Battery"),
    rule(&["3.5l", "v6"], "3.5L V6"),
];

const COLOR_RULES: &[Rule] = &[
    rule(&["agate black"], "Agate Black"),
    rule(&["shadow black"], "Shadow Black"),
    rule(&["absolute black"], "Absolute Black"),
    rule(&["antimatter blue"], "Antimatter Blue"),
    rule(&["atlas blue"], "Atlas Blue"),
    rule(&["velocity blue"], "Velocity Blue"),
    rule(&["vapor blue"], "Vapor Blue"),
    rule(&["grabber blue"], "Grabber Blue"),
    rule(&["carbonized gray"], "Carbonized Gray"),
    rule(&["stone gray"], "Stone Gray"),
    rule(&["marsh gray"], "Marsh Gray"),
    rule(&["glacier gray"], "Glacier Gray"),
    rule(&["azure gray"], "Azure Gray"),
    rule(&["cactus gray"], "Cactus Gray"),
    rule(&["iconic silver"], "Iconic Silver"),
    rule(&["oxford white"], "Oxford White"),
    rule(&["star white"], "Star White"),
    rule(&["space white"], "Space White"),
    rule(&["rapid red"], "Rapid Red"),
    rule(&["race red"], "Race Red"),
    rule(&["eruption green"], "Eruption Green"),
    rule(&["desert sand"], "Desert Sand"),
    rule(&["area 51"], "Area 51"),
    // Shared vendor code; the canonical gray depends on the platform.
    scoped(&["gray metallic"], "Carbonized Gray", Scope::LightTruck),
    scoped(&["gray metallic"], "Stone Gray", Scope::HeavyTruck),
];

const DRIVETRAIN_RULES: &[Rule] = &[
    rule(&["4x4"], "4x4"),
    rule(&["4wd"], "4x4"),
    rule(&["4wheel"], "4x4"),
    rule(&["fourwheel"], "4x4"),
    rule(&["awd"], "AWD"),
    rule(&["allwheel"], "AWD"),
    scoped(&["4x2"], "4x2", Scope::Truck),
    scoped(&["rwd"], "4x2", Scope::Truck),
    scoped(&["2wd"], "4x2", Scope::Truck),
    scoped(&["rearwheel"], "4x2", Scope::Truck),
    scoped(&["4x2"], "RWD", Scope::NotTruck),
    scoped(&["rwd"], "RWD", Scope::NotTruck),
    scoped(&["2wd"], "RWD", Scope::NotTruck),
    scoped(&["rearwheel"], "RWD", Scope::NotTruck),
    rule(&["fwd"], "FWD"),
    rule(&["frontwheel"], "FWD"),
];

const BODY_STYLE_RULES: &[Rule] = &[
    rule(&["chassis"], "Chassis Cab"),
    scoped(&["supercrew"], "Crew Cab", Scope::HeavyTruck),
    scoped(&["crewcab"], "Crew Cab", Scope::HeavyTruck),
    rule(&["supercrew"], "SuperCrew"),
    rule(&["crewcab"], "SuperCrew"),
    rule(&["supercab"], "Super Cab"),
    rule(&["extendedcab"], "Super Cab"),
    rule(&["extcab"], "Super Cab"),
    rule(&["regularcab"], "Regular Cab"),
    rule(&["regcab"], "Regular Cab"),
    rule(&["cargovan"], "Cargo Van"),
    rule(&["passengervan"], "Passenger Van"),
    rule(&["wagon"], "Passenger Van"),
    rule(&["crewvan"], "Crew Van"),
    rule(&["cutaway"], "Cutaway"),
    rule(&["4door"], "4-Door"),
    rule(&["4dr"], "4-Door"),
    rule(&["2door"], "2-Door"),
    rule(&["2dr"], "2-Door"),
    rule(&["convertible"], "Convertible"),
    rule(&["fastback"], "Fastback"),
    rule(&["coupe"], "Fastback"),
    rule(&["suv"], "SUV"),
    rule(&["sportutility"], "SUV"),
];

const MODEL_RULES: &[Rule] = &[
    rule(&["lightning"], "f150-lightning"),
    rule(&["mache"], "mustang-mach-e"),
    rule(&["bronco", "sport"], "bronco-sport"),
    rule(&["superduty"], "super-duty"),
    rule(&["f250"], "super-duty"),
    rule(&["f350"], "super-duty"),
    rule(&["f450"], "super-duty"),
    rule(&["f550"], "super-duty"),
    rule(&["f600"], "super-duty"),
    rule(&["f150"], "f150"),
    rule(&["ranger"], "ranger"),
    rule(&["maverick"], "maverick"),
    rule(&["expedition"], "expedition"),
    rule(&["escape"], "escape"),
    rule(&["transit"], "transit"),
    rule(&["bronco"], "bronco"),
    rule(&["explorer"], "explorer"),
    rule(&["mustang"], "mustang"),
];

const SERIES_RULES: &[Rule] = &[
    rule(&["f250"], "F-250"),
    rule(&["f350"], "F-350"),
    rule(&["f450"], "F-450"),
    rule(&["f550"], "F-550"),
    rule(&["f600"], "F-600"),
];

const STATUS_RULES: &[Rule] = &[
    rule(&["intransit"], "in-transit"),
    rule(&["instock"], "in-stock"),
    rule(&["onlot"], "in-stock"),
];

const FUEL_RULES: &[Rule] = &[
    rule(&["plugin"], "Plug-In Hybrid"),
    rule(&["phev"], "Plug-In Hybrid"),
    rule(&["hybrid"], "Hybrid"),
    rule(&["electric"], "Electric"),
    rule(&["diesel"], "Diesel"),
    rule(&["flex"], "Flex Fuel"),
    rule(&["gas"], "Gas"),
];

// Vendor trim quirks. Anything else is matched exactly against the
// family's configured trims.
const TRIM_RULES: &[Rule] = &[
    scoped(&["premium"], "Premium", Scope::Only(Family::MustangMachE)),
    scoped(&["select"], "Select", Scope::Only(Family::MustangMachE)),
    scoped(&["gt"], "GT", Scope::Only(Family::MustangMachE)),
    scoped(&["rally"], "Rally", Scope::Only(Family::MustangMachE)),
    scoped(&["plugin hybrid"], "PHEV", Scope::Only(Family::Escape)),
    scoped(&["plug in hybrid"], "PHEV", Scope::Only(Family::Escape)),
    scoped(&["cargo"], "Cargo Van", Scope::Only(Family::Transit)),
];

fn table(dim: Dimension) -> Option<(&'static [Rule], Prep)> {
    match dim {
        Dimension::Engine => Some((ENGINE_RULES, Prep::Dashless)),
        Dimension::Color => Some((COLOR_RULES, Prep::Plain)),
        Dimension::Drivetrain => Some((DRIVETRAIN_RULES, Prep::Compact)),
        Dimension::BodyStyle => Some((BODY_STYLE_RULES, Prep::Compact)),
        Dimension::Model => Some((MODEL_RULES, Prep::Compact)),
        Dimension::Series => Some((SERIES_RULES, Prep::Compact)),
        Dimension::Status => Some((STATUS_RULES, Prep::Compact)),
        Dimension::Fuel => Some((FUEL_RULES, Prep::Compact)),
        Dimension::Trim => Some((TRIM_RULES, Prep::Dashless)),
        Dimension::Year
        | Dimension::Package
        | Dimension::Interior
        | Dimension::Equipment
        | Dimension::Transmission => None,
    }
}

fn first_match(rules: &[Rule], prepared: &str, ctx: &NormalizeContext) -> Option<&'static str> {
    rules
        .iter()
        .find(|r| r.scope.admits(ctx) && r.all.iter().all(|p| prepared.contains(p)))
        .map(|r| r.label)
}

/// The family's configured spelling of a trim, compared after preparation.
fn configured_trim(ctx: &NormalizeContext, prepared: &str, prep: Prep) -> Option<&'static str> {
    family_config(ctx.family?)
        .trims
        .iter()
        .copied()
        .find(|t| prepare(t, prep) == prepared)
}

/// Find a package code: three digits followed by one letter, e.g. `302A`.
fn package_code(raw: &str) -> Option<String> {
    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .find(|tok| {
            let b = tok.as_bytes();
            b.len() == 4 && b[..3].iter().all(u8::is_ascii_digit) && b[3].is_ascii_alphabetic()
        })
        .map(|tok| tok.to_ascii_uppercase())
}

/// Normalize a raw attribute value for a dimension.
///
/// Pure and total: unmatched values pass through trimmed, empty input
/// yields an empty string.
pub fn normalize(dim: Dimension, raw: &str, ctx: &NormalizeContext) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if dim == Dimension::Package {
        return package_code(trimmed).unwrap_or_else(|| trimmed.to_string());
    }

    let Some((rules, prep)) = table(dim) else {
        return trimmed.to_string();
    };
    let prepared = prepare(trimmed, prep);
    if let Some(label) = first_match(rules, &prepared, ctx) {
        return label.to_string();
    }

    if dim == Dimension::Trim {
        if let Some(t) = configured_trim(ctx, &prepared, prep) {
            return t.to_string();
        }
    }

    trimmed.to_string()
}

/// Whether a raw value passes through without matching any rule.
///
/// Used by the audit report to surface vendor spellings that need a rule.
pub fn is_pass_through(dim: Dimension, raw: &str, ctx: &NormalizeContext) -> bool {
    let trimmed = raw.trim();
    let Some((rules, prep)) = table(dim) else {
        return false;
    };
    if trimmed.is_empty() {
        return false;
    }
    let prepared = prepare(trimmed, prep);
    if first_match(rules, &prepared, ctx).is_some() {
        return false;
    }
    !(dim == Dimension::Trim && configured_trim(ctx, &prepared, prep).is_some())
}

/// Every label a dimension's rule table can produce.
pub fn labels(dim: Dimension) -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    if let Some((rules, _)) = table(dim) {
        for r in rules {
            if !out.contains(&r.label) {
                out.push(r.label);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contexts() -> Vec<NormalizeContext> {
        let mut out = vec![NormalizeContext::none()];
        out.extend(Family::ALL.iter().map(|f| NormalizeContext::for_family(*f)));
        out
    }

    fn engine(raw: &str) -> String {
        normalize(Dimension::Engine, raw, &NormalizeContext::none())
    }

    #[test]
    fn test_empty_input() {
        for dim in Dimension::ALL {
            assert_eq!(normalize(dim, "", &NormalizeContext::none()), "");
            assert_eq!(normalize(dim, "   ", &NormalizeContext::none()), "");
        }
    }

    #[test]
    fn test_unmatched_passes_through_trimmed() {
        assert_eq!(engine("  Mystery Motor  "), "Mystery Motor");
        assert_eq!(
            normalize(Dimension::Color, "Peppermint Swirl", &NormalizeContext::none()),
            "Peppermint Swirl"
        );
        assert_eq!(
            normalize(Dimension::Model, "Edge", &NormalizeContext::none()),
            "Edge"
        );
    }

    #[test]
    fn test_power_stroke_regardless_of_hyphenation() {
        for raw in [
            "6.7L Power Stroke V8",
            "6.7L POWER STROKE V-8 DIESEL",
            "6.7L Power Stroke® V8 Turbo Diesel B20",
            "6.7-L V8",
            "6.7l",
            "Engine: 6.7L \u{2013} Power Stroke \u{2014} V8",
            "6.7L High-Output Power Stroke",
        ] {
            assert_eq!(engine(raw), "6.7L Power Stroke V8", "raw: {}", raw);
        }
        assert_eq!(
            engine("6.7L High Output Power Stroke V8"),
            "6.7L High Output Power Stroke V8"
        );
        assert_eq!(
            engine("6.7L HIGH OUTPUT POWER STROKE V-8"),
            "6.7L High Output Power Stroke V8"
        );
    }

    #[test]
    fn test_engine_order() {
        assert_eq!(engine("3.5L PowerBoost Full Hybrid V6"), "3.5L PowerBoost Hybrid V6");
        assert_eq!(engine("3.5L High-Output EcoBoost V6"), "3.5L High Output EcoBoost V6");
        assert_eq!(engine("3.5L V-6 EcoBoost"), "3.5L EcoBoost V6");
        assert_eq!(engine("3.5L PFDi V6 Flex-Fuel"), "3.5L PFDi V6");
        assert_eq!(engine("3.5L V6"), "3.5L V6");
        assert_eq!(engine("2.5L iVCT Atkinson Cycle I-4 Hybrid"), "2.5L Hybrid I4");
        assert_eq!(engine("Dual e-Motor"), "Dual eMotor");
    }

    #[test]
    fn test_gray_metallic_depends_on_platform() {
        let light = NormalizeContext::for_family(Family::F150);
        let heavy = NormalizeContext::for_family(Family::SuperDuty);
        let suv = NormalizeContext::for_family(Family::Explorer);
        assert_eq!(normalize(Dimension::Color, "Gray Metallic", &light), "Carbonized Gray");
        assert_eq!(normalize(Dimension::Color, "GRAY METALLIC", &heavy), "Stone Gray");
        assert_eq!(normalize(Dimension::Color, "Gray Metallic", &suv), "Gray Metallic");
    }

    #[test]
    fn test_drivetrain_by_platform() {
        let truck = NormalizeContext::for_family(Family::Ranger);
        let car = NormalizeContext::for_family(Family::Mustang);
        assert_eq!(normalize(Dimension::Drivetrain, "RWD", &truck), "4x2");
        assert_eq!(normalize(Dimension::Drivetrain, "4X2", &car), "RWD");
        assert_eq!(normalize(Dimension::Drivetrain, "4-Wheel Drive", &truck), "4x4");
        assert_eq!(normalize(Dimension::Drivetrain, "eAWD", &car), "AWD");
    }

    #[test]
    fn test_body_style_whitespace_insensitive() {
        let light = NormalizeContext::for_family(Family::F150);
        let heavy = NormalizeContext::for_family(Family::SuperDuty);
        assert_eq!(normalize(Dimension::BodyStyle, "Super Crew", &light), "SuperCrew");
        assert_eq!(normalize(Dimension::BodyStyle, "SuperCrew Cab", &heavy), "Crew Cab");
        assert_eq!(normalize(Dimension::BodyStyle, "Super-Cab", &light), "Super Cab");
        assert_eq!(normalize(Dimension::BodyStyle, "Regular Cab Chassis", &heavy), "Chassis Cab");
    }

    #[test]
    fn test_model_slugs() {
        let ctx = NormalizeContext::none();
        assert_eq!(normalize(Dimension::Model, "F-150", &ctx), "f150");
        assert_eq!(normalize(Dimension::Model, "F-150 Lightning", &ctx), "f150-lightning");
        assert_eq!(normalize(Dimension::Model, "MUSTANG MACH-E", &ctx), "mustang-mach-e");
        assert_eq!(normalize(Dimension::Model, "Bronco Sport", &ctx), "bronco-sport");
        assert_eq!(normalize(Dimension::Model, "F-450 Super Duty", &ctx), "super-duty");
        assert_eq!(normalize(Dimension::Model, "Super Duty F-250 SRW", &ctx), "super-duty");
    }

    #[test]
    fn test_trim_quirks() {
        let mach_e = NormalizeContext::for_family(Family::MustangMachE);
        let escape = NormalizeContext::for_family(Family::Escape);
        let transit = NormalizeContext::for_family(Family::Transit);
        let f150 = NormalizeContext::for_family(Family::F150);
        assert_eq!(normalize(Dimension::Trim, "PREMIUM EAWD", &mach_e), "Premium");
        assert_eq!(normalize(Dimension::Trim, "GT Performance", &mach_e), "GT");
        assert_eq!(normalize(Dimension::Trim, "Plug-In Hybrid", &escape), "PHEV");
        assert_eq!(normalize(Dimension::Trim, "T-250 Cargo High Roof", &transit), "Cargo Van");
        assert_eq!(normalize(Dimension::Trim, "KING RANCH", &f150), "King Ranch");
        assert_eq!(normalize(Dimension::Trim, "xl", &f150), "XL");
        assert_eq!(normalize(Dimension::Trim, "XLT", &f150), "XLT");
        assert_eq!(normalize(Dimension::Trim, "PREMIUM", &f150), "PREMIUM");
    }

    #[test]
    fn test_package_code() {
        let ctx = NormalizeContext::none();
        assert_eq!(normalize(Dimension::Package, "Equipment Group 302A", &ctx), "302A");
        assert_eq!(normalize(Dimension::Package, "302a High", &ctx), "302A");
        assert_eq!(normalize(Dimension::Package, "Mid", &ctx), "Mid");
    }

    #[test]
    fn test_idempotent_over_labels() {
        for dim in Dimension::ALL {
            for ctx in contexts() {
                for label in labels(dim) {
                    let once = normalize(dim, label, &ctx);
                    let twice = normalize(dim, &once, &ctx);
                    assert_eq!(once, twice, "{} '{}' in {:?}", dim, label, ctx.family);
                }
            }
        }
    }

    #[test]
    fn test_idempotent_over_raw_samples() {
        let samples: &[(Dimension, &str)] = &[
            (Dimension::Engine, "6.7L Power Stroke V-8 Diesel"),
            (Dimension::Engine, "3.5L V6 High Output EcoBoost"),
            (Dimension::Engine, "Some Unknown Engine"),
            (Dimension::Color, "Oxford White Clearcoat"),
            (Dimension::Color, "Gray Metallic"),
            (Dimension::Color, "Unlisted Teal"),
            (Dimension::Drivetrain, "4X2"),
            (Dimension::Drivetrain, "Rear Wheel Drive"),
            (Dimension::BodyStyle, "Super Crew"),
            (Dimension::BodyStyle, "Crew Cab Chassis"),
            (Dimension::Model, "F-350 Super Duty DRW"),
            (Dimension::Model, "E-Series Cutaway"),
            (Dimension::Trim, "PREMIUM RWD"),
            (Dimension::Trim, "lariat"),
            (Dimension::Package, "Equipment Group 501A Mid"),
            (Dimension::Fuel, "Gasoline"),
            (Dimension::Fuel, "Hybrid Electric"),
            (Dimension::Status, "In Transit"),
        ];
        for (dim, raw) in samples {
            for ctx in contexts() {
                let once = normalize(*dim, raw, &ctx);
                assert_eq!(normalize(*dim, &once, &ctx), once, "{} '{}'", dim, raw);
            }
        }
    }

    #[test]
    fn test_pass_through_detection() {
        let f150 = NormalizeContext::for_family(Family::F150);
        assert!(is_pass_through(Dimension::Color, "Peppermint Swirl", &f150));
        assert!(!is_pass_through(Dimension::Color, "Oxford White", &f150));
        assert!(!is_pass_through(Dimension::Trim, "lariat", &f150));
        assert!(!is_pass_through(Dimension::Year, "2025", &f150));
        assert!(!is_pass_through(Dimension::Color, "", &f150));
    }
}
