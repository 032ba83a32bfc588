//! Processing configuration derived from dataset metadata
//!
//! The engine consumes `config`; it is rebuilt from `metadata`, `molDBs`
//! and `adducts` on every mutation and never accepted from callers.

use serde_json::{json, Value};
use sm_common::Dataset;

/// Image generation settings are not user-tunable
const IMAGE_PPM: f64 = 3.0;
const IMAGE_NLEVELS: u32 = 30;
const IMAGE_Q: u32 = 99;

/// Resolving power is quoted by instruments at varying m/z; sigma is computed
/// at this reference m/z
const REFERENCE_MZ: f64 = 200.0;

/// FWHM = 2 * sqrt(2 * ln 2) * sigma
const FWHM_TO_SIGMA: f64 = 2.354_820_045;

const POSITIVE_ADDUCTS: [&str; 3] = ["+H", "+Na", "+K"];
const NEGATIVE_ADDUCTS: [&str; 2] = ["-H", "+Cl"];

pub trait ConfigDeriver: Send + Sync {
    /// Replace `dataset.config` with the configuration derived from its
    /// metadata, molecular databases and adducts
    fn derive(&self, dataset: &mut Dataset);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    fn from_metadata(metadata: &Value) -> Self {
        match metadata
            .pointer("/MS_Analysis/Polarity")
            .and_then(Value::as_str)
        {
            Some(p) if p.eq_ignore_ascii_case("negative") => Polarity::Negative,
            _ => Polarity::Positive,
        }
    }

    fn sign(self) -> &'static str {
        match self {
            Polarity::Positive => "+",
            Polarity::Negative => "-",
        }
    }

    fn default_adducts(self) -> Vec<String> {
        let adducts: &[&str] = match self {
            Polarity::Positive => &POSITIVE_ADDUCTS,
            Polarity::Negative => &NEGATIVE_ADDUCTS,
        };
        adducts.iter().map(|a| a.to_string()).collect()
    }
}

/// Resolving power scaled to the reference m/z for the given analyzer
fn resolving_power_at_reference(analyzer: &str, resolving_power: f64, mz: f64) -> f64 {
    let analyzer = analyzer.to_ascii_lowercase();
    if analyzer.contains("orbitrap") {
        resolving_power * (mz / REFERENCE_MZ).sqrt()
    } else if analyzer.contains("fticr") || analyzer.contains("ft-icr") {
        resolving_power * (mz / REFERENCE_MZ)
    } else {
        resolving_power
    }
}

/// Gaussian sigma of an isotope peak at the reference m/z, or `None` if the
/// metadata lacks the instrument description
fn isocalc_sigma(metadata: &Value) -> Option<f64> {
    let ms = metadata.get("MS_Analysis")?;
    let analyzer = ms.get("Analyzer").and_then(Value::as_str).unwrap_or_default();
    let rp = ms.pointer("/Detector_Resolving_Power/Resolving_Power")?.as_f64()?;
    let mz = ms.pointer("/Detector_Resolving_Power/mz")?.as_f64()?;
    if rp <= 0.0 || mz <= 0.0 {
        return None;
    }

    let rp_ref = resolving_power_at_reference(analyzer, rp, mz);
    let sigma = REFERENCE_MZ / rp_ref / FWHM_TO_SIGMA;
    Some((sigma * 1e6).round() / 1e6)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessingConfigDeriver;

impl ConfigDeriver for ProcessingConfigDeriver {
    fn derive(&self, dataset: &mut Dataset) {
        let polarity = Polarity::from_metadata(&dataset.metadata);

        let databases: Vec<Value> = dataset
            .mol_dbs
            .iter()
            .map(|name| json!({ "name": name }))
            .collect();

        let adducts = if dataset.adducts.is_empty() {
            polarity.default_adducts()
        } else {
            dataset.adducts.clone()
        };

        dataset.config = json!({
            "databases": databases,
            "isotope_generation": {
                "adducts": adducts,
                "charge": {
                    "polarity": polarity.sign(),
                    "n_charges": 1,
                },
                "isocalc_sigma": isocalc_sigma(&dataset.metadata),
            },
            "image_generation": {
                "ppm": IMAGE_PPM,
                "nlevels": IMAGE_NLEVELS,
                "q": IMAGE_Q,
            },
        });
    }
}
