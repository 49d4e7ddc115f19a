pub mod dsp;
pub mod error;
pub mod profile;
pub mod switcher;
pub mod tapf;

#[cfg(feature = "wav")]
pub mod cabinet;
#[cfg(feature = "catalog")]
pub mod catalog;

pub use crate::error::DecodeError;
pub use crate::profile::{AmplifierProfile, ProfileLayout};
pub use crate::tapf::{ProfileDecoder, decode};

use crate::dsp::ResampledImpulse;
use crate::error::RateKind;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Both decoder outputs, in the shape the web host consumes.
#[derive(Debug, Serialize)]
pub struct DecodedProfile {
    pub profile: AmplifierProfile,
    pub impulse: ResampledImpulse,
}

/// Decode with an optional JSON layout; rates arrive as JS numbers.
pub fn decode_for_host(
    bytes: &[u8],
    source: &str,
    target_sample_rate: f64,
    layout_json: Option<&str>,
) -> Result<DecodedProfile, DecodeError> {
    let rate = tapf::check_sample_rate(target_sample_rate, RateKind::Target)?;
    let decoder = match layout_json {
        Some(json) => ProfileDecoder::new(ProfileLayout::from_json(json)?),
        None => ProfileDecoder::default(),
    };
    let (profile, impulse) = decoder.decode(bytes, source, rate)?;
    Ok(DecodedProfile { profile, impulse })
}

/// Convert to a JS value with maps as plain objects, so `profile.drive` works.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: return the tubeamp-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: decode a `.tapf` buffer into `{ profile, impulse }`.
/// `impulse.samples` is resampled to `targetSampleRate` for the convolver.
#[wasm_bindgen]
pub fn decode_profile(
    bytes: &[u8],
    source: &str,
    target_sample_rate: f64,
    layout_json: Option<String>,
) -> Result<JsValue, JsValue> {
    let decoded = decode_for_host(bytes, source, target_sample_rate, layout_json.as_deref())
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    to_js(&decoded)
}

/// WASM-exposed: the bundled profile names, default first.
#[wasm_bindgen]
pub fn profile_catalog() -> Result<JsValue, JsValue> {
    to_js(&profile::PROFILE_CATALOG)
}

/// WASM-exposed: the built-in layout as JSON, a template for custom ones.
#[wasm_bindgen]
pub fn default_layout() -> Result<String, JsValue> {
    serde_json::to_string(&ProfileLayout::tube_amp()).map_err(|e| JsValue::from_str(&format!("{e}")))
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use js_sys::{Array, Reflect};
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::wasm_bindgen_test;

    fn tiny_profile() -> Vec<u8> {
        let layout = ProfileLayout::new(["_", "drive"]);
        let impulse = dsp::ImpulseResponse::new(vec![0.5, 0.25], 48000);
        tapf::encode(&layout, &[0.0, 0.7], &impulse).unwrap()
    }

    #[wasm_bindgen_test]
    fn profile_is_a_plain_object() {
        let layout = r#"{ "props": ["_", "drive"], "profileSize": 8 }"#.to_string();
        let decoded = decode_profile(&tiny_profile(), "tiny", 48000.0, Some(layout)).unwrap();

        let profile = Reflect::get(&decoded, &"profile".into()).unwrap();
        assert!(!profile.is_instance_of::<js_sys::Map>());
        let drive = Reflect::get(&profile, &"drive".into()).unwrap();
        assert!((drive.as_f64().unwrap() - 0.7).abs() < 1e-6);
        let source = Reflect::get(&profile, &"source".into()).unwrap();
        assert_eq!(source.as_string().as_deref(), Some("tiny"));

        let impulse = Reflect::get(&decoded, &"impulse".into()).unwrap();
        let rate = Reflect::get(&impulse, &"sampleRate".into()).unwrap();
        assert_eq!(rate.as_f64(), Some(48000.0));
    }

    #[wasm_bindgen_test]
    fn catalog_is_an_array_of_names() {
        let catalog = Array::from(&profile_catalog().unwrap());
        assert_eq!(catalog.length() as usize, profile::PROFILE_CATALOG.len());
        assert_eq!(catalog.get(0).as_string().as_deref(), Some(profile::DEFAULT_PROFILE));
    }
}
