//! Amplifier profile types.
//!
//! A `.tapf` header is a flat run of f32 fields. A [`ProfileLayout`]
//! names those fields by position, and an [`AmplifierProfile`] is the
//! decoded name → value map handed to the amplifier DSP.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

// ── Built-in Layout ─────────────────────────────────────────

/// Field names of the tube-amp profile header, in file order.
///
/// Slot 0 is always reserved. Names starting with `_` are reserved too;
/// here they cover the signature and version words.
pub const TUBE_AMP_PROPS: [&str; 19] = [
    "_signature",
    "_version",
    "preamp_level",
    "preamp_bias",
    "preamp_Kreg",
    "preamp_Upor",
    "tonestack_low_freq",
    "tonestack_low_band",
    "tonestack_middle_freq",
    "tonestack_middle_band",
    "tonestack_high_freq",
    "tonestack_high_band",
    "amp_level",
    "amp_bias",
    "amp_Kreg",
    "amp_Upor",
    "sag_time",
    "sag_coeff",
    "output_level",
];

/// Size of one header or impulse-header field in bytes.
pub const FIELD_SIZE: usize = 4;

/// The impulse header must hold at least sample rate, channels and sample count.
pub const MIN_IMPULSE_SIZE: usize = 3 * FIELD_SIZE;

/// Largest impulse header a layout may declare.
pub const MAX_IMPULSE_SIZE: usize = 256 * FIELD_SIZE;

/// Key used for the profile's source label when serialized.
const SOURCE_KEY: &str = "source";

fn default_impulse_size() -> usize {
    MIN_IMPULSE_SIZE
}

/// Positional schema of a `.tapf` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileLayout {
    /// Header field names in file order (`ProfileProps`).
    pub props: Vec<String>,
    /// Header block size in bytes.
    pub profile_size: usize,
    /// Impulse header block size in bytes.
    #[serde(default = "default_impulse_size")]
    pub impulse_size: usize,
}

impl Default for ProfileLayout {
    fn default() -> Self {
        Self::tube_amp()
    }
}

impl ProfileLayout {
    /// Build a layout whose header size follows from the number of props.
    pub fn new<I, S>(props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let props: Vec<String> = props.into_iter().map(Into::into).collect();
        let profile_size = props.len() * FIELD_SIZE;
        ProfileLayout {
            props,
            profile_size,
            impulse_size: MIN_IMPULSE_SIZE,
        }
    }

    /// The layout used by the bundled tube-amp profiles.
    pub fn tube_amp() -> Self {
        Self::new(TUBE_AMP_PROPS)
    }

    /// Parse a layout from its JSON description and validate it.
    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        let layout: ProfileLayout =
            serde_json::from_str(json).map_err(|e| DecodeError::InvalidLayout(e.to_string()))?;
        layout.validate()?;
        Ok(layout)
    }

    /// Number of f32 fields the header block holds.
    pub fn header_fields(&self) -> usize {
        self.profile_size / FIELD_SIZE
    }

    /// Bytes before the first impulse sample.
    pub fn preamble_size(&self) -> usize {
        self.profile_size.saturating_add(self.impulse_size)
    }

    pub fn is_reserved(index: usize, name: &str) -> bool {
        index == 0 || name.starts_with('_')
    }

    /// Header slots that carry a named parameter, as `(index, name)`.
    pub fn mapped_props(&self) -> impl Iterator<Item = (usize, &str)> {
        self.props
            .iter()
            .enumerate()
            .filter(|(i, name)| !Self::is_reserved(*i, name))
            .map(|(i, name)| (i, name.as_str()))
    }

    /// Check the layout is self-consistent before reading any bytes with it.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.props.is_empty() {
            return Err(DecodeError::InvalidLayout("no props".to_string()));
        }
        if self.profile_size % FIELD_SIZE != 0 {
            return Err(DecodeError::InvalidLayout(format!(
                "profile size {} is not a multiple of {FIELD_SIZE}",
                self.profile_size
            )));
        }
        if self.props.len() != self.header_fields() {
            return Err(DecodeError::SchemaMismatch {
                props: self.props.len(),
                fields: self.header_fields(),
            });
        }
        if !(MIN_IMPULSE_SIZE..=MAX_IMPULSE_SIZE).contains(&self.impulse_size)
            || self.impulse_size % FIELD_SIZE != 0
        {
            return Err(DecodeError::InvalidLayout(format!(
                "impulse header size {} must be a multiple of {FIELD_SIZE} in {MIN_IMPULSE_SIZE}..={MAX_IMPULSE_SIZE}",
                self.impulse_size
            )));
        }
        if self.profile_size.checked_add(self.impulse_size).is_none() {
            return Err(DecodeError::InvalidLayout("header sizes overflow".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for (_, name) in self.mapped_props() {
            if name == SOURCE_KEY {
                return Err(DecodeError::InvalidLayout(format!("'{SOURCE_KEY}' is not a parameter name")));
            }
            if !seen.insert(name) {
                return Err(DecodeError::InvalidLayout(format!("duplicate prop '{name}'")));
            }
        }
        Ok(())
    }
}

// ── Amplifier Profile ───────────────────────────────────────

/// Receives decoded parameter values, e.g. the amplifier DSP node.
pub trait ParameterSink {
    /// Set `name` to `value`. Returns `false` when the sink has no such parameter.
    fn set_param(&mut self, name: &str, value: f32) -> bool;
}

impl ParameterSink for HashMap<String, f32> {
    fn set_param(&mut self, name: &str, value: f32) -> bool {
        self.insert(name.to_string(), value);
        true
    }
}

/// Named amplifier parameters decoded from a profile header.
///
/// Every value is finite; the decoder rejects NaN and infinities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmplifierProfile {
    /// Logical profile name the bytes were fetched under.
    pub source: String,
    #[serde(flatten)]
    params: BTreeMap<String, f32>,
}

impl AmplifierProfile {
    pub(crate) fn new(source: impl Into<String>, params: BTreeMap<String, f32>) -> Self {
        AmplifierProfile {
            source: source.into(),
            params,
        }
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.params.get(name).copied()
    }

    pub fn params(&self) -> &BTreeMap<String, f32> {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.params.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Push every parameter into `sink`, returning how many it accepted.
    pub fn apply_to<S: ParameterSink + ?Sized>(&self, sink: &mut S) -> usize {
        self.iter()
            .filter(|(name, value)| sink.set_param(name, *value))
            .count()
    }
}

// ── Catalog ─────────────────────────────────────────────────

/// Profiles shipped with the simulator, by logical source name.
pub const PROFILE_CATALOG: [&str; 11] = [
    "v1.0/American Clean",
    "v1.0/American Vintage",
    "v1.0/British Crunch",
    "v1.0/Modern Metal",
    "v1.2/Classic Hard",
    "v1.2/JCM800 (spice)",
    "v1.2/MarkII",
    "v1.2/TwinReverb (spice)",
    "supersonic_amp",
    "supersonic_amp_2",
    "toan_zoan",
];

pub const DEFAULT_PROFILE: &str = PROFILE_CATALOG[0];

pub const PROFILE_EXTENSION: &str = "tapf";

/// Relative file path of a profile, e.g. `v1.0/Modern Metal.tapf`.
pub fn profile_file_name(source: &str) -> String {
    format!("{source}.{PROFILE_EXTENSION}")
}

// ── Tests ───────────────────────────────────────────────────
