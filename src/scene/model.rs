use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::scene::layer::{Layer, LayerDefaults};

/// Deserialize a field where `null` and absence mean different things.
///
/// Absent gives `None` (through `#[serde(default)]`), `null` gives `Some(None)`.
pub(crate) fn double_option<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

/// Transition request at a clip's trailing edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionSpec {
    /// Transition name, alias, `random` or `dummy`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Requested duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Easing name. `"linear"` disables the per-transition default easing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
    /// Named uniform values for the shader program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Map<String, serde_json::Value>>,
    /// `acrossfade` curve for the outgoing clip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_out_curve: Option<String>,
    /// `acrossfade` curve for the incoming clip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_in_curve: Option<String>,
}

impl TransitionSpec {
    /// Built-in global transition defaults.
    pub fn builtin() -> Self {
        Self {
            name: Some("random".to_owned()),
            duration: Some(0.5),
            easing: None,
            params: None,
            audio_out_curve: Some("tri".to_owned()),
            audio_in_curve: Some("tri".to_owned()),
        }
    }

    /// Shorthand for a named transition of `duration` seconds.
    pub fn named(name: impl Into<String>, duration: f64) -> Self {
        Self {
            name: Some(name.into()),
            duration: Some(duration),
            ..Self::default()
        }
    }

    /// Field-wise merge where fields set in `over` win.
    pub fn overlaid_with(&self, over: &TransitionSpec) -> TransitionSpec {
        TransitionSpec {
            name: over.name.clone().or_else(|| self.name.clone()),
            duration: over.duration.or(self.duration),
            easing: over.easing.clone().or_else(|| self.easing.clone()),
            params: over.params.clone().or_else(|| self.params.clone()),
            audio_out_curve: over
                .audio_out_curve
                .clone()
                .or_else(|| self.audio_out_curve.clone()),
            audio_in_curve: over
                .audio_in_curve
                .clone()
                .or_else(|| self.audio_in_curve.clone()),
        }
    }
}

/// User-level defaults applied to every clip and layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    /// Clip duration for clips that cannot infer one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Transition defaults. `null` disables transitions for clips without their own.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub transition: Option<Option<TransitionSpec>>,
    /// Defaults for every layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<LayerDefaults>,
    /// Defaults keyed by layer `type`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub layer_type: BTreeMap<String, LayerDefaults>,
}

impl Defaults {
    /// Effective global transition defaults, `None` when transitions are disabled.
    pub fn effective_transition(&self) -> Option<TransitionSpec> {
        match &self.transition {
            None => Some(TransitionSpec::builtin()),
            Some(None) => None,
            Some(Some(t)) => Some(TransitionSpec::builtin().overlaid_with(t)),
        }
    }
}

/// One clip of the timeline as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipDef {
    /// Layers, bottom first.
    pub layers: Vec<Layer>,
    /// Explicit duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Trailing transition. `null` means a hard cut.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub transition: Option<Option<TransitionSpec>>,
}

impl ClipDef {
    /// Clip holding `layers` with no explicit duration or transition.
    pub fn new(layers: Vec<Layer>) -> Self {
        Self {
            layers,
            duration: None,
            transition: None,
        }
    }

    /// Set the explicit duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration = Some(secs);
        self
    }

    /// Set the trailing transition; `None` forces a hard cut.
    pub fn with_transition(mut self, transition: Option<TransitionSpec>) -> Self {
        self.transition = Some(transition);
        self
    }
}

/// A track mixed on top of the concatenated clip audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    /// Source path or URL.
    pub path: String,
    /// Mix weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_volume: Option<f64>,
    /// Source in-point, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_from: Option<f64>,
    /// Source out-point, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_to: Option<f64>,
    /// Absolute offset in the output timeline, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    /// `-stream_loop` count; `-1` loops forever.
    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_count: Option<i32>,
}

impl AudioTrack {
    /// Track at `path` with every optional field unset.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mix_volume: None,
            cut_from: None,
            cut_to: None,
            start: None,
            loop_count: None,
        }
    }
}

/// `dynaudnorm` settings for the final mix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioNorm {
    /// Enable loudness normalization.
    #[serde(default)]
    pub enable: bool,
    /// Gaussian filter window size (`g`).
    #[serde(default = "AudioNorm::default_gauss_size")]
    pub gauss_size: u32,
    /// Maximum gain factor (`maxgain`).
    #[serde(default = "AudioNorm::default_max_gain")]
    pub max_gain: f64,
}

impl AudioNorm {
    fn default_gauss_size() -> u32 {
        5
    }

    fn default_max_gain() -> f64 {
        30.0
    }
}

impl Default for AudioNorm {
    fn default() -> Self {
        Self {
            enable: false,
            gauss_size: Self::default_gauss_size(),
            max_gain: Self::default_max_gain(),
        }
    }
}

/// Final output gain: a factor or an ffmpeg volume expression such as `"3dB"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputVolume {
    /// Linear factor.
    Factor(f64),
    /// Volume expression passed through to ffmpeg.
    Expr(String),
}

impl OutputVolume {
    /// Value for the `volume=` filter argument.
    pub fn filter_value(&self) -> String {
        match self {
            Self::Factor(v) => format!("{v}"),
            Self::Expr(s) => s.clone(),
        }
    }
}
