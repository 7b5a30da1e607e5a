//! Video model registry.
//!
//! Static capability descriptors for every video model the server can drive,
//! keyed by a short id and carrying the provider version string sent on
//! submission. Descriptors are immutable and shared for the process lifetime.

use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::Value;

/// Which inputs a model accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelMode {
    /// Prompt only; image input is rejected
    TextToVideo,
    /// Image required
    ImageToVideo,
    /// Image optional
    Both,
}

impl ModelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelMode::TextToVideo => "text-to-video",
            ModelMode::ImageToVideo => "image-to-video",
            ModelMode::Both => "both",
        }
    }

    /// Whether an image may be passed to the model.
    pub fn accepts_image(&self) -> bool {
        !matches!(self, ModelMode::TextToVideo)
    }

    /// Whether an image must be passed to the model.
    pub fn requires_image(&self) -> bool {
        matches!(self, ModelMode::ImageToVideo)
    }

    /// Human readable capability label.
    pub fn label(&self) -> &'static str {
        match self {
            ModelMode::TextToVideo => "Text-to-Video",
            ModelMode::ImageToVideo => "Image-to-Video",
            ModelMode::Both => "Text-to-Video & Image-to-Video",
        }
    }

    /// Parse a mode from its kebab-case name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text-to-video" => Some(ModelMode::TextToVideo),
            "image-to-video" => Some(ModelMode::ImageToVideo),
            "both" => Some(ModelMode::Both),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A default provider parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultParam {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(&'static str),
}

impl DefaultParam {
    pub fn to_value(&self) -> Value {
        match *self {
            DefaultParam::Int(v) => Value::from(v),
            DefaultParam::Float(v) => Value::from(v),
            DefaultParam::Bool(v) => Value::from(v),
            DefaultParam::Str(v) => Value::from(v),
        }
    }
}

/// Video model capability descriptor.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VideoModel {
    /// Short model identifier used by callers
    pub id: &'static str,
    /// Provider model version sent with each prediction
    pub version: &'static str,
    /// Accepted inputs
    #[serde(rename = "type")]
    pub mode: ModelMode,
    /// Longest clip the model can produce
    pub max_duration_seconds: f64,
    /// Resolutions the provider accepts for this model
    pub resolutions: &'static [&'static str],
    /// Whether the model generates an audio track
    pub supports_audio: bool,
    /// Provider parameters sent unless the request overrides them
    #[serde(serialize_with = "serialize_default_params")]
    pub default_params: &'static [(&'static str, DefaultParam)],
}

impl VideoModel {
    /// Organisation part of the version (`google` for `google/veo-3`).
    pub fn company(&self) -> &'static str {
        self.version.split('/').next().unwrap_or(self.version)
    }

    pub fn supports_resolution(&self, resolution: &str) -> bool {
        self.resolutions.contains(&resolution)
    }

    pub fn default_param(&self, name: &str) -> Option<DefaultParam> {
        self.default_params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    /// Default parameters as a JSON object.
    pub fn default_input(&self) -> serde_json::Map<String, Value> {
        self.default_params
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_value()))
            .collect()
    }
}

fn serialize_default_params<S>(
    params: &&'static [(&'static str, DefaultParam)],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(params.len()))?;
    for (key, value) in params.iter() {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

// =============================================================================
// Google Veo
// =============================================================================

/// Veo 3 with native audio
pub const VEO_3: VideoModel = VideoModel {
    id: "veo-3",
    version: "google/veo-3",
    mode: ModelMode::TextToVideo,
    max_duration_seconds: 30.0,
    resolutions: &["720p", "1080p", "4K"],
    supports_audio: true,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("aspect_ratio", DefaultParam::Str("16:9")),
        ("enhance_prompt", DefaultParam::Bool(true)),
        ("generate_audio", DefaultParam::Bool(true)),
        ("person_generation", DefaultParam::Str("allow_all")),
    ],
};

/// Veo 3 fast variant
pub const VEO_3_FAST: VideoModel = VideoModel {
    id: "veo-3-fast",
    version: "google/veo-3-fast",
    mode: ModelMode::TextToVideo,
    max_duration_seconds: 30.0,
    resolutions: &["720p", "1080p", "4K"],
    supports_audio: true,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("aspect_ratio", DefaultParam::Str("16:9")),
        ("enhance_prompt", DefaultParam::Bool(true)),
        ("generate_audio", DefaultParam::Bool(true)),
        ("person_generation", DefaultParam::Str("allow_all")),
    ],
};

pub const VEO_2: VideoModel = VideoModel {
    id: "veo-2",
    version: "google/veo-2",
    mode: ModelMode::TextToVideo,
    max_duration_seconds: 30.0,
    resolutions: &["720p", "1080p", "4K"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("resolution", DefaultParam::Str("720p")),
        ("fps", DefaultParam::Int(24)),
        ("guidance_scale", DefaultParam::Float(7.5)),
        ("num_inference_steps", DefaultParam::Int(50)),
    ],
};

// =============================================================================
// Open-weight text-to-video
// =============================================================================

/// HunyuanVideo; resolution is expressed as `video_size`
pub const HUNYUAN_VIDEO: VideoModel = VideoModel {
    id: "hunyuan-video",
    version: "tencent/hunyuan-video",
    mode: ModelMode::TextToVideo,
    max_duration_seconds: 10.0,
    resolutions: &["720p", "1280p"],
    supports_audio: false,
    default_params: &[
        ("video_size", DefaultParam::Str("720x1280")),
        ("video_length", DefaultParam::Int(129)),
        ("inference_steps", DefaultParam::Int(50)),
        ("guidance_scale", DefaultParam::Int(6)),
        ("flow_reverse", DefaultParam::Bool(false)),
        ("cpu_offload", DefaultParam::Bool(true)),
    ],
};

pub const MOCHI_1: VideoModel = VideoModel {
    id: "mochi-1",
    version: "genmoai/mochi-1",
    mode: ModelMode::TextToVideo,
    max_duration_seconds: 5.4,
    resolutions: &["480p"],
    supports_audio: false,
    default_params: &[
        ("num_frames", DefaultParam::Int(31)),
        ("height", DefaultParam::Int(480)),
        ("width", DefaultParam::Int(848)),
        ("num_inference_steps", DefaultParam::Int(64)),
        ("guidance_scale", DefaultParam::Float(4.5)),
        ("fps", DefaultParam::Int(30)),
    ],
};

pub const LTX_VIDEO: VideoModel = VideoModel {
    id: "ltx-video",
    version: "lightricks/ltx-video",
    mode: ModelMode::TextToVideo,
    max_duration_seconds: 10.0,
    resolutions: &["768p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("fps", DefaultParam::Int(24)),
        ("resolution", DefaultParam::Str("768x512")),
    ],
};

pub const PYRAMID_FLOW: VideoModel = VideoModel {
    id: "pyramid-flow",
    version: "zsxkib/pyramid-flow",
    mode: ModelMode::Both,
    max_duration_seconds: 10.0,
    resolutions: &["768p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("resolution", DefaultParam::Str("768p")),
        ("flow_steps", DefaultParam::Int(50)),
    ],
};

// =============================================================================
// ByteDance Seedance
// =============================================================================

/// Seedance 1 Pro; image input switches `mode` and uses `image_url`
pub const SEEDANCE_PRO: VideoModel = VideoModel {
    id: "seedance-pro",
    version: "bytedance/seedance-1-pro",
    mode: ModelMode::Both,
    max_duration_seconds: 10.0,
    resolutions: &["480p", "720p", "1080p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("resolution", DefaultParam::Str("480p")),
        ("mode", DefaultParam::Str("text-to-video")),
    ],
};

pub const SEEDANCE_LITE: VideoModel = VideoModel {
    id: "seedance-lite",
    version: "bytedance/seedance-1-lite",
    mode: ModelMode::Both,
    max_duration_seconds: 10.0,
    resolutions: &["480p", "720p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("resolution", DefaultParam::Str("480p")),
        ("mode", DefaultParam::Str("text-to-video")),
    ],
};

// =============================================================================
// MiniMax
// =============================================================================

pub const HAILUO_2: VideoModel = VideoModel {
    id: "hailuo-2",
    version: "minimax/hailuo-02",
    mode: ModelMode::Both,
    max_duration_seconds: 10.0,
    resolutions: &["720p", "1080p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(6)),
        ("resolution", DefaultParam::Str("720p")),
    ],
};

pub const MINIMAX_VIDEO: VideoModel = VideoModel {
    id: "minimax-video",
    version: "minimax/video-01",
    mode: ModelMode::TextToVideo,
    max_duration_seconds: 6.0,
    resolutions: &["720p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(6)),
        ("resolution", DefaultParam::Str("720p")),
        ("fps", DefaultParam::Int(25)),
    ],
};

/// Director variant with camera movement control
pub const MINIMAX_DIRECTOR: VideoModel = VideoModel {
    id: "minimax-director",
    version: "minimax/video-01-director",
    mode: ModelMode::Both,
    max_duration_seconds: 10.0,
    resolutions: &["720p", "1080p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(6)),
        ("resolution", DefaultParam::Str("720p")),
        ("camera_movement", DefaultParam::Str("static")),
    ],
};

// =============================================================================
// Kuaishou Kling
// =============================================================================

pub const KLING_V2_1_MASTER: VideoModel = VideoModel {
    id: "kling-v2.1-master",
    version: "kwaivgi/kling-v2.1-master",
    mode: ModelMode::Both,
    max_duration_seconds: 10.0,
    resolutions: &["720p", "1080p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("resolution", DefaultParam::Str("720p")),
        ("motion_intensity", DefaultParam::Int(5)),
    ],
};

pub const KLING_V1_6_PRO: VideoModel = VideoModel {
    id: "kling-v1.6-pro",
    version: "kwaivgi/kling-v1.6-pro",
    mode: ModelMode::Both,
    max_duration_seconds: 10.0,
    resolutions: &["1080p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("resolution", DefaultParam::Str("1080p")),
    ],
};

// =============================================================================
// Luma Ray
// =============================================================================

pub const RAY_FLASH_2: VideoModel = VideoModel {
    id: "ray-flash-2",
    version: "luma/ray-flash-2-720p",
    mode: ModelMode::Both,
    max_duration_seconds: 10.0,
    resolutions: &["720p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("resolution", DefaultParam::Str("720p")),
    ],
};

pub const RAY_2: VideoModel = VideoModel {
    id: "ray-2",
    version: "luma/ray-2-720p",
    mode: ModelMode::Both,
    max_duration_seconds: 10.0,
    resolutions: &["720p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("resolution", DefaultParam::Str("720p")),
    ],
};

pub const LUMA_RAY: VideoModel = VideoModel {
    id: "luma-ray",
    version: "luma/ray",
    mode: ModelMode::Both,
    max_duration_seconds: 10.0,
    resolutions: &["720p", "1080p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("resolution", DefaultParam::Str("720p")),
    ],
};

// =============================================================================
// Alibaba Wan 2.1
// =============================================================================

/// Wan uses `guide_scale` rather than `guidance_scale`
pub const WAN_T2V_720P: VideoModel = VideoModel {
    id: "wan-t2v-720p",
    version: "wavespeedai/wan-2.1-t2v-720p",
    mode: ModelMode::TextToVideo,
    max_duration_seconds: 5.0,
    resolutions: &["720p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("resolution", DefaultParam::Str("720p")),
        ("fps", DefaultParam::Int(25)),
        ("guide_scale", DefaultParam::Int(4)),
        ("steps", DefaultParam::Int(50)),
    ],
};

pub const WAN_I2V_720P: VideoModel = VideoModel {
    id: "wan-i2v-720p",
    version: "wavespeedai/wan-2.1-i2v-720p",
    mode: ModelMode::ImageToVideo,
    max_duration_seconds: 5.0,
    resolutions: &["720p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("resolution", DefaultParam::Str("720p")),
        ("fps", DefaultParam::Int(25)),
        ("guide_scale", DefaultParam::Int(4)),
        ("steps", DefaultParam::Int(50)),
    ],
};

pub const WAN_T2V_480P: VideoModel = VideoModel {
    id: "wan-t2v-480p",
    version: "wavespeedai/wan-2.1-t2v-480p",
    mode: ModelMode::TextToVideo,
    max_duration_seconds: 5.0,
    resolutions: &["480p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("resolution", DefaultParam::Str("480p")),
        ("fps", DefaultParam::Int(25)),
        ("guide_scale", DefaultParam::Int(4)),
        ("steps", DefaultParam::Int(50)),
    ],
};

pub const WAN_I2V_480P: VideoModel = VideoModel {
    id: "wan-i2v-480p",
    version: "wavespeedai/wan-2.1-i2v-480p",
    mode: ModelMode::ImageToVideo,
    max_duration_seconds: 5.0,
    resolutions: &["480p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("resolution", DefaultParam::Str("480p")),
        ("fps", DefaultParam::Int(25)),
        ("guide_scale", DefaultParam::Int(4)),
        ("steps", DefaultParam::Int(50)),
    ],
};

// =============================================================================
// PixVerse
// =============================================================================

pub const PIXVERSE_V4_5: VideoModel = VideoModel {
    id: "pixverse-v4.5",
    version: "pixverse/pixverse-v4.5",
    mode: ModelMode::Both,
    max_duration_seconds: 8.0,
    resolutions: &["540p", "720p", "1080p"],
    supports_audio: false,
    default_params: &[
        ("duration", DefaultParam::Int(5)),
        ("resolution", DefaultParam::Str("720p")),
    ],
};

/// All registered video models.
pub const VIDEO_MODELS: &[VideoModel] = &[
    VEO_3,
    VEO_3_FAST,
    VEO_2,
    HUNYUAN_VIDEO,
    MOCHI_1,
    LTX_VIDEO,
    PYRAMID_FLOW,
    SEEDANCE_PRO,
    SEEDANCE_LITE,
    HAILUO_2,
    MINIMAX_VIDEO,
    MINIMAX_DIRECTOR,
    KLING_V2_1_MASTER,
    KLING_V1_6_PRO,
    RAY_FLASH_2,
    RAY_2,
    LUMA_RAY,
    WAN_T2V_720P,
    WAN_I2V_720P,
    WAN_T2V_480P,
    WAN_I2V_480P,
    PIXVERSE_V4_5,
];

// =============================================================================
// Model Registry
// =============================================================================

/// Lookup over [`VIDEO_MODELS`].
pub struct ModelRegistry;

impl ModelRegistry {
    /// Resolve a model by short id or by provider version.
    pub fn resolve(name: &str) -> Option<&'static VideoModel> {
        VIDEO_MODELS
            .iter()
            .find(|model| model.id == name || model.version == name)
    }

    pub fn list_models() -> &'static [VideoModel] {
        VIDEO_MODELS
    }

    /// Every model id, in registry order.
    pub fn model_ids() -> Vec<&'static str> {
        VIDEO_MODELS.iter().map(|model| model.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_all_models() {
        assert_eq!(ModelRegistry::list_models().len(), 22);
    }

    #[test]
    fn test_model_ids_are_unique() {
        let mut ids = ModelRegistry::model_ids();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), VIDEO_MODELS.len());
    }

    #[test]
    fn test_resolve_by_id() {
        let model = ModelRegistry::resolve("veo-3").unwrap();
        assert_eq!(model.version, "google/veo-3");
        assert_eq!(model.mode, ModelMode::TextToVideo);
        assert!(model.supports_audio);
    }

    #[test]
    fn test_resolve_by_version() {
        let model = ModelRegistry::resolve("minimax/hailuo-02").unwrap();
        assert_eq!(model.id, "hailuo-2");
    }

    #[test]
    fn test_resolve_unknown() {
        assert!(ModelRegistry::resolve("gen4-turbo").is_none());
        assert!(ModelRegistry::resolve("").is_none());
    }

    #[test]
    fn test_wan_image_models_require_image() {
        for id in ["wan-i2v-720p", "wan-i2v-480p"] {
            let model = ModelRegistry::resolve(id).unwrap();
            assert!(model.mode.requires_image());
            assert_eq!(model.default_param("guide_scale"), Some(DefaultParam::Int(4)));
        }
    }

    #[test]
    fn test_mochi_has_fractional_max_duration() {
        let model = ModelRegistry::resolve("mochi-1").unwrap();
        assert!((model.max_duration_seconds - 5.4).abs() < f64::EPSILON);
        assert_eq!(model.default_param("duration"), None);
    }

    #[test]
    fn test_company_is_version_prefix() {
        assert_eq!(ModelRegistry::resolve("kling-v1.6-pro").unwrap().company(), "kwaivgi");
        assert_eq!(ModelRegistry::resolve("ray-2").unwrap().company(), "luma");
    }

    #[test]
    fn test_default_input_keeps_types() {
        let input = ModelRegistry::resolve("veo-2").unwrap().default_input();
        assert_eq!(input["fps"], serde_json::json!(24));
        assert_eq!(input["guidance_scale"], serde_json::json!(7.5));
        assert_eq!(input["resolution"], serde_json::json!("720p"));
    }

    #[test]
    fn test_model_serializes_defaults_as_object() {
        let json = serde_json::to_value(ModelRegistry::resolve("seedance-lite").unwrap()).unwrap();
        assert_eq!(json["type"], "both");
        assert_eq!(json["default_params"]["mode"], "text-to-video");
        assert_eq!(json["resolutions"], serde_json::json!(["480p", "720p"]));
    }

    #[test]
    fn test_mode_parse_round_trips_labels() {
        for mode in [ModelMode::TextToVideo, ModelMode::ImageToVideo, ModelMode::Both] {
            assert_eq!(ModelMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(ModelMode::parse("audio"), None);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn model_strategy() -> impl Strategy<Value = &'static VideoModel> {
        (0..VIDEO_MODELS.len()).prop_map(|i| &VIDEO_MODELS[i])
    }

    proptest! {
        /// Every model resolves to itself by id and by version.
        #[test]
        fn resolve_is_consistent(model in model_strategy()) {
            prop_assert_eq!(ModelRegistry::resolve(model.id).map(|m| m.id), Some(model.id));
            prop_assert_eq!(ModelRegistry::resolve(model.version).map(|m| m.id), Some(model.id));
        }

        /// Descriptors are internally consistent.
        #[test]
        fn descriptors_are_well_formed(model in model_strategy()) {
            prop_assert!(model.max_duration_seconds > 0.0);
            prop_assert!(!model.resolutions.is_empty());
            prop_assert!(model.version.contains('/'));
            if let Some(DefaultParam::Int(duration)) = model.default_param("duration") {
                prop_assert!(duration as f64 <= model.max_duration_seconds);
            }
        }

        /// Unregistered names never resolve.
        #[test]
        fn unknown_names_do_not_resolve(name in "[a-z]{3,12}-unknown") {
            prop_assert!(ModelRegistry::resolve(&name).is_none());
        }
    }
}
