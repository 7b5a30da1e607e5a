//! Translation of a generic generation request into a model's input payload.
//!
//! Every model starts from its registry defaults with the common fields
//! overlaid (prompt, clamped duration, seed, negative prompt, image). The
//! remaining fields are applied by a per-model adapter looked up by id in
//! [`ADAPTERS`]; models without an entry use [`generic`].

use serde_json::{Map, Value};
use tracing::warn;
use videogen_mcp_common::error::Error;
use videogen_mcp_common::models::VideoModel;

/// A single generation request, one per prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Image URL for image-to-video models
    pub image: Option<String>,
    pub duration: Option<f64>,
    pub resolution: Option<String>,
    pub fps: Option<f64>,
    pub guidance_scale: Option<f64>,
    pub seed: Option<i64>,
    pub aspect_ratio: Option<String>,
    pub negative_prompt: Option<String>,
    pub enhance_prompt: Option<bool>,
    pub generate_audio: Option<bool>,
    pub camera_movement: Option<String>,
    pub motion_intensity: Option<f64>,
}

/// Provider input plus notes about request fields that were not applied.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptedInput {
    pub input: Map<String, Value>,
    pub notes: Vec<String>,
}

/// Check the image/mode pairing for a model.
///
/// # Errors
/// - `Error::MissingImageInput` if the model requires an image and none was given
/// - `Error::UnsupportedImageInput` if the model is text-to-video only
pub fn check_image_mode(model: &VideoModel, has_image: bool) -> Result<(), Error> {
    if model.mode.requires_image() && !has_image {
        return Err(Error::MissingImageInput(model.id.to_string()));
    }
    if !model.mode.accepts_image() && has_image {
        return Err(Error::UnsupportedImageInput(model.id.to_string()));
    }
    Ok(())
}

/// JSON number, emitted as an integer when the value is whole.
pub fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

/// Build the provider input for `request` on `model`.
///
/// # Errors
/// Returns the image/mode errors of [`check_image_mode`].
pub fn adapt(request: &GenerationRequest, model: &'static VideoModel) -> Result<AdaptedInput, Error> {
    check_image_mode(model, request.image.is_some())?;

    let mut overlay = Overlay::new(request, model);
    overlay.apply_common();
    (adapter_for(model.id))(&mut overlay);
    overlay.note_unapplied_resolution();

    Ok(AdaptedInput {
        input: overlay.input,
        notes: overlay.notes,
    })
}

/// Request being adapted for one model.
pub struct Overlay<'a> {
    request: &'a GenerationRequest,
    model: &'static VideoModel,
    input: Map<String, Value>,
    notes: Vec<String>,
    resolution_handled: bool,
}

impl<'a> Overlay<'a> {
    fn new(request: &'a GenerationRequest, model: &'static VideoModel) -> Self {
        Self {
            request,
            model,
            input: model.default_input(),
            notes: Vec::new(),
            resolution_handled: false,
        }
    }

    fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.input.insert(key.to_string(), value.into());
    }

    fn apply_common(&mut self) {
        let request = self.request;
        self.set("prompt", request.prompt.as_str());

        if let Some(duration) = request.duration {
            let clamped = duration.min(self.model.max_duration_seconds);
            if clamped < duration {
                self.notes.push(format!(
                    "Duration {}s exceeds the {}s limit of {}; clamped",
                    duration, self.model.max_duration_seconds, self.model.id
                ));
            }
            self.set("duration", number_value(clamped));
        }
        if let Some(seed) = request.seed {
            self.set("seed", seed);
        }
        if let Some(negative_prompt) = &request.negative_prompt {
            self.set("negative_prompt", negative_prompt.as_str());
        }
        if self.model.mode.accepts_image() {
            self.image();
        }
    }

    /// Pass `resolution` through when the model lists it.
    fn resolution(&mut self) {
        let Some(resolution) = self.request.resolution.as_deref() else {
            return;
        };
        self.resolution_handled = true;
        if self.model.supports_resolution(resolution) {
            self.set("resolution", resolution);
        } else {
            warn!(
                model = self.model.id,
                resolution,
                "Dropping unsupported resolution"
            );
            self.notes.push(format!(
                "Resolution {} is not supported by {} (supported: {}); model default used",
                resolution,
                self.model.id,
                self.model.resolutions.join(", ")
            ));
        }
    }

    fn fps(&mut self) {
        if let Some(fps) = self.request.fps {
            self.set("fps", number_value(fps));
        }
    }

    /// Guidance scale under the provider's field name.
    fn guidance(&mut self, key: &str) {
        if let Some(scale) = self.request.guidance_scale {
            self.set(key, number_value(scale));
        }
    }

    fn image(&mut self) {
        if let Some(image) = &self.request.image {
            self.set("image", image.as_str());
        }
    }

    fn note_unapplied_resolution(&mut self) {
        if self.resolution_handled {
            return;
        }
        if let Some(resolution) = self.request.resolution.as_deref() {
            warn!(model = self.model.id, resolution, "Resolution is not adjustable");
            self.notes.push(format!(
                "Resolution {} ignored: {} does not take a resolution parameter",
                resolution, self.model.id
            ));
        }
    }
}

/// One row of the per-model dispatch table.
pub struct ModelAdapter {
    pub models: &'static [&'static str],
    pub apply: fn(&mut Overlay<'_>),
}

/// Per-model field mappings. Adding a model is a new row here.
pub static ADAPTERS: &[ModelAdapter] = &[
    ModelAdapter {
        models: &["veo-3", "veo-3-fast"],
        apply: veo3,
    },
    ModelAdapter {
        models: &["veo-2"],
        apply: veo2,
    },
    ModelAdapter {
        models: &["hunyuan-video"],
        apply: hunyuan,
    },
    ModelAdapter {
        models: &["mochi-1"],
        apply: mochi,
    },
    ModelAdapter {
        models: &["ltx-video"],
        apply: ltx,
    },
    ModelAdapter {
        models: &["pyramid-flow"],
        apply: image_only,
    },
    ModelAdapter {
        models: &["seedance-pro", "seedance-lite"],
        apply: seedance,
    },
    ModelAdapter {
        models: &[
            "hailuo-2",
            "minimax-video",
            "ray-flash-2",
            "ray-2",
            "luma-ray",
            "pixverse-v4.5",
        ],
        apply: resolution_and_image,
    },
    ModelAdapter {
        models: &["minimax-director"],
        apply: minimax_director,
    },
    ModelAdapter {
        models: &["kling-v2.1-master", "kling-v1.6-pro"],
        apply: kling,
    },
    ModelAdapter {
        models: &["wan-t2v-720p", "wan-t2v-480p", "wan-i2v-720p", "wan-i2v-480p"],
        apply: wan,
    },
];

/// Adapter for a model id, falling back to [`generic`].
pub fn adapter_for(model_id: &str) -> fn(&mut Overlay<'_>) {
    ADAPTERS
        .iter()
        .find(|adapter| adapter.models.contains(&model_id))
        .map(|adapter| adapter.apply)
        .unwrap_or(generic)
}

fn veo3(o: &mut Overlay<'_>) {
    if let Some(aspect_ratio) = &o.request.aspect_ratio {
        o.set("aspect_ratio", aspect_ratio.as_str());
    }
    if let Some(enhance) = o.request.enhance_prompt {
        o.set("enhance_prompt", enhance);
    }
    if let Some(audio) = o.request.generate_audio {
        o.set("generate_audio", audio);
    }
}

fn veo2(o: &mut Overlay<'_>) {
    o.resolution();
    o.fps();
    o.guidance("guidance_scale");
}

fn hunyuan(o: &mut Overlay<'_>) {
    // Portrait for 720p, landscape for 1280p.
    match o.request.resolution.as_deref() {
        Some("720p") => {
            o.resolution_handled = true;
            o.set("video_size", "720x1280");
        }
        Some("1280p") => {
            o.resolution_handled = true;
            o.set("video_size", "1280x720");
        }
        _ => o.resolution(),
    }
    o.guidance("guidance_scale");
}

fn mochi(o: &mut Overlay<'_>) {
    o.guidance("guidance_scale");
    o.fps();
}

fn ltx(o: &mut Overlay<'_>) {
    o.fps();
}

fn image_only(o: &mut Overlay<'_>) {
    o.image();
}

fn seedance(o: &mut Overlay<'_>) {
    o.resolution();
    if let Some(image) = &o.request.image {
        o.set("mode", "image-to-video");
        o.set("image_url", image.as_str());
    }
}

fn resolution_and_image(o: &mut Overlay<'_>) {
    o.resolution();
    o.image();
}

fn minimax_director(o: &mut Overlay<'_>) {
    o.resolution();
    if let Some(movement) = &o.request.camera_movement {
        o.set("camera_movement", movement.as_str());
    }
    o.image();
}

fn kling(o: &mut Overlay<'_>) {
    o.resolution();
    if let Some(intensity) = o.request.motion_intensity {
        o.set("motion_intensity", number_value(intensity));
    }
    o.image();
}

fn wan(o: &mut Overlay<'_>) {
    o.fps();
    o.guidance("guide_scale");
    o.image();
}

/// Mapping for models without a dedicated adapter.
pub fn generic(o: &mut Overlay<'_>) {
    o.resolution();
    o.fps();
    o.guidance("guidance_scale");
    o.image();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use videogen_mcp_common::models::{ModelMode, ModelRegistry, VIDEO_MODELS};

    fn model(id: &str) -> &'static VideoModel {
        ModelRegistry::resolve(id).unwrap()
    }

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_then_prompt() {
        let adapted = adapt(&request("a red fox"), model("veo-3")).unwrap();
        assert_eq!(adapted.input["prompt"], json!("a red fox"));
        assert_eq!(adapted.input["duration"], json!(5));
        assert_eq!(adapted.input["person_generation"], json!("allow_all"));
        assert!(adapted.notes.is_empty());
    }

    #[test]
    fn test_duration_is_clamped() {
        let req = GenerationRequest {
            duration: Some(100.0),
            ..request("waves")
        };
        let adapted = adapt(&req, model("wan-t2v-480p")).unwrap();
        assert_eq!(adapted.input["duration"], json!(5));
        assert_eq!(adapted.notes.len(), 1);
    }

    #[test]
    fn test_fractional_max_duration_is_kept() {
        let req = GenerationRequest {
            duration: Some(8.0),
            ..request("waves")
        };
        let adapted = adapt(&req, model("mochi-1")).unwrap();
        assert_eq!(adapted.input["duration"], json!(5.4));
    }

    #[test]
    fn test_duration_below_max_is_unchanged() {
        let req = GenerationRequest {
            duration: Some(3.0),
            ..request("waves")
        };
        let adapted = adapt(&req, model("veo-2")).unwrap();
        assert_eq!(adapted.input["duration"], json!(3));
        assert!(adapted.notes.is_empty());
    }

    #[test]
    fn test_text_only_model_rejects_image() {
        let req = GenerationRequest {
            image: Some("https://example.com/cat.png".into()),
            ..request("cat")
        };
        let err = adapt(&req, model("veo-3")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedImageInput(ref id) if id == "veo-3"));
    }

    #[test]
    fn test_image_model_requires_image() {
        let err = adapt(&request("cat"), model("wan-i2v-720p")).unwrap_err();
        assert!(matches!(err, Error::MissingImageInput(ref id) if id == "wan-i2v-720p"));
    }

    #[test]
    fn test_wan_uses_guide_scale() {
        let req = GenerationRequest {
            guidance_scale: Some(6.5),
            fps: Some(16.0),
            image: Some("https://example.com/cat.png".into()),
            ..request("cat")
        };
        let adapted = adapt(&req, model("wan-i2v-480p")).unwrap();
        assert_eq!(adapted.input["guide_scale"], json!(6.5));
        assert_eq!(adapted.input["fps"], json!(16));
        assert_eq!(adapted.input["image"], json!("https://example.com/cat.png"));
        assert!(!adapted.input.contains_key("guidance_scale"));
    }

    #[test]
    fn test_hunyuan_maps_resolution_to_video_size() {
        let req = GenerationRequest {
            resolution: Some("1280p".into()),
            ..request("city")
        };
        let adapted = adapt(&req, model("hunyuan-video")).unwrap();
        assert_eq!(adapted.input["video_size"], json!("1280x720"));
        assert!(!adapted.input.contains_key("resolution"));
        assert!(adapted.notes.is_empty());
    }

    #[test]
    fn test_seedance_image_switches_mode() {
        let req = GenerationRequest {
            image: Some("https://example.com/cat.png".into()),
            resolution: Some("1080p".into()),
            ..request("cat")
        };
        let adapted = adapt(&req, model("seedance-pro")).unwrap();
        assert_eq!(adapted.input["mode"], json!("image-to-video"));
        assert_eq!(adapted.input["image_url"], json!("https://example.com/cat.png"));
        assert_eq!(adapted.input["resolution"], json!("1080p"));
    }

    #[test]
    fn test_seedance_without_image_keeps_default_mode() {
        let adapted = adapt(&request("cat"), model("seedance-lite")).unwrap();
        assert_eq!(adapted.input["mode"], json!("text-to-video"));
        assert!(!adapted.input.contains_key("image_url"));
    }

    #[test]
    fn test_unsupported_resolution_is_dropped_with_note() {
        let req = GenerationRequest {
            resolution: Some("4K".into()),
            ..request("cat")
        };
        let adapted = adapt(&req, model("kling-v1.6-pro")).unwrap();
        assert_eq!(adapted.input["resolution"], json!("1080p"));
        assert_eq!(adapted.notes.len(), 1);
        assert!(adapted.notes[0].contains("4K"));
    }

    #[test]
    fn test_resolution_on_model_without_resolution_field_is_noted() {
        let req = GenerationRequest {
            resolution: Some("1080p".into()),
            ..request("cat")
        };
        let adapted = adapt(&req, model("veo-3")).unwrap();
        assert!(!adapted.input.contains_key("resolution"));
        assert!(adapted.notes[0].contains("ignored"));
    }

    #[test]
    fn test_veo3_fields() {
        let req = GenerationRequest {
            aspect_ratio: Some("9:16".into()),
            generate_audio: Some(false),
            enhance_prompt: Some(false),
            ..request("cat")
        };
        let adapted = adapt(&req, model("veo-3-fast")).unwrap();
        assert_eq!(adapted.input["aspect_ratio"], json!("9:16"));
        assert_eq!(adapted.input["generate_audio"], json!(false));
        assert_eq!(adapted.input["enhance_prompt"], json!(false));
    }

    #[test]
    fn test_director_and_kling_fields() {
        let req = GenerationRequest {
            camera_movement: Some("dolly".into()),
            motion_intensity: Some(7.0),
            ..request("cat")
        };
        let director = adapt(&req, model("minimax-director")).unwrap();
        assert_eq!(director.input["camera_movement"], json!("dolly"));
        assert!(!director.input.contains_key("motion_intensity"));

        let kling = adapt(&req, model("kling-v2.1-master")).unwrap();
        assert_eq!(kling.input["motion_intensity"], json!(7));
        assert!(!kling.input.contains_key("camera_movement"));
    }

    #[test]
    fn test_seed_and_negative_prompt_are_common() {
        let req = GenerationRequest {
            seed: Some(42),
            negative_prompt: Some("blurry".into()),
            ..request("cat")
        };
        for m in VIDEO_MODELS.iter().filter(|m| m.mode != ModelMode::ImageToVideo) {
            let adapted = adapt(&req, m).unwrap();
            assert_eq!(adapted.input["seed"], json!(42), "{}", m.id);
            assert_eq!(adapted.input["negative_prompt"], json!("blurry"), "{}", m.id);
        }
    }

    #[test]
    fn test_every_registered_model_has_an_adapter() {
        for m in VIDEO_MODELS {
            assert!(
                ADAPTERS.iter().any(|a| a.models.contains(&m.id)),
                "no adapter row for {}",
                m.id
            );
        }
    }

    #[test]
    fn test_generic_adapter_passes_fields_through() {
        let req = GenerationRequest {
            resolution: Some("720p".into()),
            fps: Some(30.0),
            guidance_scale: Some(5.0),
            image: Some("https://example.com/a.png".into()),
            ..request("cat")
        };
        let adapted = adapt(&req, model("luma-ray")).unwrap();
        let mut overlay = Overlay::new(&req, model("luma-ray"));
        generic(&mut overlay);
        assert_eq!(overlay.input["resolution"], json!("720p"));
        assert_eq!(overlay.input["fps"], json!(30));
        assert_eq!(overlay.input["guidance_scale"], json!(5));
        assert_eq!(overlay.input["image"], adapted.input["image"]);
    }

    #[test]
    fn test_number_value_prefers_integers() {
        assert_eq!(number_value(5.0), json!(5));
        assert_eq!(number_value(5.5), json!(5.5));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use videogen_mcp_common::models::{ModelMode, VIDEO_MODELS};

    fn model_strategy() -> impl Strategy<Value = &'static VideoModel> {
        (0..VIDEO_MODELS.len()).prop_map(|i| &VIDEO_MODELS[i])
    }

    fn image_strategy() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            "[a-z]{1,10}".prop_map(|name| Some(format!("https://example.com/{}.png", name))),
        ]
    }

    proptest! {
        /// Text-to-video models reject images and image-to-video models require them.
        #[test]
        fn image_mode_rule_holds_for_every_model(
            model in model_strategy(),
            image in image_strategy(),
            prompt in "[a-zA-Z ]{1,40}"
        ) {
            let req = GenerationRequest { prompt, image: image.clone(), ..Default::default() };
            let result = adapt(&req, model);
            match (model.mode, image.is_some()) {
                (ModelMode::TextToVideo, true) => {
                    prop_assert!(matches!(result, Err(Error::UnsupportedImageInput(_))));
                }
                (ModelMode::ImageToVideo, false) => {
                    prop_assert!(matches!(result, Err(Error::MissingImageInput(_))));
                }
                _ => {
                    let adapted = result.unwrap();
                    prop_assert_eq!(adapted.input.contains_key("image"), image.is_some());
                }
            }
        }

        /// The payload duration never exceeds the model limit.
        #[test]
        fn duration_never_exceeds_model_limit(
            model in model_strategy(),
            duration in 0.5f64..1000.0
        ) {
            let image = model.mode.requires_image().then(|| "https://example.com/a.png".to_string());
            let req = GenerationRequest {
                prompt: "p".into(),
                image,
                duration: Some(duration),
                ..Default::default()
            };
            let adapted = adapt(&req, model).unwrap();
            let sent = adapted.input["duration"].as_f64().unwrap();
            prop_assert!(sent <= model.max_duration_seconds);
            prop_assert!(sent <= duration);
        }

        /// A requested resolution is either applied verbatim or reported in a note.
        #[test]
        fn resolution_is_applied_or_noted(
            model in model_strategy(),
            resolution in prop::sample::select(vec!["480p", "540p", "720p", "768p", "1080p", "1280p", "4K"])
        ) {
            let image = model.mode.requires_image().then(|| "https://example.com/a.png".to_string());
            let req = GenerationRequest {
                prompt: "p".into(),
                image,
                resolution: Some(resolution.to_string()),
                ..Default::default()
            };
            let adapted = adapt(&req, model).unwrap();
            let applied = adapted.input.get("resolution") == Some(&Value::from(resolution))
                || adapted.input.contains_key("video_size") && model.id == "hunyuan-video";
            prop_assert!(applied || !adapted.notes.is_empty());
        }
    }
}
