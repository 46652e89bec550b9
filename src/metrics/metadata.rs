//! Generation metadata extracted from a workflow prompt
//!
//! A prompt is a JSON object mapping node ids to `{class_type, inputs}`.
//! Nodes are visited in document order.

use crate::constants::metrics::NOT_AVAILABLE;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

/// Model and sampler settings that produced an image
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationMetadata {
    pub model: String,
    pub seed: String,
    pub steps: String,
    pub cfg: String,
    pub sampler: String,
    pub scheduler: String,
}

impl Default for GenerationMetadata {
    fn default() -> Self {
        Self {
            model: NOT_AVAILABLE.to_string(),
            seed: NOT_AVAILABLE.to_string(),
            steps: NOT_AVAILABLE.to_string(),
            cfg: NOT_AVAILABLE.to_string(),
            sampler: NOT_AVAILABLE.to_string(),
            scheduler: NOT_AVAILABLE.to_string(),
        }
    }
}

impl GenerationMetadata {
    /// Extract everything available from `prompt`; anything missing stays `N/A`
    pub fn from_prompt(prompt: &Value) -> Self {
        let mut metadata = Self::default();
        let Some(nodes) = prompt.as_object() else {
            return metadata;
        };

        if let Some(model) = extract_model_name(nodes) {
            metadata.model = model;
        }
        metadata.apply_sampler_inputs(nodes);
        metadata
    }

    fn apply_sampler_inputs(&mut self, nodes: &Map<String, Value>) {
        for (class_type, inputs) in node_entries(nodes) {
            if class_type == "KSampler" {
                self.seed = input_or_na(inputs, "seed");
                self.steps = input_or_na(inputs, "steps");
                self.cfg = input_or_na(inputs, "cfg");
                self.sampler = input_or_na(inputs, "sampler_name");
                self.scheduler = input_or_na(inputs, "scheduler");
                return;
            }

            // Distributed sampler setups spread the settings across nodes
            if let Some(seed) = inputs.get("seed").or_else(|| inputs.get("noise_seed")) {
                self.seed = display_value(seed);
            }
            if let Some(steps) = inputs.get("steps") {
                self.steps = display_value(steps);
            }
            if let Some(cfg) = inputs.get("cfg") {
                self.cfg = display_value(cfg);
            }
            if let Some(sampler) = inputs.get("sampler_name") {
                self.sampler = display_value(sampler);
            }
            if let Some(scheduler) = inputs.get("scheduler") {
                self.scheduler = display_value(scheduler);
            }
        }
    }

    /// `Model:`, `Seed: | Steps: | CFG:` and `Sampler: | Scheduler:` lines
    pub fn display_lines(&self) -> Vec<String> {
        vec![
            format!("Model: {}", self.model),
            format!(
                "Seed: {} | Steps: {} | CFG: {}",
                self.seed, self.steps, self.cfg
            ),
            format!("Sampler: {} | Scheduler: {}", self.sampler, self.scheduler),
        ]
    }
}

fn node_entries(nodes: &Map<String, Value>) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
    static EMPTY: Lazy<Map<String, Value>> = Lazy::new(Map::new);

    nodes.values().filter_map(|node| {
        let node = node.as_object()?;
        let class_type = node.get("class_type").and_then(Value::as_str).unwrap_or("");
        let inputs = node
            .get("inputs")
            .and_then(Value::as_object)
            .unwrap_or(&*EMPTY);
        Some((class_type, inputs))
    })
}

fn extract_model_name(nodes: &Map<String, Value>) -> Option<String> {
    for (class_type, inputs) in node_entries(nodes) {
        let ckpt = inputs.get("ckpt_name").map(display_value);
        let unet = inputs.get("unet_name").map(|v| format!("{} (UNET)", display_value(v)));

        if class_type.contains("CheckpointLoader") && ckpt.is_some() {
            return ckpt;
        }
        if class_type.contains("UNETLoader") && unet.is_some() {
            return unet;
        }
        if class_type.contains("Loader") {
            if ckpt.is_some() {
                return ckpt;
            }
            if unet.is_some() {
                return unet;
            }
            if let Some(model) = inputs.get("model_name") {
                return Some(display_value(model));
            }
        }
    }
    None
}

fn input_or_na(inputs: &Map<String, Value>, key: &str) -> String {
    inputs
        .get(key)
        .map(display_value)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Strings print bare, everything else as compact JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ksampler_supplies_everything() {
        let prompt = json!({
            "4": {"class_type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "sdxl_base.safetensors"}},
            "3": {"class_type": "KSampler", "inputs": {
                "seed": 42, "steps": 30, "cfg": 7.5,
                "sampler_name": "euler", "scheduler": "karras"
            }}
        });
        let metadata = GenerationMetadata::from_prompt(&prompt);
        assert_eq!(metadata.model, "sdxl_base.safetensors");
        assert_eq!(
            metadata.display_lines(),
            vec![
                "Model: sdxl_base.safetensors".to_string(),
                "Seed: 42 | Steps: 30 | CFG: 7.5".to_string(),
                "Sampler: euler | Scheduler: karras".to_string(),
            ]
        );
    }

    #[test]
    fn test_ksampler_missing_inputs_are_na() {
        let prompt = json!({"1": {"class_type": "KSampler", "inputs": {"seed": 7}}});
        let metadata = GenerationMetadata::from_prompt(&prompt);
        assert_eq!(metadata.seed, "7");
        assert_eq!(metadata.steps, "N/A");
        assert_eq!(metadata.model, "N/A");
    }

    #[test]
    fn test_distributed_sampler_settings() {
        let prompt = json!({
            "10": {"class_type": "UNETLoader", "inputs": {"unet_name": "flux1-dev.safetensors"}},
            "11": {"class_type": "RandomNoise", "inputs": {"noise_seed": 1234}},
            "12": {"class_type": "BasicScheduler", "inputs": {"steps": 20, "scheduler": "simple"}},
            "13": {"class_type": "KSamplerSelect", "inputs": {"sampler_name": "euler"}}
        });
        let metadata = GenerationMetadata::from_prompt(&prompt);
        assert_eq!(metadata.model, "flux1-dev.safetensors (UNET)");
        assert_eq!(metadata.seed, "1234");
        assert_eq!(metadata.steps, "20");
        assert_eq!(metadata.scheduler, "simple");
        assert_eq!(metadata.sampler, "euler");
        assert_eq!(metadata.cfg, "N/A");
    }

    #[test]
    fn test_generic_loader_model_name() {
        let prompt = json!({"5": {"class_type": "UpscaleModelLoader", "inputs": {"model_name": "4x.pth"}}});
        assert_eq!(GenerationMetadata::from_prompt(&prompt).model, "4x.pth");
    }

    #[test]
    fn test_non_object_prompt() {
        assert_eq!(
            GenerationMetadata::from_prompt(&Value::Null),
            GenerationMetadata::default()
        );
    }
}
