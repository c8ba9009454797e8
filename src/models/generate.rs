use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlNet {
    pub control_type: String,
    pub control_image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParams {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<ImageSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controlnet: Option<ControlNet>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GenerateParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: None,
            image_size: None,
            img_count: Some(1),
            steps: Some(30),
            controlnet: None,
            extra: Map::new(),
        }
    }

    pub fn with_aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(ratio.into());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.image_size = Some(ImageSize { width, height });
        self
    }

    pub fn with_count(mut self, img_count: u32) -> Self {
        self.img_count = Some(img_count);
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = Some(steps);
        self
    }

    pub fn with_controlnet(
        mut self,
        control_type: impl Into<String>,
        control_image: impl Into<String>,
    ) -> Self {
        self.controlnet = Some(ControlNet {
            control_type: control_type.into(),
            control_image: control_image.into(),
        });
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Body of a text-to-image submission. Unknown fields are carried through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub template_uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_params: Option<GenerateParams>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GenerateRequest {
    pub fn new(template_uuid: impl Into<String>) -> Self {
        Self {
            template_uuid: template_uuid.into(),
            generate_params: None,
            extra: Map::new(),
        }
    }

    pub fn with_params(mut self, params: GenerateParams) -> Self {
        self.generate_params = Some(params);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Handle returned by a submission; used to poll the task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub generate_uuid: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusQuery<'a> {
    pub generate_uuid: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request = GenerateRequest::new("5d7e67009b344550bc1aa6ccbfa1d7f4").with_params(
            GenerateParams::new("a lighthouse at dusk")
                .with_aspect_ratio("portrait")
                .with_count(2),
        );

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "templateUuid": "5d7e67009b344550bc1aa6ccbfa1d7f4",
                "generateParams": {
                    "prompt": "a lighthouse at dusk",
                    "aspectRatio": "portrait",
                    "imgCount": 2,
                    "steps": 30
                }
            })
        );
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let raw = json!({
            "templateUuid": "t",
            "generateParams": {
                "prompt": "p",
                "imageSize": {"width": 768, "height": 1024},
                "imgCount": 1,
                "steps": 20,
                "controlnet": {"controlType": "depth", "controlImage": "https://x/y.png"},
                "negativePrompt": "blurry",
                "seed": 42
            },
            "callbackUrl": "https://hooks.example.com/done"
        });

        let request: GenerateRequest = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(request.extra["callbackUrl"], json!("https://hooks.example.com/done"));
        let params = request.generate_params.as_ref().unwrap();
        assert_eq!(params.image_size, Some(ImageSize { width: 768, height: 1024 }));
        assert_eq!(params.extra["negativePrompt"], json!("blurry"));
        assert_eq!(params.extra["seed"], json!(42));
        assert_eq!(serde_json::to_value(&request).unwrap(), raw);
    }

    #[test]
    fn test_prompt_only_params_are_accepted() {
        let raw = json!({"templateUuid": "t", "generateParams": {"prompt": "p"}});

        let request: GenerateRequest = serde_json::from_value(raw.clone()).unwrap();
        let params = request.generate_params.as_ref().unwrap();
        assert_eq!(params.img_count, None);
        assert_eq!(params.steps, None);
        // Nothing is injected on the way back out.
        assert_eq!(serde_json::to_value(&request).unwrap(), raw);
    }
}
