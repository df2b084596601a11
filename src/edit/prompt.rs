//! Prompt assembly for the generation API
//!
//! The segment order is fixed so identical requests always produce an
//! identical prompt:
//!
//! 1. instruction text
//! 2. base image
//! 3. mask note + mask image (when a mask was uploaded)
//! 4. placement text + label + insert image (when an insert region is set)
//! 5. seed hint (when a seed was given)

use super::request::{EditRequest, ImageAsset};

const LAYOUT_GUIDANCE: &str = "Preserve the room's existing layout, camera perspective, \
     and lighting unless the instructions explicitly ask to change them.";

const MASK_NOTE: &str = "The next image is an edit mask for the photo above: white pixels \
     mark the area to edit, black pixels must stay untouched.";

const INSERT_LABEL: &str = "Reference object to insert:";

/// One ordered piece of the prompt sent to the generation API
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationPromptSegment {
    Text(String),
    Image { mime_type: String, bytes: Vec<u8> },
}

impl GenerationPromptSegment {
    fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    fn image(asset: &ImageAsset) -> Self {
        Self::Image {
            mime_type: asset.content_type.clone(),
            bytes: asset.bytes.clone(),
        }
    }
}

/// Prompt segments plus the sampling temperature derived from guidance
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPrompt {
    pub segments: Vec<GenerationPromptSegment>,
    pub temperature: f32,
}

/// Build the generation prompt for a validated request
pub fn assemble_prompt(request: &EditRequest) -> AssembledPrompt {
    let params = &request.parameters;
    let mut segments = Vec::with_capacity(8);

    segments.push(GenerationPromptSegment::text(instruction_text(request)));
    segments.push(GenerationPromptSegment::image(&request.base_image));

    if let Some(mask) = &request.mask {
        segments.push(GenerationPromptSegment::text(MASK_NOTE));
        segments.push(GenerationPromptSegment::image(mask));
    }

    if let Some((insert, region)) = request.insert() {
        segments.push(GenerationPromptSegment::text(format!(
            "Place the reference object inside a box whose top-left corner is {:.1}% from the left \
             and {:.1}% from the top of the room photo, and which spans {:.1}% \u{d7} {:.1}% of the \
             photo's width and height. Match the room's perspective, scale, and lighting.",
            region.x * 100.0,
            region.y * 100.0,
            region.width * 100.0,
            region.height * 100.0,
        )));
        segments.push(GenerationPromptSegment::text(INSERT_LABEL));
        segments.push(GenerationPromptSegment::image(insert));
    }

    if let Some(seed) = params.seed {
        segments.push(GenerationPromptSegment::text(format!(
            "Behave deterministically: use seed {seed} so the same request yields the same result."
        )));
    }

    AssembledPrompt {
        segments,
        temperature: temperature_for(params.guidance_scale),
    }
}

/// Map guidance scale onto a sampling temperature in [0, 2]
pub fn temperature_for(guidance_scale: f32) -> f32 {
    (guidance_scale / 10.0).clamp(0.0, 2.0)
}

fn instruction_text(request: &EditRequest) -> String {
    let params = &request.parameters;
    let mut parts = vec![request.prompt.trim().to_string()];

    if let Some(negative) = request
        .negative_prompt
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        parts.push(format!("Avoid: {negative}."));
    }

    parts.push(LAYOUT_GUIDANCE.to_string());
    parts.push(format!(
        "Refine the result as if running {} diffusion steps.",
        params.inference_steps
    ));
    parts.push(format!(
        "Apply changes with an intensity of {:.2}.",
        params.strength
    ));

    parts.join(" ")
}
