//! Vision-language model access: one image crop plus one natural-language
//! question in, free-form text out.

use std::future::Future;
use std::pin::Pin;

use anyhow::Context;
use base64::Engine;
use image::RgbaImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Boundary the perception layer uses to question the VLM about a crop.
///
/// The seed pins sampling so repeated questions about the same crop return
/// the same text; probe checks and stat extraction use different seeds.
pub trait VlmClient: Send + Sync {
    fn ask<'a>(
        &'a self,
        question: &'a str,
        image: &'a RgbaImage,
        seed: i64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;
}

/// Minimal config for an Ollama-style multimodal `POST /api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct VisionModelConfig {
    /// Full endpoint URL, e.g. `http://127.0.0.1:11434/api/generate`.
    pub endpoint: String,
    pub model: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    images: Vec<String>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    seed: i64,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Encodes a crop as base64 PNG for the `images` field.
pub fn encode_png_base64(image: &RgbaImage) -> anyhow::Result<String> {
    let mut png = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .context("encode crop as png")?;
    Ok(base64::engine::general_purpose::STANDARD.encode(png))
}

/// Sends a question plus image to an Ollama-style generate endpoint and
/// returns the raw response text.
pub async fn query_vision_generate(
    question: &str,
    image: &RgbaImage,
    seed: i64,
    cfg: &VisionModelConfig,
) -> anyhow::Result<String> {
    let client = Client::new();
    let request = GenerateRequest {
        model: cfg.model.clone(),
        prompt: question.to_string(),
        images: vec![encode_png_base64(image)?],
        stream: false,
        options: GenerateOptions { seed },
    };

    let res = client
        .post(&cfg.endpoint)
        .json(&request)
        .send()
        .await
        .context("vlm request failed")?
        .error_for_status()
        .context("vlm non-2xx response")?
        .json::<GenerateResponse>()
        .await
        .context("vlm response decode failed")?;

    Ok(res.response)
}
