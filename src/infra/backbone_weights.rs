// ============================================================
// Layer 6 — Pretrained Backbone Weights
// ============================================================
// Loads ImageNet weights into the MobileNetV2 trunk.
//
// Two formats are accepted, chosen by file extension:
//
//   .pt / .pth — a torchvision `mobilenet_v2` state dict, read
//                with burn-import. Keys are renamed from
//                torchvision's positional layout to our field
//                names, e.g.
//                  features.0.0.weight        → stem.conv.weight
//                  features.3.conv.1.0.weight → blocks.2.depthwise.conv.weight
//                  features.18.1.running_mean → last.norm.running_mean
//                BatchNorm weight/bias map to gamma/beta inside
//                burn-import. The ImageNet classifier keys
//                (classifier.1.*) have no counterpart and are skipped.
//
//   .mpk       — a Burn named-MessagePack record of MobileNetV2,
//                e.g. one written by a previous conversion.
//
// A random trunk is only built when explicitly requested. A
// weights path that does not exist is an error.

use anyhow::{anyhow, bail, Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use std::path::Path;

use crate::ml::backbone::{MobileNetV2, MobileNetV2Config, MobileNetV2Record};

/// torchvision keeps the stem in features.0 and the last conv in features.18
const LAST_FEATURE_INDEX: usize = 18;

/// Where the trunk weights come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackboneInit<'a> {
    Pretrained(&'a Path),
    /// Untrained trunk, for experiments without the ImageNet file
    Random,
}

pub fn load_backbone<B: Backend>(init: BackboneInit<'_>, device: &B::Device) -> Result<MobileNetV2<B>> {
    let path = match init {
        BackboneInit::Pretrained(path) => path,
        BackboneInit::Random => {
            tracing::warn!("Random backbone requested: MobileNetV2 trunk is not pretrained");
            return Ok(MobileNetV2Config::new().init::<B>(device));
        }
    };
    if !path.exists() {
        bail!("Backbone weights file '{}' does not exist", path.display());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let record: MobileNetV2Record<B> = match extension.as_str() {
        "pt" | "pth" => load_torchvision(path, device)?,
        "mpk"        => NamedMpkFileRecorder::<FullPrecisionSettings>::new()
            .load(path.to_path_buf(), device)
            .map_err(|e| anyhow!("{e:?}"))
            .with_context(|| format!("Cannot load Burn record '{}'", path.display()))?,
        other => bail!(
            "Unsupported backbone weights format '.{other}' (expected .pt, .pth or .mpk)"
        ),
    };

    tracing::info!("Loaded pretrained MobileNetV2 weights from '{}'", path.display());
    Ok(MobileNetV2Config::new().init::<B>(device).load_record(record))
}

fn load_torchvision<B: Backend>(path: &Path, device: &B::Device) -> Result<MobileNetV2Record<B>> {
    let args = torchvision_key_remaps()
        .into_iter()
        .fold(LoadArgs::new(path.to_path_buf()), |args, (pattern, replacement)| {
            args.with_key_remap(&pattern, &replacement)
        });

    PyTorchFileRecorder::<FullPrecisionSettings>::default()
        .load(args, device)
        .map_err(|e| anyhow!("{e:?}"))
        .with_context(|| format!("Cannot load torchvision weights '{}'", path.display()))
}

/// Regex (pattern, replacement) pairs from torchvision keys to ours.
///
/// features.1 is the only block without an expansion conv, so its
/// depthwise conv sits at conv.0 instead of conv.1.
pub fn torchvision_key_remaps() -> Vec<(String, String)> {
    let mut remaps = vec![
        (r"^features\.0\.0\.(.+)$".to_string(), "stem.conv.$1".to_string()),
        (r"^features\.0\.1\.(.+)$".to_string(), "stem.norm.$1".to_string()),
        (format!(r"^features\.{LAST_FEATURE_INDEX}\.0\.(.+)$"), "last.conv.$1".to_string()),
        (format!(r"^features\.{LAST_FEATURE_INDEX}\.1\.(.+)$"), "last.norm.$1".to_string()),
        (r"^features\.1\.conv\.0\.0\.(.+)$".to_string(), "blocks.0.depthwise.conv.$1".to_string()),
        (r"^features\.1\.conv\.0\.1\.(.+)$".to_string(), "blocks.0.depthwise.norm.$1".to_string()),
        (r"^features\.1\.conv\.1\.(.+)$".to_string(),    "blocks.0.project.conv.$1".to_string()),
        (r"^features\.1\.conv\.2\.(.+)$".to_string(),    "blocks.0.project.norm.$1".to_string()),
    ];

    for feature in 2..LAST_FEATURE_INDEX {
        let block = feature - 1;
        for (from, to) in [
            ("0.0", "expand.conv"),
            ("0.1", "expand.norm"),
            ("1.0", "depthwise.conv"),
            ("1.1", "depthwise.norm"),
            ("2",   "project.conv"),
            ("3",   "project.norm"),
        ] {
            let from = from.replace('.', r"\.");
            remaps.push((
                format!(r"^features\.{feature}\.conv\.{from}\.(.+)$"),
                format!("blocks.{block}.{to}.$1"),
            ));
        }
    }

    remaps
}
