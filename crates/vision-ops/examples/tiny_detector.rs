// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Example: a tiny detection head, from JSON definition to region proposals.
//!
//! Two deconvolution branches upsample a shared feature map into an
//! objectness-score grid and a box-delta grid; the proposal operator decodes,
//! ranks and suppresses them into a short list of regions.
//!
//! ```bash
//! cargo run -p vision-ops --example tiny_detector
//! ```

use inference_core::{EngineConfig, NetDef, Network, OpRegistry};
use tensor_core::DType;
use vision_ops::{install_conv_backend, register_builtins};

const NET_JSON: &str = r#"{
    "name": "tiny-detector",
    "inputs": [
        {"name": "feat", "dims": [1, 8, 4, 4]},
        {"name": "score_weight", "dims": [8, 2, 4, 4]},
        {"name": "delta_weight", "dims": [8, 4, 4, 4]},
        {"name": "im_info", "dims": [3]}
    ],
    "ops": [
        {
            "name": "score_up",
            "type": "Deconvolution",
            "bottoms": ["feat", "score_weight"],
            "tops": ["rpn_cls_prob"],
            "params": {"num_output": 2, "kernel_size": 4, "stride": 2, "pad": 1, "bias_term": false}
        },
        {
            "name": "delta_up",
            "type": "Deconvolution",
            "bottoms": ["feat", "delta_weight"],
            "tops": ["rpn_bbox_pred"],
            "params": {"num_output": 4, "kernel_size": 4, "stride": 2, "pad": 1, "bias_term": false}
        },
        {
            "name": "proposal",
            "type": "Proposal",
            "bottoms": ["rpn_cls_prob", "rpn_bbox_pred", "im_info"],
            "tops": ["rois"],
            "params": {
                "feat_stride": 16,
                "min_size": 4,
                "nms_threshold": 0.7,
                "anchors": [0.0, 0.0, 15.0, 15.0, -8.0, -8.0, 23.0, 23.0]
            }
        }
    ]
}"#;

const CONFIG_TOML: &str = r#"
scratch_limit = "16M"
accelerated_conv = true

[context]
gemm_backend = "faer"
"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let def = NetDef::from_json(NET_JSON)?;
    let config = EngineConfig::from_toml(CONFIG_TOML)?;

    let mut registry = OpRegistry::new();
    register_builtins(&mut registry);

    let mut net = Network::build(&def, &registry, &config)?;
    install_conv_backend(net.workspace_mut(), &config)?;

    // Synthetic inputs: a smoothly varying feature map, mildly positive score
    // weights and small delta weights, against a 128x128 image at scale 1.
    fill(&mut net, "feat", |i| (i as f32 * 0.37).sin() + 0.5)?;
    fill(&mut net, "score_weight", |i| {
        ((i % 9) as f32 - 4.0) * 0.01 + 0.02
    })?;
    fill(&mut net, "delta_weight", |i| ((i % 7) as f32 - 3.0) * 0.01)?;
    fill(&mut net, "im_info", |i| [128.0, 128.0, 1.0][i])?;

    net.forward()?;

    let rois = net.workspace().require_tensor("rois", DType::F32)?;
    let rois = rois.borrow();
    println!("network '{}' produced {} proposals:\n", net.name(), rois.shape().dims()[0]);
    println!("{:>4}  {:>8} {:>8} {:>8} {:>8}", "#", "xmin", "ymin", "xmax", "ymax");
    if rois.count() > 0 {
        for (i, row) in rois.as_f32()?.chunks_exact(5).enumerate() {
            println!(
                "{i:>4}  {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
                row[1], row[2], row[3], row[4]
            );
        }
    }

    println!("\n{}", net.workspace().summary());
    Ok(())
}

fn fill(net: &mut Network, name: &str, f: impl Fn(usize) -> f32) -> anyhow::Result<()> {
    let handle = net.workspace().require_tensor(name, DType::F32)?;
    let mut t = handle.borrow_mut();
    let count = t.count();
    let values: Vec<f32> = (0..count).map(f).collect();
    t.set_f32(&values)?;
    Ok(())
}
