// Build script to compile GLSL shaders to SPIR-V

use std::process::{Command, Output};

/// (source, output) pairs. Outputs match the default [shaders] paths in config.rs
const SHADERS: &[(&str, &str)] = &[
    ("shaders/shader.vert", "shaders/vert.spv"),
    ("shaders/shader.frag", "shaders/frag.spv"),
];

fn main() {
    for (source, _) in SHADERS {
        println!("cargo:rerun-if-changed={}", source);
    }

    if Command::new("glslc").arg("--version").output().is_err() {
        // Not fatal: prebuilt .spv files in shaders/ still work
        println!("cargo:warning=glslc not found, shaders were not compiled");
        for (source, output) in SHADERS {
            println!("cargo:warning=  glslc {} -o {}", source, output);
        }
        return;
    }

    for (source, output) in SHADERS {
        let result = Command::new("glslc").args([*source, "-o", *output]).output();
        match result {
            Ok(out) if out.status.success() => {}
            Ok(out) => panic!("Failed to compile {}:\n{}", source, stderr_of(&out)),
            Err(e) => panic!("Failed to run glslc on {}: {}", source, e),
        }
    }
}

fn stderr_of(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).trim().to_string()
}
