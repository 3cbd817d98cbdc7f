// build.rs
// Compiles GLSL shaders to SPIR-V with glslc from the Vulkan SDK.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

fn compile_shaders(shader_dir: &Path, target_dir: &Path, glslc: &str) {
    let shader_files = match std::fs::read_dir(shader_dir) {
        Ok(files) => files,
        Err(_) => {
            eprintln!("info: No shader directory found at: {shader_dir:?}");
            return;
        }
    };

    let mut compiled_count = 0;

    for entry in shader_files {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                eprintln!("warning: Error reading shader directory entry: {e}");
                continue;
            }
        };

        let path = entry.path();
        let Some(ext) = path.extension() else {
            continue;
        };

        if ext == "vert" || ext == "frag" {
            // simple_shader.vert -> simple_shader.vert.spv
            let file_name = match path.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };
            let out_file = target_dir.join(format!("{file_name}.spv"));

            let needs_compile = if let (Ok(src_meta), Ok(dst_meta)) =
                (std::fs::metadata(&path), std::fs::metadata(&out_file))
            {
                match (src_meta.modified(), dst_meta.modified()) {
                    (Ok(src), Ok(dst)) => src > dst,
                    _ => true,
                }
            } else {
                true
            };

            if !needs_compile {
                eprintln!("info: Shader {file_name:?} is up to date");
                continue;
            }

            let status = Command::new(glslc).arg(&path).arg("-o").arg(&out_file).status();

            match status {
                Ok(s) if s.success() => {
                    eprintln!("info: Compiled {file_name:?}");
                    compiled_count += 1;
                }
                Ok(s) => {
                    eprintln!(
                        "error: glslc failed for {path:?} with exit code: {}",
                        s.code().unwrap_or(-1)
                    );
                    panic!("Shader compilation failed");
                }
                Err(e) => {
                    eprintln!("error: Failed to run glslc for {path:?}: {e}");
                    panic!("Failed to execute shader compiler");
                }
            }
        }
    }

    if compiled_count > 0 {
        eprintln!("info: Successfully compiled {compiled_count} shader(s)");
    }
}

fn main() {
    println!("cargo:rerun-if-changed=shaders");
    println!("cargo:rerun-if-env-changed=VULKAN_SDK");

    let skip_shaders =
        env::var("SKIP_SHADERS").is_ok() || env::args().any(|arg| arg == "--skip-shaders");
    if skip_shaders {
        eprintln!("info: Skipping shader compilation (SKIP_SHADERS set or --skip-shaders arg)");
        return;
    }

    let vulkan_sdk = match env::var("VULKAN_SDK") {
        Ok(sdk) => sdk,
        Err(_) => {
            eprintln!("warning: VULKAN_SDK not set, shader compilation skipped");
            eprintln!("hint: Install Vulkan SDK and set VULKAN_SDK environment variable");
            return;
        }
    };

    let glslc = if cfg!(target_os = "windows") {
        format!("{vulkan_sdk}\\Bin\\glslc.exe")
    } else {
        format!("{vulkan_sdk}/bin/glslc")
    };

    if !Path::new(&glslc).exists() {
        eprintln!("error: glslc not found at: {glslc}");
        eprintln!("hint: Ensure Vulkan SDK is properly installed");
        panic!("Shader compiler not found");
    }

    let shader_dir = PathBuf::from("shaders");
    let target_dir = PathBuf::from("target/shaders");

    if let Err(e) = std::fs::create_dir_all(&target_dir) {
        eprintln!("warning: Failed to create target directory: {e}");
        return;
    }

    compile_shaders(&shader_dir, &target_dir, &glslc);
}
