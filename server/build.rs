use common::yaml_include::load_yaml_with_includes;
use std::{error::Error, fs, path::Path};

fn main() -> Result<(), Box<dyn Error>> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")?;
    let source_config_dir = Path::new(&manifest_dir).join("config");
    println!("cargo:rerun-if-changed={}", source_config_dir.display());
    println!("cargo:rerun-if-env-changed=CUSTOMERS_ENV");

    let out_dir = std::env::var("OUT_DIR")?;
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "debug".to_string());
    let env = std::env::var("CUSTOMERS_ENV").unwrap_or_else(|_| "dev".to_string());

    // Navigate up to target/<profile>
    let target_dir = Path::new(&out_dir)
        .ancestors()
        .find(|p| p.ends_with("target"))
        .ok_or("could not find target directory above OUT_DIR")?
        .join(&profile);

    let path = source_config_dir.join(format!("{}.yaml", env));
    println!("cargo:warning=Loading config env {:?} profile {:?}", env, profile);
    let config_yaml = load_yaml_with_includes(&path)?;

    let mut out_str = String::new();
    {
        let mut emitter = yaml_rust2::YamlEmitter::new(&mut out_str);
        emitter.dump(&config_yaml)?;
    }

    let total_config_dir = target_dir.join("config");
    fs::create_dir_all(&total_config_dir)?;
    fs::write(total_config_dir.join("total_config.yaml"), out_str)?;

    Ok(())
}
