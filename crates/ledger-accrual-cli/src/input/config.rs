use ledger_accrual_core::PipelineConfig;

use super::file;

/// Load a pipeline configuration. `.yaml`/`.yml` files are read as YAML,
/// anything else as JSON. Without a path the defaults apply. Environment
/// overrides are applied last.
pub fn load_config(path: Option<&str>) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config: PipelineConfig = match path {
        Some(p) if p.ends_with(".yaml") || p.ends_with(".yml") => file::read_yaml(p)?,
        Some(p) => file::read_json(p)?,
        None => PipelineConfig::default(),
    };
    config.apply_env_overrides()?;
    Ok(config)
}
