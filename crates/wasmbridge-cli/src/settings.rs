//! Configuration layering for the CLI.
//!
//! Later sources override earlier ones: config file, the request's own
//! `parameter`, `--params`, then the individual flags.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use wasmbridge_core::GeneratorConfig;

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// JSON config file (GeneratorConfig fields)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Plugin parameter string, e.g. `services=A,B,method_exclude=*Internal`
    #[arg(long)]
    pub params: Option<String>,

    /// Comma-separated service allow-list
    #[arg(long)]
    pub services: Option<String>,

    /// Comma-separated method include globs
    #[arg(long)]
    pub method_include: Option<String>,

    /// Comma-separated method exclude globs
    #[arg(long)]
    pub method_exclude: Option<String>,

    /// Comma-separated `Original:custom` method renames
    #[arg(long)]
    pub method_rename: Option<String>,

    #[arg(long, value_name = "BOOL")]
    pub exclude_annotation_packages: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    pub exclude_empty_packages: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    pub exclude_map_entries: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    pub exclude_nested_messages: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    pub exclude_nested_enums: Option<bool>,
}

impl ConfigArgs {
    pub fn resolve(&self, request_parameter: Option<&str>) -> Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_json_file(path)?,
            None => GeneratorConfig::default(),
        };

        if let Some(parameter) = request_parameter.filter(|p| !p.trim().is_empty()) {
            config
                .apply_parameter(parameter)
                .context("invalid parameter in descriptor request")?;
        }
        if let Some(params) = &self.params {
            config.apply_parameter(params).context("invalid --params")?;
        }

        let lists = [
            (&self.services, &mut config.services),
            (&self.method_include, &mut config.method_include),
            (&self.method_exclude, &mut config.method_exclude),
            (&self.method_rename, &mut config.method_rename),
        ];
        for (flag, slot) in lists {
            if let Some(value) = flag {
                *slot = value.clone();
            }
        }

        let toggles = [
            (self.exclude_annotation_packages, &mut config.exclude_annotation_packages),
            (self.exclude_empty_packages, &mut config.exclude_empty_packages),
            (self.exclude_map_entries, &mut config.exclude_map_entries),
            (self.exclude_nested_messages, &mut config.exclude_nested_messages),
            (self.exclude_nested_enums, &mut config.exclude_nested_enums),
        ];
        for (flag, slot) in toggles {
            if let Some(value) = flag {
                *slot = value;
            }
        }

        Ok(config)
    }
}
