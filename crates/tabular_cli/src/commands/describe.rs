use anyhow::{Context, Result, bail};
use tabular_descriptor::{DescriptorFormat, to_string};
use tracing::info;

use super::{ReadArgs, Target, load_target};

pub fn execute(source: &str, read: &ReadArgs, stats: bool, format: &str) -> Result<()> {
    info!("Describing: {}", source);

    let format = match format {
        "json" => DescriptorFormat::Json,
        "yaml" | "yml" => DescriptorFormat::Yaml,
        "toml" => DescriptorFormat::Toml,
        other => bail!("Unsupported output format: {} (expected json, yaml or toml)", other),
    };

    let text = match load_target(source, read)? {
        Target::Resource(resource) => {
            let descriptor = resource
                .infer(stats)
                .with_context(|| format!("Failed to describe resource: {}", source))?;
            to_string(&descriptor, format)?
        }
        Target::Package(package) => {
            let descriptor = package
                .infer(stats)
                .with_context(|| format!("Failed to describe package: {}", source))?;
            to_string(&descriptor, format)?
        }
    };

    println!("{}", text.trim_end());
    Ok(())
}
