use super::utils::load_frame;
use crate::callgraph::SquashOptions;
use crate::output::{write_literal, LiteralOptions};
use crate::query::Filter;
use crate::utils::config::EngineConfig;
use anyhow::{anyhow, bail, Context, Result};
use log::info;
use std::path::PathBuf;

/// Arguments for the filter command
#[derive(Debug, Clone)]
pub struct FilterArgs {
    pub input: PathBuf,
    pub output: PathBuf,

    /// Call-path pattern such as `main/**/solve`
    pub path: Option<String>,

    /// Row threshold in the form `METRIC=VALUE`
    pub min: Option<String>,

    /// Keep the original graph instead of squashing it
    pub no_squash: bool,
}

/// Validate filter arguments
pub fn validate_args(args: &FilterArgs) -> Result<()> {
    match (&args.path, &args.min) {
        (Some(_), Some(_)) => bail!("Use either --path or --min, not both"),
        (None, None) => bail!("One of --path or --min is required"),
        _ => Ok(()),
    }
}

/// Parse `METRIC=VALUE`
fn parse_threshold(raw: &str) -> Result<(String, f64)> {
    let (metric, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Threshold '{}' must look like METRIC=VALUE", raw))?;
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid threshold value in '{}'", raw))?;
    Ok((metric.trim().to_string(), value))
}

pub fn execute_filter(args: &FilterArgs, config: &EngineConfig) -> Result<()> {
    validate_args(args)?;
    let frame = load_frame(&args.input, config)?;

    let filter = if let Some(pattern) = &args.path {
        Filter::path(pattern.clone())
    } else if let Some(raw) = &args.min {
        let (metric, threshold) = parse_threshold(raw)?;
        if !frame.table().has_column(&metric) {
            bail!("Metric '{}' is not a column of {}", metric, args.input.display());
        }
        Filter::predicate(move |row| row.number(&metric).is_some_and(|v| v >= threshold))
    } else {
        bail!("One of --path or --min is required");
    };

    let result = if args.no_squash {
        frame.filter(&filter)?
    } else {
        frame.filter_squash(&filter, &SquashOptions::new(config.squash.clone()))?
    };

    info!(
        "Filter kept {} of {} nodes",
        result.table().nodes().len(),
        frame.graph().len()
    );
    write_literal(&result, &LiteralOptions::default(), &args.output)?;
    println!("✓ Filtered graph written to {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("time=2.5").unwrap(), ("time".to_string(), 2.5));
        assert!(parse_threshold("time").is_err());
        assert!(parse_threshold("time=fast").is_err());
    }

    #[test]
    fn test_validate_args() {
        let mut args = FilterArgs {
            input: PathBuf::from("in.json"),
            output: PathBuf::from("out.json"),
            path: None,
            min: None,
            no_squash: false,
        };
        assert!(validate_args(&args).is_err());
        args.path = Some("main".into());
        assert!(validate_args(&args).is_ok());
        args.min = Some("time=1".into());
        assert!(validate_args(&args).is_err());
    }
}
