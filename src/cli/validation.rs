use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.page_size.as_deref() {
        crate::utils::parse_page_size(raw).map_err(|e| format!("invalid --page-size: {e}"))?;
    }
    if let Some(raw) = args.columns.as_deref() {
        crate::utils::parse_columns_spec(raw)
            .map_err(|e| format!("invalid --columns '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --output-format '{raw}', expected text or json"));
        }
    }
    if args.endpoint.is_some() && args.file.is_some() {
        return Err("use either --endpoint or --file, not both".to_string());
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    Ok(())
}
